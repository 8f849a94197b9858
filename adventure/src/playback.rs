//! Audio playback through an external player process.
//!
//! Audio is streamed to the player's stdin so nothing touches the disk.
//! Playback is fire-and-forget: `play` returns once the player is spawned.

use adventure_core::Audio;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Players tried in order when none is configured. Each reads from stdin.
const CANDIDATES: &[&[&str]] = &[
    &["mpg123", "-q", "-"],
    &["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet", "-i", "-"],
    &["mpv", "--no-video", "--really-quiet", "-"],
];

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no audio player found (install mpg123, ffplay or mpv, or set ADVENTURE_PLAYER)")]
    NoPlayer,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// A player command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PlayerCommand {
    /// Split a command line on whitespace. `None` when blank.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn from_parts(parts: &[&str]) -> Option<Self> {
        let (program, args) = parts.split_first()?;
        Some(Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }
}

/// Plays narration audio.
#[derive(Debug, Clone)]
pub struct AudioPlayer {
    command: Option<PlayerCommand>,
}

impl AudioPlayer {
    /// Use the configured command line, or the first known player on PATH.
    pub fn detect(configured: Option<&str>) -> Self {
        let command = match configured {
            Some(line) => PlayerCommand::parse(line),
            None => CANDIDATES
                .iter()
                .filter_map(|parts| PlayerCommand::from_parts(parts))
                .find(|c| on_path(&c.program)),
        };
        match &command {
            Some(c) => debug!(program = %c.program, "audio player selected"),
            None => debug!("no audio player found"),
        }
        Self { command }
    }

    /// Whether there is anything to play audio on.
    pub fn is_available(&self) -> bool {
        self.command.is_some()
    }

    #[cfg(test)]
    pub fn command(&self) -> Option<&PlayerCommand> {
        self.command.as_ref()
    }

    /// Start playing `audio` in the background.
    pub fn play(&self, audio: Audio) -> Result<(), PlaybackError> {
        let command = self.command.as_ref().ok_or(PlaybackError::NoPlayer)?;

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false)
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(&audio.bytes).await {
                    debug!(error = %e, "audio player closed its input early");
                }
                // Dropping stdin signals end of stream to the player.
            }
            match child.wait().await {
                Ok(status) if !status.success() => debug!(%status, "audio player exited"),
                Err(e) => warn!(error = %e, "audio player did not finish"),
                _ => {}
            }
        });

        Ok(())
    }
}

fn on_path(program: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let command = PlayerCommand::parse("mpv --no-video -").unwrap();
        assert_eq!(command.program, "mpv");
        assert_eq!(command.args, vec!["--no-video", "-"]);
        assert!(PlayerCommand::parse("   ").is_none());
    }

    #[test]
    fn test_blank_configured_player_is_unavailable() {
        assert!(!AudioPlayer::detect(Some("  ")).is_available());
        assert!(AudioPlayer::detect(Some("mpg123 -q -")).is_available());
    }

    #[test]
    fn test_configured_player_wins() {
        let player = AudioPlayer::detect(Some("my-player --stdin"));
        assert_eq!(player.command().unwrap().program, "my-player");
    }

    #[tokio::test]
    async fn test_play_without_player() {
        let player = AudioPlayer { command: None };
        let audio = Audio {
            bytes: vec![1, 2, 3],
        };
        assert!(matches!(player.play(audio), Err(PlaybackError::NoPlayer)));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let player = AudioPlayer::detect(Some("/nonexistent/adventure-player -"));
        let audio = Audio { bytes: vec![0; 16] };
        assert!(matches!(
            player.play(audio),
            Err(PlaybackError::Spawn { .. })
        ));
    }
}
