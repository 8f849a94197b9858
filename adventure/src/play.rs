//! The console game loop.
//!
//! Drives a [`Session`] from the opening turn to an ending or a quit:
//! present the turn (narrating it when enabled), read a command, advance.
//! Generation failures are reported and the player may retry the same turn.

use crate::console::Console;
use crate::input::{parse_command, parse_retry, Command};
use crate::playback::{AudioPlayer, PlaybackError};
use adventure_core::{Generator, Narrator, Progress, Session, SessionError, Step, Voice};
use std::io::{BufRead, Write};
use tracing::{info, warn};

/// Narration settings, changeable during play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Narration {
    pub enabled: bool,
    pub voice: Voice,
}

impl Narration {
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    /// The story reached its conclusion.
    Completed,
    /// The player quit, or input ran out.
    Quit,
}

/// Services the loop presents through.
pub struct Presenter<'a, N> {
    pub narrator: &'a N,
    pub player: &'a AudioPlayer,
    pub narration: Narration,
}

/// Play one adventure to its end.
pub async fn run<G, N, R, W>(
    session: &mut Session<G>,
    presenter: &mut Presenter<'_, N>,
    console: &mut Console<R, W>,
) -> anyhow::Result<Ending>
where
    G: Generator,
    N: Narrator,
    R: BufRead,
    W: Write,
{
    console.banner()?;
    if presenter.narration.enabled && !presenter.player.is_available() {
        presenter.narration.enabled = false;
        console.notice(format!("Narration is off: {}.", PlaybackError::NoPlayer))?;
    }

    let mut progress = loop {
        console.notice("\nGenerating your adventure...")?;
        match session.start().await {
            Ok(progress) => break progress,
            Err(e) if e.is_retryable() => {
                if !offer_retry(console, &e)? {
                    return Ok(Ending::Quit);
                }
            }
            Err(e) => return Err(e.into()),
        }
    };

    loop {
        match progress {
            Progress::Continue(step) => present(session, presenter, console, step).await?,
            Progress::Complete(step) => {
                present(session, presenter, console, step).await?;
                console.the_end()?;
                info!(turns = session.state().history().len(), "game completed");
                return Ok(Ending::Completed);
            }
            Progress::Reprompt { .. } => show_choices(session, console)?,
        }

        progress = match next_progress(session, presenter, console).await? {
            Some(progress) => progress,
            None => {
                console.line("\nThanks for playing!")?;
                return Ok(Ending::Quit);
            }
        };
    }
}

/// Read commands until a choice is made. `None` when the player quits.
async fn next_progress<G, N, R, W>(
    session: &mut Session<G>,
    presenter: &mut Presenter<'_, N>,
    console: &mut Console<R, W>,
) -> anyhow::Result<Option<Progress>>
where
    G: Generator,
    N: Narrator,
    R: BufRead,
    W: Write,
{
    loop {
        let Some(line) = console.read_line("\nEnter your choice (1-4): ")? else {
            return Ok(None);
        };

        match parse_command(&line) {
            Command::Quit => return Ok(None),
            Command::Help => console.help()?,
            Command::Status => console.status(session.state())?,
            Command::ToggleNarration if !presenter.player.is_available() => {
                console.notice(format!("Narration unavailable: {}.", PlaybackError::NoPlayer))?;
            }
            Command::ToggleNarration => {
                let on = presenter.narration.toggle();
                console.notice(format!(
                    "Narration {} ({}).",
                    if on { "on" } else { "off" },
                    presenter.narration.voice
                ))?;
            }
            Command::Invalid => show_choices(session, console)?,
            Command::Choose(index) => loop {
                match session.advance(index).await {
                    Ok(progress) => return Ok(Some(progress)),
                    Err(e) if e.is_retryable() => {
                        if !offer_retry(console, &e)? {
                            return Ok(None);
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            },
        }
    }
}

/// Narrate (when enabled) and print a turn.
async fn present<G, N, R, W>(
    session: &Session<G>,
    presenter: &Presenter<'_, N>,
    console: &mut Console<R, W>,
    step: Step,
) -> anyhow::Result<()>
where
    G: Generator,
    N: Narrator,
    R: BufRead,
    W: Write,
{
    let Step { mut turn, applied } = step;

    if presenter.narration.enabled {
        match presenter
            .narrator
            .narrate(&turn.narrative, presenter.narration.voice)
            .await
        {
            Ok(audio) => turn.audio = Some(audio),
            Err(e) => {
                warn!(error = %e, "narration failed");
                console.notice("(narration unavailable for this turn)")?;
            }
        }
    }

    // Playback is requested before the text is typed out, and never awaited.
    if let Some(audio) = turn.audio.take() {
        if let Err(e) = presenter.player.play(audio) {
            warn!(error = %e, "playback failed");
        }
    }

    console.story(&turn.narrative).await?;
    console.applied(&applied, session.state())?;
    if !turn.terminal {
        console.choices(&turn)?;
    }
    Ok(())
}

fn show_choices<G, R, W>(session: &Session<G>, console: &mut Console<R, W>) -> anyhow::Result<()>
where
    G: Generator,
    R: BufRead,
    W: Write,
{
    if let Some(turn) = session.current_turn() {
        console.choices(turn)?;
    }
    Ok(())
}

fn offer_retry<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    error: &SessionError,
) -> anyhow::Result<bool> {
    warn!(error = %error, "turn generation failed");
    console.error(format!("The story faltered: {error}"))?;
    Ok(console
        .read_line("Try again? [Y/n] ")?
        .is_some_and(|answer| parse_retry(&answer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adventure_core::testing::sample_turn;
    use adventure_core::{RecordingNarrator, ScriptedGenerator};

    struct Outcome {
        ending: Ending,
        output: String,
        session: Session<ScriptedGenerator>,
        narrated: Vec<(String, Voice)>,
    }

    async fn play(generator: ScriptedGenerator, input: &str, narrate: bool) -> Outcome {
        play_with(generator, input, narrate, RecordingNarrator::new(), "/nonexistent/player").await
    }

    async fn play_with(
        generator: ScriptedGenerator,
        input: &str,
        narrate: bool,
        narrator: RecordingNarrator,
        player: &str,
    ) -> Outcome {
        let player = AudioPlayer::detect(Some(player));
        let mut presenter = Presenter {
            narrator: &narrator,
            player: &player,
            narration: Narration {
                enabled: narrate,
                voice: Voice::Mystical,
            },
        };
        let mut session = Session::new(generator);
        let mut console = Console::new(input.as_bytes(), Vec::new(), false);

        let ending = run(&mut session, &mut presenter, &mut console).await.unwrap();

        Outcome {
            ending,
            output: String::from_utf8(console.output().clone()).unwrap(),
            session,
            narrated: narrator.requests(),
        }
    }

    #[tokio::test]
    async fn test_quit_after_opening() {
        let outcome = play(ScriptedGenerator::new().then(sample_turn("gate")), "q\n", false).await;

        assert_eq!(outcome.ending, Ending::Quit);
        assert!(outcome.output.contains("gate: the story continues."));
        assert!(outcome.output.contains("  4. gate choice 4"));
        assert!(outcome.session.state().history().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_input_reprompts_without_calls() {
        let generator = ScriptedGenerator::new().then(sample_turn("gate"));
        let outcome = play(generator, "banana\n7\n0\nq\n", false).await;

        assert_eq!(outcome.session.generator().calls(), 1);
        assert!(outcome.session.state().history().is_empty());
        assert_eq!(outcome.output.matches("  1. gate choice 1").count(), 4);
    }

    #[tokio::test]
    async fn test_terminal_turn_ends_without_more_input() {
        let generator = ScriptedGenerator::new()
            .then(sample_turn("gate"))
            .then(sample_turn("ending").terminal());
        // The trailing lines must never be read.
        let outcome = play(generator, "2\n1\n1\n", false).await;

        assert_eq!(outcome.ending, Ending::Completed);
        assert!(outcome.output.contains("~ THE END ~"));
        assert!(!outcome.output.contains("ending choice 1"));
        assert_eq!(outcome.session.generator().calls(), 2);
        assert_eq!(outcome.session.state().history().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_turn_can_be_retried() {
        let generator = ScriptedGenerator::new()
            .then(sample_turn("gate"))
            .then_fail("timeout")
            .then(sample_turn("hall"));
        let outcome = play(generator, "1\ny\nq\n", false).await;

        assert!(outcome.output.contains("The story faltered"));
        assert!(outcome.output.contains("hall: the story continues."));
        assert_eq!(outcome.session.state().history().len(), 1);
        assert_eq!(outcome.session.state().history()[0].action, "gate choice 1");
    }

    #[tokio::test]
    async fn test_declining_retry_quits_with_state_intact() {
        let generator = ScriptedGenerator::new()
            .then(sample_turn("gate"))
            .then_fail("timeout");
        let outcome = play(generator, "3\nn\n", false).await;

        assert_eq!(outcome.ending, Ending::Quit);
        assert!(outcome.session.state().history().is_empty());
        assert_eq!(outcome.session.current_turn().unwrap().choice(0), Some("gate choice 1"));
    }

    #[tokio::test]
    async fn test_failed_opening_then_quit() {
        let generator = ScriptedGenerator::new().then_fail("no JSON object in reply");
        let outcome = play(generator, "n\n", false).await;

        assert_eq!(outcome.ending, Ending::Quit);
        assert!(outcome.session.current_turn().is_none());
    }

    #[tokio::test]
    async fn test_narration_follows_toggle() {
        let generator = ScriptedGenerator::new()
            .then(sample_turn("gate"))
            .then(sample_turn("hall"))
            .then(sample_turn("crypt"));
        let outcome = play(generator, "1\nn\n1\nq\n", true).await;

        let texts: Vec<_> = outcome.narrated.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            texts,
            vec!["gate: the story continues.", "hall: the story continues."]
        );
        assert!(outcome.narrated.iter().all(|(_, v)| *v == Voice::Mystical));
        assert!(outcome.output.contains("Narration off (mystical)."));
    }

    #[tokio::test]
    async fn test_no_player_skips_narration() {
        let generator = ScriptedGenerator::new()
            .then(sample_turn("gate"))
            .then(sample_turn("hall"));
        let outcome =
            play_with(generator, "1\nn\nq\n", true, RecordingNarrator::new(), "  ").await;

        assert!(outcome.narrated.is_empty());
        assert!(outcome.output.contains("Narration is off: no audio player found"));
        assert!(outcome.output.contains("Narration unavailable: no audio player found"));
        assert!(outcome.output.contains("hall: the story continues."));
    }

    #[tokio::test]
    async fn test_failed_narration_still_shows_the_turn() {
        let generator = ScriptedGenerator::new().then(sample_turn("gate"));
        let outcome = play_with(
            generator,
            "q\n",
            true,
            RecordingNarrator::failing(),
            "/nonexistent/player",
        )
        .await;

        assert_eq!(outcome.narrated.len(), 1);
        assert!(outcome.output.contains("(narration unavailable for this turn)"));
        assert!(outcome.output.contains("gate: the story continues."));
        assert!(outcome.output.contains("  4. gate choice 4"));
    }

    #[tokio::test]
    async fn test_status_command() {
        let generator = ScriptedGenerator::new().then(sample_turn("gate"));
        let outcome = play(generator, "i\nq\n", false).await;

        assert!(outcome.output.contains("Inventory: nothing"));
        assert!(outcome.output.contains("Turns taken: 0"));
    }
}
