//! Console presentation: banner, story text, choices and status.

use adventure_core::{Applied, GameState, Turn};
use crossterm::{
    cursor::MoveTo,
    execute,
    style::Stylize,
    terminal::{Clear, ClearType},
};
use std::io::{self, BufRead, Write};
use std::time::Duration;

const BANNER_WIDTH: usize = 59;

/// Delay between characters when typing out the story.
pub const TYPEWRITER_DELAY: Duration = Duration::from_millis(12);

/// Line-oriented console over any reader and writer.
pub struct Console<R, W> {
    input: R,
    output: W,
    /// Terminal niceties: colors, screen clearing and the typewriter effect.
    interactive: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W, interactive: bool) -> Self {
        Self {
            input,
            output,
            interactive,
        }
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Show `prompt` and read one line. `None` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line))
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", text.as_ref())
    }

    pub fn notice(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        if self.interactive {
            writeln!(self.output, "{}", text.as_ref().dark_grey())
        } else {
            self.line(text)
        }
    }

    pub fn error(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        if self.interactive {
            writeln!(self.output, "{}", text.as_ref().red())
        } else {
            writeln!(self.output, "[ERROR] {}", text.as_ref())
        }
    }

    pub fn banner(&mut self) -> io::Result<()> {
        if self.interactive {
            execute!(self.output, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        writeln!(self.output, "{}", banner("DUNGEON", "EXPLORER"))?;
        self.line("Welcome to Dungeon Explorer! Type h at any prompt for help.")
    }

    /// Print story text, typed out character by character on a terminal.
    pub async fn story(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output)?;
        for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            if self.interactive {
                for ch in paragraph.chars() {
                    write!(self.output, "{ch}")?;
                    self.output.flush()?;
                    tokio::time::sleep(TYPEWRITER_DELAY).await;
                }
                writeln!(self.output)?;
            } else {
                writeln!(self.output, "{paragraph}")?;
            }
            writeln!(self.output)?;
        }
        Ok(())
    }

    /// Announce what a turn changed.
    pub fn applied(&mut self, applied: &Applied, state: &GameState) -> io::Result<()> {
        if applied.is_empty() {
            return Ok(());
        }
        if let Some(place) = &applied.moved_to {
            let heading = format!("--- {place} ---");
            if self.interactive {
                writeln!(self.output, "{}", heading.bold())?;
            } else {
                writeln!(self.output, "{heading}")?;
            }
        }
        if !applied.gained.is_empty() {
            self.notice(format!("You gained: {}", format_list(&applied.gained)))?;
        }
        if !applied.lost.is_empty() {
            self.notice(format!("You lost: {}", format_list(&applied.lost)))?;
        }
        for name in &applied.met {
            match state.characters().get(name) {
                Some(descriptor) if !descriptor.is_empty() => {
                    self.notice(format!("You met: {name} ({descriptor})"))?
                }
                _ => self.notice(format!("You met: {name}"))?,
            }
        }
        Ok(())
    }

    pub fn choices(&mut self, turn: &Turn) -> io::Result<()> {
        writeln!(self.output, "\nWhat would you like to do?")?;
        for (i, choice) in turn.choices.iter().enumerate() {
            if self.interactive {
                writeln!(self.output, "  {} {choice}", format!("{}.", i + 1).cyan())?;
            } else {
                writeln!(self.output, "  {}. {choice}", i + 1)?;
            }
        }
        Ok(())
    }

    pub fn status(&mut self, state: &GameState) -> io::Result<()> {
        writeln!(self.output)?;
        if let Some(setting) = state.setting() {
            writeln!(
                self.output,
                "{} - {}",
                setting.player_name, setting.player_background
            )?;
        }
        match state.location() {
            Some(location) => {
                writeln!(self.output, "Location: {}", location.name)?;
                if !location.description.is_empty() {
                    writeln!(self.output, "  {}", location.description)?;
                }
            }
            None => writeln!(self.output, "Location: unknown")?,
        }
        let items: Vec<&str> = state.inventory().iter().map(String::as_str).collect();
        writeln!(self.output, "Inventory: {}", format_list(&items))?;
        if state.characters().is_empty() {
            writeln!(self.output, "Characters met: nobody yet")?;
        } else {
            writeln!(self.output, "Characters met:")?;
            for (name, descriptor) in state.characters() {
                writeln!(self.output, "  {name}: {descriptor}")?;
            }
        }
        writeln!(self.output, "Turns taken: {}", state.history().len())
    }

    pub fn help(&mut self) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "  1-4          - Take that action")?;
        writeln!(self.output, "  i, status    - Show location, inventory and characters")?;
        writeln!(self.output, "  n, narration - Toggle spoken narration")?;
        writeln!(self.output, "  h, help      - Show this help")?;
        writeln!(self.output, "  q, quit      - Leave the adventure")
    }

    pub fn the_end(&mut self) -> io::Result<()> {
        if self.interactive {
            writeln!(self.output, "{}", "~ THE END ~".bold())?;
        } else {
            writeln!(self.output, "~ THE END ~")?;
        }
        self.line("Thanks for playing!")
    }
}

/// Boxed two-line title.
pub fn banner(title1: &str, title2: &str) -> String {
    let border = "═".repeat(BANNER_WIDTH);
    let empty = format!("    ║{}║", " ".repeat(BANNER_WIDTH));
    let centered = |title: &str| format!("    ║{title:^width$}║", width = BANNER_WIDTH);

    [
        String::new(),
        format!("    ╔{border}╗"),
        empty.clone(),
        centered(title1),
        empty.clone(),
        centered(title2),
        empty,
        format!("    ╚{border}╝"),
        String::new(),
    ]
    .join("\n")
}

/// Render items as English: "a", "a and b", "a, b, and c".
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => "nothing".to_string(),
        [one] => one.as_ref().to_string(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [init @ .., last] => {
            let init: Vec<&str> = init.iter().map(|s| s.as_ref()).collect();
            format!("{}, and {}", init.join(", "), last.as_ref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_list() {
        let none: [&str; 0] = [];
        assert_eq!(format_list(&none), "nothing");
        assert_eq!(format_list(&["torch"]), "torch");
        assert_eq!(format_list(&["torch", "rope"]), "torch and rope");
        assert_eq!(format_list(&["torch", "rope", "dagger"]), "torch, rope, and dagger");
    }

    #[test]
    fn test_banner_lines_align() {
        let banner = banner("DUNGEON", "EXPLORER");
        let widths: Vec<usize> = banner
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| l.chars().count())
            .collect();
        assert_eq!(widths.len(), 7);
        assert!(widths.iter().all(|&w| w == BANNER_WIDTH + 6));
        assert!(banner.contains("DUNGEON"));
        assert!(banner.contains("EXPLORER"));
    }

    #[test]
    fn test_read_line_reports_eof() {
        let mut console = Console::new(&b"1\n"[..], Vec::new(), false);
        assert_eq!(console.read_line("> ").unwrap().as_deref(), Some("1\n"));
        assert_eq!(console.read_line("> ").unwrap(), None);
    }

    #[tokio::test]
    async fn test_plain_story_output() {
        let mut console = Console::new(&b""[..], Vec::new(), false);
        console.story("First.\n\nSecond.").await.unwrap();
        let out = String::from_utf8(console.output().clone()).unwrap();
        assert_eq!(out, "\nFirst.\n\nSecond.\n\n");
    }
}
