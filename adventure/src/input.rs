//! Parsing of what the player types at the choice prompt.

/// A line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Zero-based choice index. Range checking is left to the session.
    Choose(usize),
    Quit,
    Status,
    ToggleNarration,
    Help,
    Invalid,
}

/// Parse one line. Choices are shown 1-based and returned 0-based.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if let Ok(number) = line.parse::<usize>() {
        return match number.checked_sub(1) {
            Some(index) => Command::Choose(index),
            None => Command::Invalid,
        };
    }

    match line.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Command::Quit,
        "i" | "status" | "inventory" => Command::Status,
        "n" | "narration" => Command::ToggleNarration,
        "h" | "help" | "?" => Command::Help,
        _ => Command::Invalid,
    }
}

/// Answer to the retry question. Anything but an explicit no means yes.
pub fn parse_retry(line: &str) -> bool {
    !matches!(
        line.trim().to_lowercase().as_str(),
        "n" | "no" | "q" | "quit"
    )
}
