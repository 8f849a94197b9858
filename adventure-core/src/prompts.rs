//! Prompt construction for the game master.

use crate::state::GameState;
use std::fmt::Write;

/// Number of most recent beats quoted in full in each prompt.
pub const HISTORY_WINDOW: usize = 20;

const GAME_MASTER: &str = include_str!("prompts/game_master.txt");
const OPENING: &str = include_str!("prompts/opening.txt");

/// What the next turn should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind<'a> {
    /// The first turn of a new adventure.
    Opening,
    /// The turn following the player's chosen action.
    Action(&'a str),
}

/// A fully rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Render the prompt for the next turn from the current state.
pub fn build_prompt(state: &GameState, kind: PromptKind<'_>) -> Prompt {
    Prompt {
        system: GAME_MASTER.to_string(),
        user: build_user_prompt(state, kind),
    }
}

fn build_user_prompt(state: &GameState, kind: PromptKind<'_>) -> String {
    let mut prompt = String::new();

    if let PromptKind::Opening = kind {
        prompt.push_str(OPENING);
        return prompt;
    }

    prompt.push_str("## Current Game State\n");

    if let Some(setting) = state.setting() {
        let _ = writeln!(prompt, "\n### Setting");
        let _ = writeln!(prompt, "**Theme:** {}", setting.theme);
        let _ = writeln!(prompt, "**Conflict:** {}", setting.conflict);
        let _ = writeln!(
            prompt,
            "**Player:** {} ({})",
            setting.player_name, setting.player_background
        );
        if !setting.possible_solutions.is_empty() {
            let _ = writeln!(prompt, "**Ways to win:**");
            for solution in &setting.possible_solutions {
                let _ = writeln!(prompt, "- {solution}");
            }
        }
        if !setting.failure_cases.is_empty() {
            let _ = writeln!(prompt, "**Ways to lose:**");
            for failure in &setting.failure_cases {
                let _ = writeln!(prompt, "- {failure}");
            }
        }
    }

    if let Some(location) = state.location() {
        let _ = writeln!(prompt, "\n### Location");
        let _ = writeln!(prompt, "{}", location.name);
        if !location.description.is_empty() {
            let _ = writeln!(prompt, "{}", location.description);
        }
    }

    let _ = writeln!(prompt, "\n### Inventory");
    if state.inventory().is_empty() {
        prompt.push_str("(empty)\n");
    } else {
        for item in state.inventory() {
            let _ = writeln!(prompt, "- {item}");
        }
    }

    if !state.characters().is_empty() {
        let _ = writeln!(prompt, "\n### Characters");
        for (name, descriptor) in state.characters() {
            let _ = writeln!(prompt, "- {name}: {descriptor}");
        }
    }

    let history = state.history();
    if !history.is_empty() {
        let _ = writeln!(prompt, "\n### Story So Far");
        let skipped = history.len().saturating_sub(HISTORY_WINDOW);
        if skipped > 0 {
            let _ = writeln!(prompt, "({skipped} earlier turns omitted)");
        }
        for (i, beat) in history.iter().enumerate().skip(skipped) {
            let _ = writeln!(prompt, "{}. {} -> {}", i + 1, beat.action, beat.outcome);
        }
    }

    if let PromptKind::Action(action) = kind {
        let _ = writeln!(prompt, "\n## Player Action");
        let _ = writeln!(prompt, "The player has chosen to: \"{action}\"");
        prompt.push_str("\nContinue the adventure from here.\n");
    }

    prompt
}
