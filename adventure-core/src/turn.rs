//! Generated turns and parsing of the model's reply.
//!
//! The reply is opaque content: a JSON object that may arrive bare, inside a
//! code fence, or surrounded by prose. Anything that does not yield a
//! narrative and exactly four choices is rejected.

use crate::narration::Audio;
use crate::state::Setting;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Every turn offers exactly this many choices.
pub const CHOICES_PER_TURN: usize = 4;

/// State changes a turn asks for. Applied only once the whole turn is in hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StateChanges {
    #[serde(deserialize_with = "nullable")]
    pub items_gained: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub items_lost: Vec<String>,
    /// Characters whose relationship or status changed, name to descriptor.
    #[serde(deserialize_with = "nullable_values")]
    pub characters: BTreeMap<String, String>,
    pub new_location: Option<String>,
    pub location_description: Option<String>,
    /// Only meaningful on the opening turn.
    pub setting: Option<Setting>,
}

/// One response from the generation capability.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub narrative: String,
    /// One-line recap used as the history entry.
    pub summary: Option<String>,
    pub choices: [String; CHOICES_PER_TURN],
    /// The adventure is over; no further input is requested.
    pub terminal: bool,
    pub changes: StateChanges,
    /// Filled in by presentation when narration is on.
    pub audio: Option<Audio>,
}

impl Turn {
    pub fn new(narrative: impl Into<String>, choices: [String; CHOICES_PER_TURN]) -> Self {
        Self {
            narrative: narrative.into(),
            summary: None,
            choices,
            terminal: false,
            changes: StateChanges::default(),
            audio: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_changes(mut self, changes: StateChanges) -> Self {
        self.changes = changes;
        self
    }

    /// Mark this as the closing turn of the adventure.
    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn choice(&self, index: usize) -> Option<&str> {
        self.choices.get(index).map(String::as_str)
    }

    /// The text recorded in history for this turn.
    pub fn recap(&self) -> &str {
        match self.summary.as_deref().map(str::trim) {
            Some(summary) if !summary.is_empty() => summary,
            _ => self.narrative.trim(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default, deserialize_with = "nullable")]
    narrative: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    choices: Vec<String>,
    #[serde(
        default,
        alias = "is_terminal",
        alias = "game_over",
        deserialize_with = "nullable"
    )]
    adventure_complete: bool,
    #[serde(flatten)]
    changes: StateChanges,
}

/// Parse a model reply into a turn.
///
/// Returns a description of what was wrong when the reply is unusable.
pub fn parse_reply(text: &str) -> Result<Turn, String> {
    let json = extract_json(text).ok_or_else(|| "no JSON object in reply".to_string())?;
    let reply: Reply =
        serde_json::from_str(json).map_err(|e| format!("invalid JSON in reply: {e}"))?;

    let narrative = reply.narrative.trim();
    if narrative.is_empty() {
        return Err("reply has no narrative".to_string());
    }

    let choices: Vec<String> = reply
        .choices
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    let count = choices.len();
    let choices: [String; CHOICES_PER_TURN] = choices
        .try_into()
        .map_err(|_| format!("expected {CHOICES_PER_TURN} choices, got {count}"))?;

    Ok(Turn {
        narrative: narrative.to_string(),
        summary: reply.summary.filter(|s| !s.trim().is_empty()),
        choices,
        terminal: reply.adventure_complete,
        changes: reply.changes,
        audio: None,
    })
}

/// The outermost `{...}` span of `text`, if any.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Treat an explicit `null` as the default value.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A string map where the map itself or any value may be `null`.
fn nullable_values<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: Option<BTreeMap<String, Option<String>>> = Option::deserialize(deserializer)?;
    Ok(map
        .unwrap_or_default()
        .into_iter()
        .map(|(name, descriptor)| (name, descriptor.unwrap_or_default()))
        .collect())
}
