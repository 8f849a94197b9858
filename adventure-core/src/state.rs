//! Narrative state accumulated over a session.
//!
//! `GameState` is only ever changed by [`crate::Session`], and only by
//! applying a turn that arrived complete. Nothing here is persisted.

use crate::turn::{nullable, StateChanges};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One entry in the adventure log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beat {
    /// The choice the player picked.
    pub action: String,
    /// What came of it.
    pub outcome: String,
}

/// The adventure premise, fixed by the opening turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Setting {
    #[serde(deserialize_with = "nullable")]
    pub theme: String,
    #[serde(deserialize_with = "nullable")]
    pub conflict: String,
    #[serde(deserialize_with = "nullable")]
    pub player_name: String,
    #[serde(deserialize_with = "nullable")]
    pub player_background: String,
    /// Ways the conflict can be resolved in the player's favor.
    #[serde(deserialize_with = "nullable")]
    pub possible_solutions: Vec<String>,
    /// Ways the adventure can end in defeat.
    #[serde(deserialize_with = "nullable")]
    pub failure_cases: Vec<String>,
}

/// Where the player currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub description: String,
}

/// What actually changed when a turn was applied.
///
/// Differs from [`StateChanges`] in that it only lists effective changes:
/// an item already carried is not "gained" twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    pub gained: Vec<String>,
    pub lost: Vec<String>,
    pub met: Vec<String>,
    pub moved_to: Option<String>,
}

impl Applied {
    pub fn is_empty(&self) -> bool {
        self.gained.is_empty()
            && self.lost.is_empty()
            && self.met.is_empty()
            && self.moved_to.is_none()
    }
}

/// Session-scoped narrative state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    history: Vec<Beat>,
    inventory: BTreeSet<String>,
    characters: BTreeMap<String, String>,
    setting: Option<Setting>,
    location: Option<Location>,
}

impl GameState {
    /// Create an empty state: no history, nothing carried, nobody met.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Beat] {
        &self.history
    }

    pub fn inventory(&self) -> &BTreeSet<String> {
        &self.inventory
    }

    /// Character name to relationship/status descriptor.
    pub fn characters(&self) -> &BTreeMap<String, String> {
        &self.characters
    }

    pub fn setting(&self) -> Option<&Setting> {
        self.setting.as_ref()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.contains(item)
    }

    /// Record a beat and fold a turn's changes into the state.
    ///
    /// Callers must only pass changes from a turn that was received and
    /// validated in full.
    pub(crate) fn apply(&mut self, beat: Option<Beat>, changes: &StateChanges) -> Applied {
        let mut applied = Applied::default();

        if let Some(beat) = beat {
            self.history.push(beat);
        }

        if let Some(setting) = &changes.setting {
            if self.setting.is_none() {
                self.setting = Some(setting.clone());
            }
        }

        for item in clean(&changes.items_gained) {
            if self.inventory.insert(item.to_string()) {
                applied.gained.push(item.to_string());
            }
        }

        for item in clean(&changes.items_lost) {
            if self.inventory.remove(item) {
                applied.lost.push(item.to_string());
            }
        }

        for (name, descriptor) in &changes.characters {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let previous = self
                .characters
                .insert(name.to_string(), descriptor.trim().to_string());
            if previous.is_none() {
                applied.met.push(name.to_string());
            }
        }

        let description = changes
            .location_description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        let destination = changes
            .new_location
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter(|name| self.location.as_ref().map(|l| l.name.as_str()) != Some(*name));

        if let Some(name) = destination {
            self.location = Some(Location {
                name: name.to_string(),
                description: description.unwrap_or_default().to_string(),
            });
            applied.moved_to = Some(name.to_string());
        } else if let (Some(location), Some(description)) = (self.location.as_mut(), description) {
            // Staying put, possibly redescribed.
            location.description = description.to_string();
        }

        applied
    }
}

fn clean(items: &[String]) -> impl Iterator<Item = &str> {
    items.iter().map(|s| s.trim()).filter(|s| !s.is_empty())
}
