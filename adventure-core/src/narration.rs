//! Text-to-speech narration.
//!
//! The `Narrator` trait is the seam between the game and a speech vendor.
//! `SpeechNarrator` is the OpenAI-backed implementation.

use async_trait::async_trait;
use openai::{OpenAi, SpeechRequest};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Longest input the speech endpoint accepts, in characters.
pub const MAX_SPEECH_CHARS: usize = 4096;

/// Errors from narration.
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("speech API error: {0}")]
    Api(#[from] openai::Error),

    #[error("nothing to narrate")]
    EmptyText,
}

/// A voice name that is not one of [`Voice::ALL`].
#[derive(Debug, Error)]
#[error("unknown voice '{0}' (expected one of: warm-natural, deep-resonant, mystical, clear-authoritative, bright-energetic, soft-gentle)")]
pub struct UnknownVoice(pub String);

/// The narration voices on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Voice {
    WarmNatural,
    DeepResonant,
    Mystical,
    #[default]
    ClearAuthoritative,
    BrightEnergetic,
    SoftGentle,
}

impl Voice {
    pub const ALL: [Voice; 6] = [
        Voice::WarmNatural,
        Voice::DeepResonant,
        Voice::Mystical,
        Voice::ClearAuthoritative,
        Voice::BrightEnergetic,
        Voice::SoftGentle,
    ];

    /// The name players type on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Voice::WarmNatural => "warm-natural",
            Voice::DeepResonant => "deep-resonant",
            Voice::Mystical => "mystical",
            Voice::ClearAuthoritative => "clear-authoritative",
            Voice::BrightEnergetic => "bright-energetic",
            Voice::SoftGentle => "soft-gentle",
        }
    }

    /// The speech vendor's identifier for this voice.
    pub fn vendor_id(self) -> &'static str {
        match self {
            Voice::WarmNatural => "alloy",
            Voice::DeepResonant => "echo",
            Voice::Mystical => "fable",
            Voice::ClearAuthoritative => "onyx",
            Voice::BrightEnergetic => "nova",
            Voice::SoftGentle => "shimmer",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Voice {
    type Err = UnknownVoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
        Voice::ALL
            .into_iter()
            .find(|v| v.name() == wanted)
            .ok_or_else(|| UnknownVoice(s.to_string()))
    }
}

/// Encoded mp3 audio ready for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audio {
    pub bytes: Vec<u8>,
}

/// Renders text as speech.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, text: &str, voice: Voice) -> Result<Audio, NarrationError>;
}

/// Narration through the OpenAI speech endpoint.
pub struct SpeechNarrator {
    client: OpenAi,
}

impl SpeechNarrator {
    pub fn new(client: OpenAi) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Narrator for SpeechNarrator {
    async fn narrate(&self, text: &str, voice: Voice) -> Result<Audio, NarrationError> {
        let text = speakable(text).ok_or(NarrationError::EmptyText)?;
        debug!(voice = %voice, chars = text.chars().count(), "requesting narration");

        let request = SpeechRequest::new(text, voice.vendor_id());
        let bytes = self.client.speech(request).await?;

        Ok(Audio { bytes })
    }
}

/// Trim `text` to what the speech endpoint accepts, cutting at a sentence end
/// when one is available.
pub fn speakable(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let Some((cut, _)) = text.char_indices().nth(MAX_SPEECH_CHARS) else {
        return Some(text);
    };
    let head = &text[..cut];
    let sentence_end = head
        .rfind(['.', '!', '?'])
        .map(|i| i + 1)
        .filter(|&i| i > cut / 2);
    Some(&head[..sentence_end.unwrap_or(cut)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_voice() {
        assert_eq!(Voice::default(), Voice::ClearAuthoritative);
        assert_eq!(Voice::default().vendor_id(), "onyx");
    }

    #[test]
    fn test_voice_names_round_trip() {
        for voice in Voice::ALL {
            assert_eq!(voice.name().parse::<Voice>().unwrap(), voice);
            assert_eq!(voice.to_string(), voice.name());
        }
    }

    #[test]
    fn test_voice_parse_is_lenient() {
        assert_eq!("Soft_Gentle".parse::<Voice>().unwrap(), Voice::SoftGentle);
        assert_eq!(" deep resonant ".parse::<Voice>().unwrap(), Voice::DeepResonant);
        let err = "nova".parse::<Voice>().unwrap_err();
        assert!(err.to_string().contains("unknown voice 'nova'"));
    }

    #[test]
    fn test_vendor_ids_are_distinct() {
        let mut ids: Vec<_> = Voice::ALL.iter().map(|v| v.vendor_id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), Voice::ALL.len());
    }

    #[test]
    fn test_speakable() {
        assert_eq!(speakable("   "), None);
        assert_eq!(speakable("  Hello there. "), Some("Hello there."));

        let long = "The hall is dark. ".repeat(400);
        let cut = speakable(&long).unwrap();
        assert!(cut.chars().count() <= MAX_SPEECH_CHARS);
        assert!(cut.ends_with('.'));
    }
}
