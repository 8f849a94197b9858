//! Choose-your-path adventure engine.
//!
//! This crate provides:
//! - A turn-based session whose narrative is written by a language model
//! - Atomic state updates: a turn is applied whole or not at all
//! - Optional text-to-speech narration with a fixed set of voices
//! - Scripted stand-ins for both services, for tests
//!
//! # Quick Start
//!
//! ```ignore
//! use adventure_core::{Config, LlmGenerator, Progress, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let generator = LlmGenerator::new(config.client());
//!     let mut session = Session::new(generator);
//!
//!     if let Progress::Continue(step) = session.start().await? {
//!         println!("{}", step.turn.narrative);
//!         session.advance(0).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod generator;
pub mod narration;
pub mod prompts;
pub mod session;
pub mod state;
pub mod testing;
pub mod turn;

// Primary public API
pub use config::{Config, ConfigError};
pub use generator::{GenerationError, Generator, GeneratorConfig, LlmGenerator};
pub use narration::{Audio, NarrationError, Narrator, SpeechNarrator, UnknownVoice, Voice};
pub use session::{Progress, Session, SessionError, Step};
pub use state::{Applied, Beat, GameState, Location, Setting};
pub use testing::{RecordingNarrator, ScriptedGenerator};
pub use turn::{StateChanges, Turn, CHOICES_PER_TURN};
