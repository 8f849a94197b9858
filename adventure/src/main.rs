//! Dungeon Explorer terminal application.
//!
//! A choose-your-path adventure written on the fly by a language model and,
//! optionally, read aloud.
//!
//! ```bash
//! OPENAI_API_KEY=... cargo run -p adventure -- --narrate --voice mystical
//! ```

mod console;
mod input;
mod play;
mod playback;

use adventure_core::{Config, ConfigError, LlmGenerator, Session, SpeechNarrator, Voice};
use clap::Parser;
use console::Console;
use play::{Narration, Presenter};
use playback::AudioPlayer;
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Explore a dungeon narrated by an AI game master
#[derive(Parser)]
#[command(name = "adventure")]
#[command(about = "Explore a dungeon narrated by an AI game master", long_about = None)]
#[command(version)]
struct Cli {
    /// Read each turn aloud
    #[arg(long)]
    narrate: bool,

    /// Narration voice: warm-natural, deep-resonant, mystical,
    /// clear-authoritative, bright-energetic or soft-gentle
    #[arg(long, default_value_t = Voice::default())]
    voice: Voice,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr and default to warnings so they stay out of the story.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}.");
            if let ConfigError::MissingApiKey = e {
                eprintln!("Please set it in .env file or with: export OPENAI_API_KEY=your_key_here");
            }
            std::process::exit(1);
        }
    };

    let client = config.client();
    let generator = LlmGenerator::new(client.clone()).with_config(config.generator_config());
    let narrator = SpeechNarrator::new(client);
    let player = AudioPlayer::detect(config.player.as_deref());

    let mut presenter = Presenter {
        narrator: &narrator,
        player: &player,
        narration: Narration {
            enabled: cli.narrate,
            voice: cli.voice,
        },
    };

    let interactive = io::stdout().is_terminal();
    let mut console = Console::new(io::stdin().lock(), io::stdout(), interactive);
    let mut session = Session::new(generator);

    play::run(&mut session, &mut presenter, &mut console).await?;
    Ok(())
}
