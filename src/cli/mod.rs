//! Command-line interface parsing and handling
//!
//! Parses arguments and routes to the chat loop or to config commands.

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "chatoyer")]
#[command(about = "A terminal-based chat interface with styled translations")]
#[command(
    long_about = "Chatoyer is a full-screen terminal chat client for OpenAI-compatible APIs. \
Replies stream in as they are generated, and any finished reply can be rendered \
into the target language in one of five styles.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY    Your API key (required)\n\
  OPENAI_BASE_URL   Custom API base URL (optional, defaults to https://api.openai.com/v1)\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Ctrl+T            Pick a translation style for a finished reply\n\
  Up/Down           Scroll through chat history\n\
  Left/Right        Switch the target reply inside the style picker\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Target language for translations (e.g. "th")
    #[arg(long, value_name = "LANG")]
    pub lang: Option<String>,

    /// Enable transcript logging to the specified file
    #[arg(short = 'l', long, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key; prints the current config when omitted
        value: Option<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    // Diagnostics go to stderr so the alternate screen stays clean; silent
    // unless RUST_LOG opts in.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Some(Commands::Set { key, value }) => set_config_value(&key, value),
        Some(Commands::Unset { key }) => unset_config_value(&key),
        Some(Commands::Chat) | None => run_chat(args.model, args.lang, args.log).await,
    }
}

fn set_config_value(key: &str, value: Option<String>) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    let Some(value) = value else {
        config.print_all();
        return Ok(());
    };
    match key {
        "default-model" => {
            config.default_model = Some(value.clone());
            config.save()?;
            println!("✅ Set default-model to: {value}");
        }
        "target-language" => {
            config.target_language = Some(value.clone());
            config.save()?;
            println!("✅ Set target-language to: {value}");
        }
        "theme" => {
            config.theme = Some(value.clone());
            config.save()?;
            println!("✅ Set theme to: {value}");
        }
        _ => {
            eprintln!("❌ Unknown config key: {key}");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn unset_config_value(key: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    match key {
        "default-model" => {
            config.default_model = None;
            config.save()?;
            println!("✅ Unset default-model");
        }
        "target-language" => {
            config.target_language = None;
            config.save()?;
            println!("✅ Unset target-language");
        }
        "theme" => {
            config.theme = None;
            config.save()?;
            println!("✅ Unset theme");
        }
        _ => {
            eprintln!("❌ Unknown config key: {key}");
            std::process::exit(1);
        }
    }
    Ok(())
}
