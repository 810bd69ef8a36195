mod args;
mod chat;
mod cli;
mod color;
mod config;
mod providers;
mod session;
mod utils;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use cli::{chat::chat_cmd, ColorMode};
use config::Settings;
use providers::OpenAIProvider;
use session::Session;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `XTALK_LOG=debug`
const LOG_FILTER_VAR: &str = "XTALK_LOG";

#[derive(
    Default, Clone, Copy, ValueEnum, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum RequestedColorMode {
    #[default]
    Auto,
    On,
    Off,
}

#[derive(Parser)]
#[command(name = "xtalk")]
#[command(
    about = "Chat with an OpenAI-compatible model from the terminal",
    long_about = "Chat with an OpenAI-compatible model from the terminal.\n\n\
Environment variables:\n  \
  OPENAI_API_KEY    API key for the endpoint (required unless set in the config file)\n  \
  OPENAI_BASE_URL   API base, defaults to https://api.openai.com/v1\n  \
  OPENAI_MODEL      Default model\n  \
  XTALK_LOG         Log filter for diagnostics, e.g. \"debug\"",
    version
)]
struct Cli {
    #[arg(long, default_value_t = RequestedColorMode::default())]
    color: RequestedColorMode,
    /// Read settings from this config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// [-m <model>] [-t <temperature>] [system prompt...]
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    args: Vec<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("off"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    color::configure_color(ColorMode::resolve_auto(cli.color));

    init_logging();

    let config = match config::read_config(cli.config) {
        Ok(config) => config,
        Err(err) => die!("{}", err),
    };

    let settings = match Settings::merge(&config, config::process_env) {
        Ok(settings) => settings,
        Err(err) => die!("{}", err),
    };

    let session_config = match args::resolve(&cli.args, &settings.default_model) {
        Ok(session_config) => session_config,
        Err(err) => {
            error!("{}", err);
            eprintln!();
            eprintln!("{}", args::usage());
            std::process::exit(utils::errors::USAGE_EXIT_CODE);
        }
    };

    let endpoint = match settings.endpoint() {
        Ok(endpoint) => endpoint,
        Err(err) => die!("{}", err),
    };

    tracing::debug!(?endpoint, ?session_config, "starting session");

    let provider = match OpenAIProvider::new(&endpoint) {
        Ok(provider) => provider,
        Err(err) => die!("failed to set up the endpoint client: {}", err),
    };

    let session = Session::new(session_config, Box::new(provider));

    chat_cmd(config.keybindings, session).await;
}
