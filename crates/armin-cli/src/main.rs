use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use armin_application::{ChatSession, Notifier};
use armin_core::config::AppSettings;
use armin_core::persona::{ARMIN_ULTIMATE_ID, find_persona, get_default_presets};
use armin_infrastructure::{JsonSettingsRepository, SettingsService};
use armin_interaction::GeminiApiClient;

mod commands;
mod helper;
mod render;
mod repl;

const DEFAULT_LOG_FILTER: &str = "warn,armin=info";

#[derive(Parser)]
#[command(name = "armin")]
#[command(about = "Armin AI - persona-driven chat with Gemini in the terminal", long_about = None)]
struct Cli {
    /// Persona to start with (see /personas)
    #[arg(long, default_value = ARMIN_ULTIMATE_ID)]
    persona: String,

    /// Model for this run, overriding the saved setting
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature for this run (0-2)
    #[arg(long)]
    temperature: Option<f32>,

    /// Disable the web search tool for this run
    #[arg(long)]
    no_search: bool,

    /// API key for this run; not saved
    #[arg(long)]
    api_key: Option<String>,

    /// Directory generated images are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

impl Cli {
    /// Applies per-run flags on top of the loaded settings.
    fn apply_overrides(&self, mut settings: AppSettings) -> AppSettings {
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if self.no_search {
            settings.enable_search = false;
        }
        if let Some(key) = &self.api_key {
            settings.api_key = key.clone();
        }
        settings.normalized()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let persona = find_persona(&cli.persona).with_context(|| {
        let known: Vec<String> = get_default_presets().into_iter().map(|p| p.id).collect();
        format!("Unknown persona '{}' (available: {})", cli.persona, known.join(", "))
    })?;

    let repository = Arc::new(
        JsonSettingsRepository::new().context("Failed to locate the settings file")?,
    );
    tracing::debug!("[Main] Settings file: {}", repository.path().display());
    let settings_service = SettingsService::new(repository);
    let settings = cli.apply_overrides(
        settings_service
            .load()
            .await
            .context("Failed to load settings")?,
    );

    let (notifier, notifications) = Notifier::channel();
    let session = Arc::new(ChatSession::new(
        Arc::new(GeminiApiClient::new()),
        persona,
        settings,
        notifier,
    ));

    repl::Repl::new(session, settings_service, notifications, cli.output_dir)
        .run()
        .await
}
