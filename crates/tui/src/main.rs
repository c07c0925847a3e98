mod app;

use std::{
    fs::{self, OpenOptions},
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use tracing_subscriber::{prelude::*, EnvFilter};
use wikibingo_core::{
    config::{self, AppConfig},
    Leaderboard, WikipediaTokenizer, WordPool,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let pool = WordPool::load(&config.vocabulary_path).with_context(|| {
        format!(
            "failed to load vocabulary {}",
            config.vocabulary_path.display()
        )
    })?;
    let leaderboard = Leaderboard::new(&config.leaderboard_path);
    let tokenizer = WikipediaTokenizer::new(&config.wiki_api_url, config.fetch_timeout());

    let mut app = app::WikiBingoApp::new(
        Arc::new(pool),
        Arc::new(tokenizer),
        leaderboard,
        &config,
    );
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("wikibingo.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal belongs to the UI, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
