//! Polls a job search page, keeps postings that look like cybersecurity
//! work-study offers and announces each new one on Telegram.

mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use jobwatch_core::SearchQuery;
use jobwatch_engine::{
    BrowserProfile, BrowserSessionManager, CardSelectors, DiscoveryCycle, DiscoverySettings,
    HttpRenderEngine, JsonFileBacking, ListingCardExtractor, MemoryBacking,
    NotificationDispatcher, RenderEngine, RunLoop, RunLoopSettings, SeenBacking,
    TelegramTransport,
};
use tokio_util::sync::CancellationToken;
use watch_logging::{watch_error, watch_info, watch_warn};

use crate::config::{AppConfig, EngineKind};

const TELEGRAM_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = config::load_dotenv();
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    logging::initialize(config.log_file.as_deref());
    if let Some(path) = dotenv {
        watch_info!("Loaded environment from {:?}", path);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            watch_error!("Fatal: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<()> {
    let query = search_query(&config);
    let extractor = ListingCardExtractor::new(&CardSelectors::default(), query.origin())
        .context("building the listing card extractor")?;
    let backing: Box<dyn SeenBacking> = match &config.seen_file {
        Some(path) => {
            watch_info!("Seen jobs persisted to {:?}", path);
            Box::new(JsonFileBacking::new(path))
        }
        None => Box::new(MemoryBacking),
    };

    let sessions = BrowserSessionManager::new(build_engine(&config)?, browser_profile(&config));
    let mut discovery = DiscoveryCycle::new(sessions, Box::new(extractor), backing, query)
        .with_settings(DiscoverySettings {
            default_location: config.target_location.clone(),
            ..DiscoverySettings::default()
        });
    discovery
        .start()
        .await
        .context("no usable rendering engine at startup")?;

    let transport = TelegramTransport::new(
        &config.telegram_token,
        &config.telegram_chat_id,
        TELEGRAM_TIMEOUT,
    )
    .context("building the Telegram client")?;
    let dispatcher = NotificationDispatcher::new(Arc::new(transport), config.notify_delay);

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    watch_info!(
        "Watching {:?} in {:?} every {:?} (+ up to {:?})",
        config.search_keywords,
        config.target_location,
        config.check_interval,
        config.jitter_max
    );
    RunLoop::new(discovery, dispatcher, run_loop_settings(&config))
        .run(cancel)
        .await;
    Ok(())
}

fn search_query(config: &AppConfig) -> SearchQuery {
    let mut query = SearchQuery {
        keywords: config.search_keywords.clone(),
        location: config.target_location.clone(),
        ..SearchQuery::default()
    };
    if let Some(base_url) = &config.search_base_url {
        query.base_url = base_url.clone();
    }
    query
}

fn browser_profile(config: &AppConfig) -> BrowserProfile {
    let mut profile = BrowserProfile::default();
    if let Some(dir) = &config.browser_cache_dir {
        profile.cache_dir = dir.clone();
    }
    profile
}

fn run_loop_settings(config: &AppConfig) -> RunLoopSettings {
    RunLoopSettings {
        base_interval: config.check_interval,
        jitter_max: config.jitter_max,
        fallback_delay: config.fallback_delay,
        retention: chrono::Duration::days(i64::from(config.retention_days)),
        cleanup_every: config.cleanup_every,
        recycle_every: config.recycle_every,
    }
}

fn build_engine(config: &AppConfig) -> Result<Arc<dyn RenderEngine>> {
    match config.engine {
        EngineKind::Http => Ok(Arc::new(HttpRenderEngine::default())),
        EngineKind::Chromium => chromium_engine(config),
    }
}

#[cfg(feature = "chromium")]
fn chromium_engine(config: &AppConfig) -> Result<Arc<dyn RenderEngine>> {
    Ok(Arc::new(jobwatch_engine::ChromiumEngine::new(
        config.chrome_executable.clone(),
    )))
}

#[cfg(not(feature = "chromium"))]
fn chromium_engine(config: &AppConfig) -> Result<Arc<dyn RenderEngine>> {
    anyhow::bail!(
        "RENDER_ENGINE=chromium needs a build with the `chromium` feature (CHROME_EXECUTABLE={:?})",
        config.chrome_executable
    )
}

/// Cancels the run loop on Ctrl+C. The loop exits between cycles or
/// mid-sleep and then closes the browser.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                watch_info!("Ctrl+C received");
                cancel.cancel();
            }
            Err(err) => watch_warn!("Could not listen for Ctrl+C: {}", err),
        }
    });
}
