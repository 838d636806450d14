pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod models;
pub mod query;

use anyhow::Context;
use config::LogFormat;
use std::collections::BTreeMap;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use catalog::{Catalog, LoadError};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use query::{FilterSpec, QueryParams, ValidationError};

pub async fn run(config: Config, command: Commands) -> anyhow::Result<()> {
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    match command {
        Commands::Serve { .. } => run_server(config, prometheus_handle).await,
        Commands::Check { .. } => cmd_check(&config).await,
        Commands::Init => {
            if config::Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it untouched.");
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.general.log_format == LogFormat::Json;
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer));

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "anidex")?
            .extra_field("pid", std::process::id().to_string())?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Anidex v{} starting...", env!("CARGO_PKG_VERSION"));

    // A catalog that fails to load is fatal: nothing is bound until it is ready.
    let catalog = catalog::open(&config.catalog.path).await?;

    let addr = config.listen_address();
    let state = api::create_app_state(config, catalog, prometheus_handle);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    let catalog = catalog::open(&config.catalog.path).await?;

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for anime in catalog.all() {
        *by_type.entry(anime.anime_type.as_str()).or_default() += 1;
    }

    println!("✓ {} loaded: {} records", config.catalog.path, catalog.len());
    if let (Some(first), Some(last)) = (catalog.all().first(), catalog.all().last()) {
        println!("  ids {} to {}", first.id, last.id);
    }
    for (kind, count) in by_type {
        println!("  {:<8} {}", kind, count);
    }

    Ok(())
}
