//! msgrate Binary Entry Point
//!
//! Runs the Prometheus exporter against a host's HTTP introspection
//! endpoint until interrupted.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use msgrate::{
    MetricsCollector, MetricsComponent, PrometheusExporter, RateCalculator,
    config::{AppConfig, parse_duration}, exporter::settings::PROMETHEUS_ENDPOINT_KEY,
    source::http::HttpSourceProvider,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// msgrate - push message rates to a Prometheus Pushgateway
#[derive(Parser, Debug)]
#[command(name = "msgrate", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "MSGRATE_CONFIG"
    )]
    config: String,

    /// Statistics source base URL (overrides config file)
    #[arg(long, env = "MSGRATE_SOURCE_URL")]
    source_url: Option<String>,

    /// Pushgateway endpoint (overrides the prometheusEndpointUrl property)
    #[arg(long, env = "MSGRATE_PROMETHEUS_ENDPOINT")]
    endpoint: Option<String>,

    /// Poll interval, e.g. `30s` (overrides config file)
    #[arg(long, env = "MSGRATE_INTERVAL", value_parser = parse_duration)]
    interval: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,msgrate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(url) = cli.source_url {
        config.source.url = url;
    }
    if let Some(endpoint) = cli.endpoint {
        config
            .properties
            .insert(PROMETHEUS_ENDPOINT_KEY.to_string(), endpoint);
    }
    if let Some(interval) = cli.interval {
        config.exporter.interval = Some(interval);
    }
    config.validate()?;

    tracing::info!(
        source = %config.source.url,
        pattern = %config.source.pattern,
        job = %config.exporter.job,
        "Configuration loaded"
    );

    let provider =
        Arc::new(HttpSourceProvider::new(&config.source.url).with_timeout(config.source.timeout));
    let collector = Arc::new(MetricsCollector::with_pattern(
        provider,
        &config.source.pattern,
    )?);

    let calculator = RateCalculator::new().with_zero_report(config.exporter.zero_report);
    let mut exporter = PrometheusExporter::with_calculator(collector, calculator)
        .with_timeout(config.exporter.timeout)
        .with_job(&config.exporter.job);
    if let Some(interval) = config.exporter.interval {
        exporter = exporter.with_interval(interval);
    }

    let component = MetricsComponent::new().with_adapter(Arc::new(exporter));
    component.init(&config.bootstrap_properties()).await;
    component.start().await;

    tracing::info!("Press Ctrl+C to shutdown");
    shutdown_signal().await;

    tracing::info!("Stopping metrics adapters...");
    component.stop().await;
    component.destroy().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
