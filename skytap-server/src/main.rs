//! # Skytap Server
//!
//! Standalone host for the Skytap launcher block. See the library documentation for the
//! routes it serves.

use std::{collections::HashMap, error::Error, net::SocketAddr, path::PathBuf, str::FromStr};
use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use skytap_core::{FileSettings, HttpBrokerClient, Launcher};
use skytap_server::{config::DEFAULT_DISPLAY_NAME, ApiContext, Config};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// HTTP host for the Skytap launcher block
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// API key the LMS authenticates with
    #[arg(long, env = "SKYTAP_API_KEY")]
    api_key: String,

    /// Host address to bind to
    #[arg(long, env = "SKYTAP_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "SKYTAP_PORT", default_value = "3040")]
    port: u16,

    /// Path to the block settings file (json, yaml or toml)
    #[arg(long, env = "SKYTAP_SETTINGS")]
    settings: PathBuf,

    /// k=v list of parameters to substitute into the settings file
    /// e.g. skytap-server --settings settings.yml -p boomi_token=secret
    #[arg(short, long, value_parser = parse_key_val::<String, String>)]
    params: Option<Vec<(String, String)>>,

    /// Title displayed above the launch controls
    #[arg(long, env = "SKYTAP_DISPLAY_NAME", default_value = DEFAULT_DISPLAY_NAME)]
    display_name: String,

    /// Logging level (info, debug, trace)
    #[arg(long, env = "SKYTAP_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Delay between the shutdown signal and closing the listener
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

fn parse_key_val<T, U>(s: &str) -> Result<(T, U), Box<dyn Error + Send + Sync + 'static>>
where
    T: std::str::FromStr,
    T::Err: Error + Send + Sync + 'static,
    U: std::str::FromStr,
    U::Err: Error + Send + Sync + 'static,
{
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    Ok((s[..pos].parse()?, s[pos + 1..].parse()?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = Level::from_str(cli.log_level.to_lowercase().as_str()).unwrap_or(Level::INFO);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true),
        )
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    info!(version = %env!("CARGO_PKG_VERSION"), "Starting Skytap server");

    let params = cli
        .params
        .unwrap_or_default()
        .into_iter()
        .collect::<HashMap<_, _>>();

    let config = Config::try_new(cli.api_key, cli.display_name, cli.settings, params)
        .context("Configuration error")?;

    let settings = FileSettings::new(config.settings_path.clone(), config.params.clone());
    settings
        .load()
        .with_context(|| format!("Failed to load settings from {}", settings.path().display()))?;

    info!(
        settings = %config.settings_path.display(),
        "Configuration validated successfully"
    );

    let launcher = Launcher::new(Arc::new(settings), Arc::new(HttpBrokerClient::default()));
    let context = Arc::new(ApiContext::new(config, launcher));

    let shutdown_token = CancellationToken::new();
    let shutdown_token_ = shutdown_token.clone();

    tokio::spawn(async move {
        handle_shutdown_signals(shutdown_token_).await;
    });

    let app = skytap_server::app(context);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("Failed to parse socket address")?;

    info!(addr = %addr, "Listening for connections");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to address {addr}"))?;

    let server_handle = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_token))
        .await;

    match server_handle {
        Ok(_) => info!("Server shut down gracefully"),
        Err(e) => error!(error = %e, "Server error during shutdown"),
    }

    Ok(())
}

/// Handler function for shutdown signals
async fn handle_shutdown_signals(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    shutdown_token.cancel();
}

/// Resolves one grace period after cancellation. axum then waits for open requests.
async fn shutdown_signal_handler(token: CancellationToken) {
    token.cancelled().await;
    info!(
        grace_ms = SHUTDOWN_GRACE.as_millis() as u64,
        "Shutdown requested, closing the listener after the grace period"
    );

    tokio::time::sleep(SHUTDOWN_GRACE).await;
}
