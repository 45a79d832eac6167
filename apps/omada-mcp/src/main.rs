//! Omada MCP server binary

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use omada_core::{AppConfig, OmadaClient};
use omada_gateway::{omada_client_factory, serve_stdio, GatewayConfig, GatewayServer};
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use cli::{Cli, Command};

const LOG_PREFIX: &str = "omada-mcp";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let _guard = init_tracing(config.log_dir.as_deref());

    if let Err(e) = run(cli.command(), config).await {
        tracing::error!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command, mut config: AppConfig) -> Result<()> {
    match command {
        Command::Stdio => {
            let client =
                OmadaClient::new(&config.omada).context("failed to build Omada client")?;
            serve_stdio(Arc::new(client)).await
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.http.host = host;
            }
            if let Some(port) = port {
                config.http.port = port;
            }

            let gateway = GatewayConfig {
                http: config.http,
                inbound_auth: config.inbound_auth,
            };
            let server = GatewayServer::new(gateway, omada_client_factory(config.omada));

            let token = server.shutdown_token();
            tokio::spawn(async move {
                shutdown_signal().await;
                info!("Shutdown signal received, closing sessions");
                token.cancel();
            });

            server.run().await
        }
    }
}

/// Logs go to stderr (stdout carries the stdio transport), plus a daily file when
/// `OMADA_MCP_LOG_DIR` is set.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,omada_core=debug,omada_gateway=debug,omada_mcp=debug")
    });

    let mut file_error = None;
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = std::fs::create_dir_all(dir)
                .map_err(|e| e.to_string())
                .and_then(|_| {
                    RollingFileAppender::builder()
                        .rotation(Rotation::DAILY)
                        .filename_prefix(LOG_PREFIX)
                        .filename_suffix("log")
                        .build(dir)
                        .map_err(|e| e.to_string())
                });
            match appender {
                Ok(appender) => {
                    let (writer, guard) = tracing_appender::non_blocking(appender);
                    let layer = fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true);
                    (Some(layer), Some(guard))
                }
                Err(e) => {
                    file_error = Some(e);
                    (None, None)
                }
            }
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!("File logging disabled: {}", e);
    }
    guard
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
