use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{State, WebSocketUpgrade},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::Serialize;
use shared::error::ApiError;
use storage::{prepare_log_path, LogWriter, VoteLog};
use tokio::sync::mpsc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod hub;
mod relay;
mod serial;

use api::{export_votes_csv, reset_votes_log, status_for, ApiContext};
use app_state::AppState;
use config::{load_settings, SettingsOverrides};
use hub::BroadcastHub;
use relay::Relay;
use serial::{open_serial_port, spawn_serial_link, SerialHandle};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const VOTE_QUEUE_CAPACITY: usize = 256;
const CLIENT_COMMAND_CAPACITY: usize = 32;

/// Bridges a serial voting receiver to browsers.
#[derive(Debug, Parser)]
#[command(name = "vote-gateway", version)]
struct Cli {
    /// TOML settings file; missing is fine.
    #[arg(long, default_value = "gateway.toml")]
    config: PathBuf,
    #[command(flatten)]
    overrides: SettingsOverrides,
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    ok: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config).apply(cli.overrides);

    prepare_log_path(&settings.votes_log_path)?;
    let log = Arc::new(VoteLog::new(&settings.votes_log_path));
    log.reset().await.with_context(|| {
        format!(
            "failed to clear vote log '{}'",
            settings.votes_log_path.display()
        )
    })?;
    info!(path = %settings.votes_log_path.display(), "vote log cleared for a new session");

    let (log_writer, log_task) = LogWriter::spawn(log, settings.log_queue_capacity);
    let hub = BroadcastHub::new(EVENT_CHANNEL_CAPACITY);
    let (votes_tx, votes_rx) = mpsc::channel(VOTE_QUEUE_CAPACITY);
    let (commands_tx, commands_rx) = mpsc::channel(CLIENT_COMMAND_CAPACITY);

    let serial = match open_serial_port(&settings.serial_port, settings.baud_rate) {
        Ok(port) => {
            info!(
                port = %settings.serial_port,
                baud_rate = settings.baud_rate,
                "connected to serial receiver"
            );
            let (handle, _reader) = spawn_serial_link(port, votes_tx);
            handle
        }
        Err(error) => {
            error!(
                port = %settings.serial_port,
                %error,
                "could not open serial port; running without a device"
            );
            drop(votes_tx);
            SerialHandle::disconnected()
        }
    };

    let api = ApiContext {
        writer: log_writer.clone(),
    };
    let relay = tokio::spawn(Relay::new(log_writer, hub.clone(), serial).run(votes_rx, commands_rx));

    let state = AppState {
        api,
        hub,
        commands: commands_tx,
        static_dir: settings.static_dir.clone(),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "vote gateway ready");
    info!("open http://localhost:{} in a browser", addr.port());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the relay and the router releases the last log writer handles so queued votes flush.
    relay.abort();
    let _ = relay.await;
    if let Err(error) = log_task.await {
        warn!(%error, "vote log writer ended abnormally");
    }
    info!("vote gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn build_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/votes-log", get(http_export_votes))
        .route("/api/reset-log", post(http_reset_log))
        .route("/ws", get(ws_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_export_votes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let csv = export_votes_csv(&state.api)
        .await
        .map_err(|e| (status_for(&e), Json(e)))?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"votes-log.csv\"",
        ),
    ];
    Ok((StatusCode::OK, headers, csv))
}

async fn http_reset_log(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, (StatusCode, Json<ApiError>)> {
    reset_votes_log(&state.api)
        .await
        .map_err(|e| (status_for(&e), Json(e)))?;
    Ok(Json(ResetResponse { ok: true }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let hub = state.hub.clone();
    let commands = state.commands.clone();
    ws.on_upgrade(move |socket| hub::serve_client(hub, commands, socket))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
