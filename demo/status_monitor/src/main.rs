mod config;
mod input;

use config::{HealthMode, StatusMonitorConfig};
use input::{parse_line, TransportMessage};
use std::sync::Arc;
use tidewatch_core::notify::LogSink;
use tidewatch_core::transport::{GraphQlErrorCode, TransportError};
use tidewatch_core::Tidewatch;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,tidewatch_core=info,status_monitor=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = StatusMonitorConfig::load();
    info!(
        target: "status_monitor",
        health = ?cfg.health_mode,
        render_ms = cfg.render_interval_ms,
        "Starting status monitor: stdin → event stream → notices + status"
    );

    let mut tidewatch = Tidewatch::new(cfg.monitor.clone(), Arc::new(LogSink));

    let (event_tx, event_rx) = mpsc::channel(cfg.monitor.event_buffer);
    let (signal_tx, signal_rx) = mpsc::channel(16);
    match cfg.health_mode {
        HealthMode::Transport => tidewatch.start_with_transport(event_rx, signal_rx)?,
        HealthMode::Simulated => {
            warn!(target: "status_monitor", "Connection status is simulated; it does not reflect the transport");
            tidewatch.start_simulated(event_rx)?
        }
    }

    // Read transport messages from stdin
    let simulated = cfg.health_mode == HealthMode::Simulated;
    let reader_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(target: "status_monitor", error = %e, "stdin read failed");
                    break;
                }
            };
            match parse_line(&line) {
                Ok(Some(TransportMessage::Event(ev))) => {
                    if event_tx.send(ev).await.is_err() {
                        break;
                    }
                }
                Ok(Some(TransportMessage::Signal(sig))) => {
                    if simulated {
                        debug!(target: "status_monitor", signal = ?sig, "Ignoring transport signal in simulated mode");
                    } else if signal_tx.send(sig).await.is_err() {
                        break;
                    }
                }
                Ok(Some(TransportMessage::Error { error })) => report_transport_error(error.into()),
                Ok(None) => {}
                Err(e) => warn!(target: "status_monitor", error = %e, "Skipping input line"),
            }
        }
        info!(target: "status_monitor", "Input closed");
        // Keep the connection signal channel open so end of input is not read as a disconnect
        std::future::pending::<()>().await;
    });

    let mut render = tokio::time::interval(cfg.render_interval());
    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = render.tick() => {
                let view = tidewatch.snapshot().await;
                if cfg.json_output {
                    println!("{}", serde_json::to_string(&view)?);
                } else {
                    info!(target: "status_monitor", "{}", view);
                }
            }
            res = &mut shutdown => {
                if let Err(e) = res {
                    warn!(target: "status_monitor", error = %e, "Ctrl+C handler failed");
                }
                info!(target: "status_monitor", "Shutting down...");
                break;
            }
        }
    }

    reader_task.abort();
    let stats = tidewatch.dispatcher().stats();
    info!(
        target: "status_monitor",
        evaluated = stats.evaluated,
        emitted = stats.emitted,
        suppressed = stats.suppressed,
        "Notification summary"
    );
    tidewatch.shutdown().await?;
    Ok(())
}

fn report_transport_error(err: TransportError) {
    warn!(target: "status_monitor", error = ?err, "{}", err.user_message());
    if let TransportError::GraphQl {
        code: Some(code), ..
    } = &err
    {
        if let Some(path) = code.redirect() {
            info!(target: "status_monitor", path, "Session expired; redirecting");
        } else if *code == GraphQlErrorCode::Forbidden {
            debug!(target: "status_monitor", "Request forbidden for current role");
        }
    }
}
