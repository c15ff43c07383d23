//! # Telemetry Stream Client Entry Point
//!
//! Connects to a simulator telemetry plugin, follows the newest frame and mirrors
//! the driver's inputs through a dry-run actuator.
//!
//! ## Environment
//! - `TM_HOST`, `TM_PORT`, `TM_MAX_RECONNECT`, `TM_RECONNECT_DELAY_MS`, `TM_HEARTBEAT_MS`,
//!   `TM_CONNECT_TIMEOUT_MS`: client configuration (see `ClientConfig::from_env`).
//! - `TM_WINDOW`: window title to focus before streaming (X11 only).
//! - `TM_RUN_SECS`: session length in seconds (default 30, `0` = until the link is lost for good).
//!
//! ## Outputs
//! - `data/logs/session_stats.csv`: one row of stream counters per session.

use std::{
    env,
    path::Path,
    process,
    time::{Duration, Instant},
};

use log::{error, info, warn};

use tm_telemetry::{
    ClientConfig, Frame, StreamError, TelemetryClient,
    control::{
        actuator::{Actuator, ControlAction, LogActuator},
        window::{X11Tools, focus_by_title},
    },
    utils::export::export_stats_csv,
};

const DEFAULT_RUN_SECS: u64 = 30;
const FIRST_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const FRAME_TIMEOUT: Duration = Duration::from_secs(2);
const LOG_EVERY_N_FRAMES: u64 = 100;
const STATS_CSV: &str = "data/logs/session_stats.csv";

fn main() {
    env_logger::init();
    info!("=== TM TELEMETRY CLIENT START ===");

    let config = match ClientConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    let run_for = match env::var("TM_RUN_SECS").ok().map(|v| v.trim().parse::<u64>()) {
        None => Some(Duration::from_secs(DEFAULT_RUN_SECS)),
        Some(Ok(0)) => None,
        Some(Ok(secs)) => Some(Duration::from_secs(secs)),
        Some(Err(e)) => {
            error!("Invalid TM_RUN_SECS: {}", e);
            process::exit(2);
        }
    };

    if let Ok(title) = env::var("TM_WINDOW") {
        match focus_by_title(&X11Tools, &title) {
            Some(handle) => info!("Focused window {:?} (id {})", title, handle.as_str()),
            None => warn!("Window {:?} not found or could not be focused", title),
        }
    }

    let client = match TelemetryClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to start telemetry client: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = client.await_first_connection(FIRST_CONNECTION_TIMEOUT) {
        error!("Failed to connect to {}: {}", client.endpoint(), e);
        finish(&client);
        process::exit(1);
    }

    let mut actuator = LogActuator::new();
    run_session(&client, &mut actuator, run_for);

    finish(&client);
    info!("=== TM TELEMETRY CLIENT FINISHED ===");
}

/// Follow the newest frame until `run_for` elapses or the stream is gone for good.
fn run_session(client: &TelemetryClient, actuator: &mut LogActuator, run_for: Option<Duration>) {
    let started = Instant::now();
    let mut received: u64 = 0;
    let mut was_finished = false;

    while run_for.is_none_or(|limit| started.elapsed() < limit) {
        match client.get_latest(POLL_INTERVAL, FRAME_TIMEOUT) {
            Ok(frame) => {
                received += 1;
                if received % LOG_EVERY_N_FRAMES == 1 {
                    log_frame(received, &frame);
                }

                // Rising edge of `finished`: the run is over, restart it.
                if frame.finished && !was_finished {
                    info!("Run finished on lap {} checkpoint {}", frame.lap, frame.checkpoint);
                    if let Err(e) = actuator.reset() {
                        warn!("Actuator reset failed: {}", e);
                    }
                }
                was_finished = frame.finished;

                let mirrored = ControlAction::new(frame.steer, frame.gas, if frame.brake { 1.0 } else { 0.0 });
                if let Err(e) = actuator.send_action(mirrored) {
                    warn!("Actuator rejected action: {}", e);
                }
            }
            Err(StreamError::Timeout(msg)) => {
                warn!("No fresh frame: {} (connected={})", msg, client.is_connected());
                if client.retries_exhausted() {
                    error!("Reconnect attempts exhausted; ending session");
                    break;
                }
            }
            Err(StreamError::Shutdown) => break,
        }
    }

    info!(
        "Session ended after {:?}: {} frames consumed, {} mirrored actions, {} resets",
        started.elapsed(),
        received,
        actuator.actions_sent(),
        actuator.resets()
    );
}

fn log_frame(n: u64, f: &Frame) {
    info!(
        "#{} lap={} cp={} speed={:.2} pos=({:.1}, {:.1}, {:.1}) gear={} steer={:.2} gas={:.2} brake={}",
        n, f.lap, f.checkpoint, f.speed, f.position.x, f.position.y, f.position.z, f.gear, f.steer, f.gas, f.brake
    );
}

fn finish(client: &TelemetryClient) {
    client.shutdown();
    let stats = client.stats();
    info!("Stream stats: {:?}", stats);
    if let Err(e) = export_stats_csv(Path::new(STATS_CSV), &client.endpoint().to_string(), stats) {
        error!("Failed to export session stats: {}", e);
    }
}
