//! # tm_telemetry
//!
//! Resilient streaming client for a fixed-format binary telemetry feed
//! (19 little-endian `f32` per record, 76 bytes, over TCP).
//!
//! ## Key Architecture
//! - **Connection thread:** connect → read → reassemble → decode → publish, with
//!   fixed-delay reconnects and a heartbeat probe on idle links.
//! - **Mailbox:** single slot, latest frame wins; consumers skip what they miss.
//! - **Consumers:** any number of threads calling `get_latest` / `is_connected`.
//!
//! ## Concurrency
//! - One mutex + condvar for link state, one for the mailbox.
//! - Every blocking call is deadline-bounded; shutdown is cooperative and terminal.
//!
//! ```no_run
//! use std::time::Duration;
//! use tm_telemetry::{ClientConfig, TelemetryClient};
//!
//! let client = TelemetryClient::new(ClientConfig::new("localhost", 9000))?;
//! client.await_first_connection(Duration::from_secs(10))?;
//! let frame = client.get_latest(Duration::from_millis(10), Duration::from_secs(10))?;
//! println!("speed={} gear={}", frame.speed, frame.gear);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod control;
pub mod producer;
pub mod stream;
pub mod utils;

pub use stream::{
    client::TelemetryClient,
    frame::{FRAME_LEN, Frame, Vec3},
    liveness::ConnectionState,
};
pub use utils::{
    config::{ClientConfig, Endpoint, ReconnectPolicy},
    error::StreamError,
    stats::StatsSnapshot,
};
