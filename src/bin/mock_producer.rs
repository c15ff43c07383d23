//! # Mock Telemetry Producer
//!
//! Serves synthetic 76-byte frames over TCP so the client can be exercised
//! without the game running.
//!
//! ## Environment
//! - `TM_PRODUCER_ADDR`: listen address (default `127.0.0.1:9000`).
//! - `TM_PRODUCER_HZ`: frames per second (default 100).
//! - `TM_RUN_SECS`: how long to serve before exiting (default 30).

use std::{env, net::SocketAddr, process, str::FromStr, thread, time::Duration};

use log::{error, info};

use tm_telemetry::producer::{MockProducer, ProducerConfig};

const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 9000);
const DEFAULT_HZ: u32 = 100;
const DEFAULT_RUN_SECS: u64 = 30;

fn env_or<T: FromStr>(key: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(e) => {
                error!("Invalid {}={:?}: {}", key, raw, e);
                process::exit(2);
            }
        },
        Err(_) => default,
    }
}

fn main() {
    env_logger::init();

    let addr: SocketAddr = env_or("TM_PRODUCER_ADDR", SocketAddr::from(DEFAULT_ADDR));
    let hz = env_or("TM_PRODUCER_HZ", DEFAULT_HZ).max(1);
    let run_secs = env_or("TM_RUN_SECS", DEFAULT_RUN_SECS);

    let config = ProducerConfig {
        period: Duration::from_secs(1) / hz,
        noise: true,
    };

    let mut producer = match MockProducer::start(addr, config) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            process::exit(1);
        }
    };

    info!(
        "=== MOCK PRODUCER on {} at {} Hz for {}s ===",
        producer.local_addr(),
        hz,
        run_secs
    );
    thread::sleep(Duration::from_secs(run_secs));

    producer.stop();
    info!("=== MOCK PRODUCER FINISHED: {} frames sent ===", producer.frames_sent());
}
