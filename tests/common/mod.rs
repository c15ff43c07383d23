//! Shared helpers for the loopback integration tests.
#![allow(dead_code)]

use std::{
    net::TcpListener,
    thread,
    time::{Duration, Instant},
};

use tm_telemetry::{ClientConfig, Frame, ReconnectPolicy};

/// A port that was free a moment ago and now has no listener.
pub fn closed_port() -> u16 {
    let l = TcpListener::bind("127.0.0.1:0").unwrap();
    l.local_addr().unwrap().port()
}

/// Short timings so failures surface in milliseconds rather than seconds.
pub fn fast_config(port: u16, reconnect: ReconnectPolicy) -> ClientConfig {
    ClientConfig::new("127.0.0.1", port)
        .with_reconnect(reconnect)
        .with_heartbeat_interval(Duration::from_millis(50))
        .with_connect_timeout(Duration::from_millis(200))
        .with_shutdown_timeout(Duration::from_secs(2))
}

/// Poll `cond` every few milliseconds until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Frame whose every integer-like field is derived from `i`, so its origin is recognisable.
pub fn numbered_frame(i: i32) -> Frame {
    Frame {
        checkpoint: i % 7,
        lap: i,
        speed: i as f32 * 1.5,
        steer: (i % 3) as f32 - 1.0,
        gas: 0.5,
        brake: i % 4 == 0,
        finished: i % 2 == 0,
        gear: 1 + i % 5,
        ..Frame::default()
    }
}
