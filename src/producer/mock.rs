//! mock.rs
//! Simulated telemetry producer: serves synthetic frames over TCP at a fixed period.
//! - Periodic release paced by SpinSleeper (same scheduling as a real plugin tick)
//! - One client at a time; a dropped client sends the producer back to accept()
//! - Stop flag checked every tick and every accept poll

use log::{debug, info, warn};
use rand::random_range;
use socket2::{Domain, SockAddr, Socket, Type};
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::{
    io::{self, ErrorKind, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::stream::frame::{Frame, Vec3};

const ACCEPT_POLL_MS: u64 = 10;
const SPIN_NATIVE_ACCURACY_NS: u32 = 100_000;

#[derive(Debug, Clone, Copy)]
pub struct ProducerConfig {
    /// Interval between frames.
    pub period: Duration,
    /// Add small random noise to the slip channels.
    pub noise: bool,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(10),
            noise: false,
        }
    }
}

pub struct MockProducer {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    frames_sent: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl MockProducer {
    /// Bind `addr` (port 0 picks a free port) and start serving.
    pub fn start(addr: SocketAddr, config: ProducerConfig) -> io::Result<Self> {
        let listener = bind_listener(addr)?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let running = Arc::new(AtomicBool::new(true));
        let frames_sent = Arc::new(AtomicU64::new(0));

        let flag = running.clone();
        let sent = frames_sent.clone();
        let handle = thread::Builder::new()
            .name("tm-mock-producer".to_string())
            .spawn(move || serve(listener, config, flag, sent))?;

        info!("[Producer] Serving synthetic telemetry on {}", addr);
        Ok(Self {
            addr,
            running,
            frames_sent,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    /// Stop serving and close the listener and any connected client.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for MockProducer {
    fn drop(&mut self) {
        self.stop();
    }
}

// Reuse the address so a restarted producer can rebind the same port immediately.
fn bind_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&SockAddr::from(addr))?;
    socket.listen(16)?;
    Ok(socket.into())
}

fn serve(
    listener: TcpListener,
    config: ProducerConfig,
    running: Arc<AtomicBool>,
    frames_sent: Arc<AtomicU64>,
) {
    let mut seq: u64 = 0;

    while running.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, peer)) => {
                info!("[Producer] Client connected: {}", peer);
                match stream_to_client(stream, &config, &running, &frames_sent, &mut seq) {
                    Ok(()) => debug!("[Producer] Stopped streaming to {}", peer),
                    Err(e) => info!("[Producer] Client {} dropped: {}", peer, e),
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(ACCEPT_POLL_MS));
            }
            Err(e) => {
                warn!("[Producer] Accept error: {}", e);
                thread::sleep(Duration::from_millis(ACCEPT_POLL_MS));
            }
        }
    }

    debug!("[Producer] stopped after {} frames", frames_sent.load(Ordering::Relaxed));
}

fn stream_to_client(
    mut stream: TcpStream,
    config: &ProducerConfig,
    running: &AtomicBool,
    frames_sent: &AtomicU64,
    seq: &mut u64,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    stream.set_write_timeout(Some(Duration::from_secs(1)))?;

    let sleeper = SpinSleeper::new(SPIN_NATIVE_ACCURACY_NS).with_spin_strategy(SpinStrategy::YieldThread);
    let mut next_release = Instant::now();

    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        if now < next_release {
            sleeper.sleep(next_release - now);
        }

        let mut frame = synthetic_frame(*seq);
        if config.noise {
            frame.fl_slip += random_range(-0.01..0.01);
            frame.fr_slip += random_range(-0.01..0.01);
        }

        stream.write_all(&frame.encode())?;
        frames_sent.fetch_add(1, Ordering::Relaxed);

        *seq += 1;
        next_release += config.period;
    }

    let _ = stream.shutdown(std::net::Shutdown::Both);
    Ok(())
}

/// Deterministic frame for sequence number `seq`: a car lapping a straight-ish track.
pub fn synthetic_frame(seq: u64) -> Frame {
    let t = seq as f32 * 0.01;
    let steer = (t * 0.7).sin();
    let speed = 120.0 + 60.0 * (t * 0.2).sin();

    Frame {
        checkpoint: ((seq / 500) % 20) as i32,
        lap: (seq / 10_000) as i32,
        speed,
        position: Vec3 {
            x: 500.0 + 200.0 * (t * 0.05).cos(),
            y: 9.0,
            z: 500.0 + 200.0 * (t * 0.05).sin(),
        },
        steer,
        gas: if steer.abs() < 0.8 { 1.0 } else { 0.4 },
        brake: steer.abs() > 0.95,
        finished: seq % 10_000 == 9_999,
        acceleration: 12.0 * (t * 0.2).cos(),
        jerk: -2.4 * (t * 0.2).sin(),
        aim_yaw: steer * 0.5,
        aim_pitch: 0.0,
        fl_steer_angle: steer * 0.35,
        fr_steer_angle: steer * 0.33,
        fl_slip: 0.02 * steer.abs(),
        fr_slip: 0.02 * steer.abs(),
        gear: 1 + ((speed / 50.0) as i32).min(4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::frame::FRAME_LEN;
    use std::io::Read;

    #[test]
    fn test_synthetic_frames_deterministic() {
        assert_eq!(synthetic_frame(1234), synthetic_frame(1234));
        assert_ne!(synthetic_frame(1), synthetic_frame(2));
        assert!(synthetic_frame(9_999).finished);
        assert!(!synthetic_frame(10_000).finished);
        assert_eq!(synthetic_frame(10_000).lap, 1);
    }

    #[test]
    fn test_producer_streams_frames() {
        let mut producer = MockProducer::start(
            "127.0.0.1:0".parse().unwrap(),
            ProducerConfig {
                period: Duration::from_millis(2),
                noise: false,
            },
        )
        .unwrap();

        let mut client = TcpStream::connect(producer.local_addr()).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

        let mut buf = [0u8; FRAME_LEN * 3];
        client.read_exact(&mut buf).unwrap();

        let frames: Vec<Frame> = buf
            .chunks_exact(FRAME_LEN)
            .map(|c| Frame::decode(c).unwrap())
            .collect();
        assert_eq!(frames[0], synthetic_frame(0));
        assert_eq!(frames[2], synthetic_frame(2));

        producer.stop();
        assert!(producer.frames_sent() >= 3);
    }
}
