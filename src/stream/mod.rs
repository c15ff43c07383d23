// Telemetry stream: connection state machine, reassembly, decoding
// and the single-slot mailbox read by consumers.

pub mod client;
pub mod connection;
pub mod frame;
pub mod liveness;
pub mod mailbox;
pub mod reassembler;
