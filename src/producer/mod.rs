// Simulated producer used by tests, benches and the `mock_producer` binary.

pub mod mock;

pub use mock::{MockProducer, ProducerConfig, synthetic_frame};
