// Ambient support: configuration, errors, counters and CSV export.

pub mod config;
pub mod error;
pub mod export;
pub mod stats;
