//! Logging setup
//!
//! Everything in the crate logs through `tracing`; the host (or a test
//! binary) calls `init_logging` once to install a subscriber.

pub mod logging;

pub use logging::{init_logging, init_logging_default, LogConfig, LogGuard};
