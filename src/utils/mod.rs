//! Process-level helpers

pub mod signal;

pub use signal::{setup_signal_handlers, shutdown_requested};
