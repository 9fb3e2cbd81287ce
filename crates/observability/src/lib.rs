//! Process-wide tracing setup shared by the binaries.

pub mod subscriber;

pub use subscriber::{LogFormat, LogSettings};

/// Install the default subscriber: JSON lines, `RUST_LOG` filter, `info` fallback.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    subscriber::install(&LogSettings::default());
}
