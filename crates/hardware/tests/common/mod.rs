//! Shared test infrastructure.

/// Small configurations and packet helpers.
pub mod builder;

/// Mock peers and a manual scheduler.
pub mod mocks;

use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
