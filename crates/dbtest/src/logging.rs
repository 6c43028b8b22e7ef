//! Tracing setup for test binaries.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call does anything. The
/// filter comes from `RUST_LOG` and defaults to `warn`, so cleanup failures
/// from dropped guards still show up.
///
/// ```
/// dbtest::logging::init_test_logging();
/// dbtest::logging::init_test_logging();
/// ```
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
