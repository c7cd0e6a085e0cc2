//! Shared fixtures for the `assetmirror` integration tests.

pub mod builders;
pub mod converters;
pub mod fixtures;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use assetmirror::logging::{filter_directives, LOG_ENV};
use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Honours `ASSETMIRROR_LOG` the same way the binary does, so
/// `ASSETMIRROR_LOG=assetmirror=debug cargo test -- --nocapture` shows the
/// pipeline's logs for a failing test.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env = std::env::var(LOG_ENV).ok();
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directives(None, env.as_deref())))
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("test step timed out after {TEST_TIMEOUT:?}"),
    }
}
