//! Test utilities for buildpack-notify
//!
//! In-memory stand-ins for the two network collaborators so the detection
//! engine can be exercised without a platform or a mail server:
//!
//! - [`FakePlatform`] serves applications, buildpacks, droplets, spaces and
//!   roles from memory, records which lookups were made, and can be told to
//!   fail specific ones.
//! - [`RecordingMailer`] records every message instead of sending it and can
//!   be told to reject specific recipients.
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration tests under `tests/`.

pub mod fakes;
pub mod fixtures;

pub use fakes::{FakePlatform, RecordingMailer, SentEmail};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` if given, otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
