//! Test log initialization

/// Install a test-friendly tracing subscriber once per process.
///
/// Respects `RUST_LOG`; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
