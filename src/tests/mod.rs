//! End-to-end scenario tests exercising [`crate::Engine`] as a whole,
//! rather than a single module in isolation.

mod compression_tests;

/// Installs a `tracing` subscriber the first time it's called so that
/// `RUST_LOG=shelfdb=trace cargo test -- --nocapture` surfaces the crate's
/// own logging during a scenario run. The library itself never does this —
/// only a harness with an opinion about where logs should go should.
fn init_test_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shelfdb=debug"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}
