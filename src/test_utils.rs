use std::sync::Once;

static INIT: Once = Once::new();

/// Routes log output to stderr, so that emitted instructions show up when a test fails.
pub fn init_logging() {
    INIT.call_once(|| {
        stderrlog::new()
            .module(env!("CARGO_PKG_NAME"))
            .verbosity(4usize)
            .init()
            .ok();
    });
}
