use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs the global tracing subscriber, writing to stderr so stdout stays
/// reserved for the wizard snapshot. `RUST_LOG` overrides the default level.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("checkout_wizard=info"));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}
