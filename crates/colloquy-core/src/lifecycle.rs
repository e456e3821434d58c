use tracing_subscriber::EnvFilter;

/// Initialize tracing with env filter support.
///
/// Set `RUST_LOG=debug` for verbose output, defaults to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();
}

pub fn log_startup(bind_addr: &str) {
    tracing::info!("Colloquy starting up on {bind_addr}");
}

pub fn log_shutdown() {
    tracing::info!("Colloquy shutting down");
}
