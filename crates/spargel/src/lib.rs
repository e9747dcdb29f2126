//! Spargel compiler driver: read a source file, parse it and report
//! diagnostics.

mod compiler;

use tracing_subscriber::{EnvFilter, fmt};

pub use compiler::{CompileError, CompileOptions, CompileOutput, compile_file, compile_source};

/// Install a stderr subscriber filtered by `RUST_LOG`, `warn` by default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
