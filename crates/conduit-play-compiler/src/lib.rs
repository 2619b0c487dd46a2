//! Conduit playground compiler: orchestrates the full pipeline.
//!
//! ```text
//! source → Lexer → Parser → CodeGenerator → Sandbox → CompileResult
//! ```

mod compiler;
mod error;
mod options;

use std::sync::Once;

pub use compiler::{source_hash, Clock, Compiler, SystemClock};
pub use error::CompileError;
pub use options::{CompileOptions, CompileResult, DEFAULT_MEMORY_LIMIT};

/// Compile and run `source` with the given options.
pub fn compile(source: &str, options: CompileOptions) -> CompileResult {
    Compiler::new(options).compile(source)
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with
/// `RUST_LOG=conduit_play_compiler=debug,conduit_play_sandbox=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // Another subscriber may already be installed by the embedder.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
