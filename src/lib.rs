pub mod analyzer;
pub mod commands;
pub mod config;
pub mod error;
pub mod refinement;
pub mod repl;
pub mod view;

pub use analyzer::{AnalysisResult, RecognitionClient, SearchType};
pub use commands::AppState;
pub use config::GuesserConfig;
pub use error::GuesserError;
pub use refinement::{RefinementEngine, RollbackMode};

/// Install the global subscriber. Logs go to stderr so they never mix with
/// rendered results on stdout.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
