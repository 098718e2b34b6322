//! CLI functionality for the odata tool
//!
//! This module contains all CLI-related functionality including:
//! - Collection queries and single reads over JSON files
//! - Output formatting
//! - Logging setup

pub mod output;
pub mod query;

use tracing_subscriber::EnvFilter;

/// Install a stderr log subscriber
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects `debug` for the
/// odata crates and `warn` is used everywhere else.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,odata=debug,odata_emit=debug,odata_eval=debug,odata_model=debug,odata_parser=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
