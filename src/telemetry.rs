//! Logging setup for the `rfshuttle` binary.
//!
//! The library only emits `tracing` events; whoever embeds it decides where they
//! go. The CLI installs a `fmt` subscriber here, either on stderr or appending to
//! a log file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{IoResultExt, Result};

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "rfshuttle=debug"
    } else {
        "rfshuttle=info"
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`.
///
/// Calling this twice is harmless; the second subscriber is ignored.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path).at(path)?;
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
    Ok(())
}
