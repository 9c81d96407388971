use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::address::DEFAULT_PORT;

/// Environment variable consulted for the server port when `--port` is absent.
pub const PORT_ENV: &str = "RFSHUTTLE_DEFAULT_PORT";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log every operation, not just summaries.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append log lines to this file instead of printing them on stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Zip a directory and print it as transport text.
    #[command(alias = "p")]
    Pack {
        /// Directory to bundle. Archive members are rooted at its name.
        #[arg(required = true)]
        dir: PathBuf,

        /// Write the transport text here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Unpack transport text produced by `pack`.
    #[command(alias = "u")]
    Unpack {
        /// Where the bundled directory should end up; it is unpacked into this path's parent.
        #[arg(required = true)]
        dest: PathBuf,

        /// Read the transport text from this file instead of stdin.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the URL the runner would dial for a server address.
    Normalize {
        /// `host`, `host:port`, `scheme://host` or `scheme://host:port`.
        #[arg(required = true)]
        address: String,

        /// Port appended when the address has none. Defaults to RFSHUTTLE_DEFAULT_PORT, then 8270.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the ancestor path of the last suite in a root-first chain of names.
    SuitePath {
        /// Suite names from the root down to the suite of interest.
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Print a text file decoded with the given encoding.
    ReadText {
        #[arg(required = true)]
        file: PathBuf,

        /// utf-8, utf-16le, utf-16be or latin-1.
        #[arg(long, default_value = "utf-8")]
        encoding: String,
    },

    /// Write stdin to a text file in the given encoding.
    WriteText {
        #[arg(required = true)]
        file: PathBuf,

        /// utf-8, utf-16le, utf-16be or latin-1.
        #[arg(long, default_value = "utf-8")]
        encoding: String,
    },
}

/// Resolves the default server port.
///
/// Priority:
/// 1. `--port` command-line argument.
/// 2. `RFSHUTTLE_DEFAULT_PORT` environment variable.
/// 3. [`DEFAULT_PORT`].
pub fn default_port_from_opt_or_env(port_opt: Option<u16>) -> Result<u16, std::io::Error> {
    if let Some(port) = port_opt {
        return Ok(port);
    }
    match std::env::var(PORT_ENV) {
        Ok(raw) => raw.trim().parse::<u16>().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{PORT_ENV}='{raw}': {e}"))
        }),
        Err(_) => Ok(DEFAULT_PORT),
    }
}

/// Parses command-line arguments using `clap`; exits on `--help` or bad usage.
pub fn run() -> Result<Args, Box<dyn std::error::Error>> {
    Ok(Args::parse())
}
