//! Dispatches parsed CLI commands onto the library operations.

use crate::ancestry::SuiteTree;
use crate::cli::{self, Args, Commands};
use crate::error::IoResultExt;
use crate::fsx as fs;
use crate::textio::{self, TextEncoding};
use crate::{address, bundle, telemetry};
use std::error::Error;
use std::io::{self, Read, Write};

/// Public entry for running the CLI.
pub fn run_cli_app() -> Result<(), Box<dyn Error>> {
    let args = cli::run()?;
    telemetry::init(args.verbose, args.log_file.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&args, &mut io::stdin().lock(), &mut out)
}

/// Runs one command, reading payloads from `input` and printing results to `out`.
pub fn execute(args: &Args, input: &mut dyn Read, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    match &args.command {
        Commands::Pack { dir, output } => {
            let text = bundle::read_binary_archive(dir)?;
            match output {
                Some(path) => fs::write(path, text.as_bytes()).at(path)?,
                None => writeln!(out, "{text}")?,
            }
        }
        Commands::Unpack { dest, input: from } => {
            let text = match from {
                Some(path) => fs::read_to_string(path).at(path)?,
                None => read_all(input)?,
            };
            bundle::write_binary_archive(dest, &text)?;
        }
        Commands::Normalize { address, port } => {
            let port = cli::default_port_from_opt_or_env(*port)?;
            writeln!(out, "{}", address::normalize_address(address, port))?;
        }
        Commands::SuitePath { names } => {
            let mut tree = SuiteTree::new();
            let node = tree.chain(names.as_slice()).ok_or("at least one suite name is required")?;
            writeln!(out, "{}", tree.ancestor_path(node)?)?;
        }
        Commands::ReadText { file, encoding } => {
            let encoding: TextEncoding = encoding.parse()?;
            write!(out, "{}", textio::read_text(file, encoding)?)?;
        }
        Commands::WriteText { file, encoding } => {
            let encoding: TextEncoding = encoding.parse()?;
            let content = read_all(input)?;
            textio::write_text(file, &content, encoding)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn read_all(input: &mut dyn Read) -> io::Result<String> {
    let mut buf = String::new();
    input.read_to_string(&mut buf)?;
    Ok(buf)
}
