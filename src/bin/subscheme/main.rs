//! Command-line driver: runs `.scm` files in one session, or an interactive
//! REPL when no files are given.

mod repl;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use subscheme::{Interpreter, SOURCE_FILE_EXTENSION};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use repl::ReplConfig;

/// Substitution-model Scheme interpreter.
#[derive(Parser)]
#[command(name = "subscheme", version)]
struct Cli {
    /// Source files to run in order, sharing one session. Starts the REPL when empty.
    files: Vec<PathBuf>,

    /// REPL history file.
    #[arg(long, default_value = ".subscheme_history")]
    history: PathBuf,

    /// Do not load or save REPL history.
    #[arg(long)]
    no_history: bool,

    /// Use vi key bindings in the REPL.
    #[arg(long)]
    vi: bool,

    /// Raise the log level (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl From<&Cli> for ReplConfig {
    fn from(cli: &Cli) -> Self {
        ReplConfig {
            history: (!cli.no_history).then(|| cli.history.clone()),
            vi_mode: cli.vi,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.files.is_empty() {
        return match repl::run(ReplConfig::from(&cli)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        };
    }
    run_files(&cli.files)
}

// RUST_LOG wins over -v. Logs go to stderr so printed results stay clean.
fn init_tracing(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_files(files: &[PathBuf]) -> ExitCode {
    let mut interpreter = Interpreter::new();
    for path in files {
        if let Err(message) = run_file(&mut interpreter, path) {
            if let Some(message) = message {
                eprintln!("error: {message}");
            }
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

// `Err(None)` means a diagnostic was already printed.
fn run_file(interpreter: &mut Interpreter, path: &Path) -> Result<(), Option<String>> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(SOURCE_FILE_EXTENSION) {
        return Err(Some(format!(
            "{} is not a .{} file",
            path.display(),
            SOURCE_FILE_EXTENSION
        )));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| Some(format!("cannot read {}: {e}", path.display())))?;
    info!(path = %path.display(), bytes = text.len(), "running file");

    let name = path.display().to_string();
    match interpreter.interpret(&text) {
        Ok(values) => {
            debug!(results = values.len(), "file finished");
            for value in values {
                println!("{value}");
            }
            Ok(())
        }
        Err(err) => {
            if let Err(io_err) = err.eprint(&name, &text) {
                eprintln!("error: {err} ({io_err})");
            }
            Err(None)
        }
    }
}
