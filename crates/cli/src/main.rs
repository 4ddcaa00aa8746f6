//! Adder - command line interpreter for the adder language

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};

/// Interpreter for the adder language, a small Python-like language
/// with significant indentation and class-based objects.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script to run; reads standard input when absent or '-'
    script: Option<String>,

    /// Enable verbose interpreter logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::TRACE } else { Level::WARN })
        .init();

    let source = match read_source(args.script.as_deref()) {
        Ok(source) => source,
        Err(err) => {
            error!("failed to read script: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!("running {}", args.script.as_deref().unwrap_or("<stdin>"));

    let stdout = io::stdout();
    let mut output = stdout.lock();
    match adder_interpreter::run_program(&source, &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn read_source(script: Option<&str>) -> io::Result<String> {
    match script {
        Some(path) if path != "-" => fs::read_to_string(path),
        _ => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}
