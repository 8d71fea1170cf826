use std::{path::Path, process::ExitCode};

use clap::Parser;
use r2lang::{get_result, run_file};
use tracing_subscriber::EnvFilter;

/// r2 runs scripts written in the R2 language: a small dynamically typed
/// language with closures, classes and lightweight concurrent tasks.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tells r2 to treat CONTENTS as the path of a script file.
    #[arg(short, long)]
    file: bool,

    /// Logs imports and task activity to stderr. `RUST_LOG` takes
    /// precedence when set.
    #[arg(short, long)]
    verbose: bool,

    contents: String,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_writer(std::io::stderr)
                             .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = if args.file {
        let path = Path::new(&args.contents);
        if !path.is_file() {
            eprintln!("Failed to read the input file '{}'. Perhaps this file does not exist?",
                      args.contents);
            return ExitCode::FAILURE;
        }
        run_file(path)
    } else {
        get_result(&args.contents)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        },
    }
}
