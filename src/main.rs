use std::{io::{self, BufRead, Write}, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use snek::{EvaluationConfig, EvaluationContext};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const QUIT_SENTINEL: &str = "QUIT";

#[derive(Parser, Debug)]
#[command(name = "snek")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for the snek S-expression language", long_about = None)]
struct Args {
    /// Programs to run in one shared session. Starts a REPL when empty.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Deepest evaluation nesting allowed before an evaluation error.
    #[arg(long = "max-depth", value_name = "N", default_value_t = 10_000)]
    max_depth: usize,

    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("snek=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
        .with(filter)
        .init();
}

fn run_files(context: &mut EvaluationContext, files: &[PathBuf]) -> anyhow::Result<()> {
    for path in files {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        for value in context.evaluate_program(&source)
            .with_context(|| format!("while running {}", path.display()))?
        {
            println!("{}", value);
        }
    }
    Ok(())
}

fn repl(context: &mut EvaluationContext) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        write!(stdout, "in: ")?;
        stdout.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let line = line.trim();
        if line == QUIT_SENTINEL { break; }
        if line.is_empty() { continue; }

        match context.evaluate_str(line) {
            Ok(value) => println!("out> {}", value),
            Err(err) => println!("error: {}", err),
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut context = EvaluationContext::with_config(EvaluationConfig {
        max_depth: Some(args.max_depth),
    });

    if args.files.is_empty() {
        repl(&mut context)
    } else {
        run_files(&mut context, &args.files)
    }
}
