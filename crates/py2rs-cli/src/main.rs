//! Command-line driver for the py2rs transpiler. Grounded on `compiler.py`'s
//! `__main__` block (a single file in, Target source out), with a
//! `transpile`/`check` subcommand split trimmed to the two operations this
//! pipeline actually performs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use py2rs_core::{Pipeline, PipelineOptions};

#[derive(Parser)]
#[command(name = "py2rs", about = "Translate a restricted Python subset into Rust")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Resolve `module.func(...)` calls against sibling files (currently a
    /// no-op pass-through; see `py2rs_core::PipelineOptions`).
    #[arg(long, global = true)]
    cross_module: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a Source file and print (or write) the Target source.
    Transpile {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Translate a Source file but only report diagnostics; nothing is
    /// written. Exits non-zero if translation fails.
    Check { input: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let pipeline = Pipeline::new(PipelineOptions {
        cross_module_resolution: cli.cross_module,
    });

    let result = match cli.command {
        Commands::Transpile { input, output } => run_transpile(&pipeline, &input, output.as_deref()),
        Commands::Check { input } => run_check(&pipeline, &input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err:#}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run_transpile(pipeline: &Pipeline, input: &std::path::Path, output: Option<&std::path::Path>) -> anyhow::Result<()> {
    let result = pipeline.translate_file(input)?;
    if !result.diagnostics.is_empty() {
        eprint!("{}", result.diagnostics_report());
    }
    match output {
        Some(path) => std::fs::write(path, result.code)?,
        None => print!("{}", result.code),
    }
    Ok(())
}

fn run_check(pipeline: &Pipeline, input: &std::path::Path) -> anyhow::Result<()> {
    let result = pipeline.translate_file(input)?;
    if result.diagnostics.is_empty() {
        println!("{}", "ok".green());
    } else {
        eprint!("{}", result.diagnostics_report());
    }
    Ok(())
}
