//! sc - run action scripts and print the resulting IR
//!
//! Usage: sc [OPTIONS] <input> [-o <output>]

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Context as _;
use clap::Parser as ClapParser;
use sc::common::DiagnosticReporter;
use sc::driver::{ScriptConfig, run_script};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "sc")]
#[command(version)]
#[command(about = "Build IR from stack-oriented action scripts", long_about = None)]
struct Args {
    /// Input script
    #[arg(required = true)]
    input: PathBuf,

    /// Write the module text here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump each lowered action (for debugging)
    #[arg(long)]
    dump_actions: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

/// `RUST_LOG` wins over the `--verbose` default
fn init_tracing(verbose: bool) {
    let default = if verbose { "sc=debug,llir=debug" } else { "sc=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(&filename, &source);

    let config = ScriptConfig {
        dump_tokens: args.dump_tokens,
        dump_actions: args.dump_actions,
        verbose: args.verbose,
    };

    if args.verbose {
        eprintln!("Running {}", args.input.display());
    }

    let output = match run_script(&source, &config) {
        Ok(output) => output,
        Err(e) => {
            reporter.report_error(file_id, &e);
            return Err(e.into());
        }
    };

    let mut text = output.module_text;
    for value in &output.last {
        text.push_str(&format!("; last: {}\n", value));
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("cannot write {}", path.display()))?;
            if args.verbose {
                eprintln!("Wrote {}", path.display());
            }
        }
        None => print!("{}", text),
    }
    Ok(())
}
