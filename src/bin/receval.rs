//! CLI for running the evaluation battery against a dataset file.
//!
//! Usage:
//!   receval run <DATASET> [--top-k 20] [--check NAME ...] [-o report.json]
//!   receval list

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use receval::eval::dataset::EvalDataset;
use receval::eval::{CheckRegistry, EvalConfig, EvalHarness, TOP_K_CHALLENGE};

/// Recommender evaluation harness with fairness diagnostics.
#[derive(Parser)]
#[command(name = "receval", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the check battery against a dataset JSON file.
    Run(RunArgs),
    /// List registered checks with their categories.
    List,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to the dataset JSON file.
    dataset: PathBuf,

    /// Evaluation cutoff (top-K).
    #[arg(long, default_value_t = TOP_K_CHALLENGE)]
    top_k: usize,

    /// Run only the named checks (repeatable). Default: the full battery.
    #[arg(long = "check")]
    checks: Vec<String>,

    /// Write the JSON report here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn dispatch(cli: Cli) -> receval::Result<()> {
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::List => {
            for spec in CheckRegistry::with_builtin_checks().iter() {
                println!("{:<24} {:?}", spec.name, spec.category);
            }
            Ok(())
        }
    }
}

fn run(args: RunArgs) -> receval::Result<()> {
    let dataset = EvalDataset::from_path(&args.dataset)?;
    log::info!(
        "loaded dataset: {} units, {} embeddings",
        dataset.truth().len(),
        dataset.embeddings().len()
    );

    let harness = EvalHarness::with_builtin_checks(EvalConfig { top_k: args.top_k });
    let results = if args.checks.is_empty() {
        harness.run_all(&dataset)
    } else {
        let names: Vec<&str> = args.checks.iter().map(String::as_str).collect();
        harness.run_named(&names, &dataset)?
    };

    if results.num_failed() > 0 {
        log::warn!("{} of {} checks failed", results.num_failed(), results.outcomes.len());
    }

    let report = results.to_json()?;
    match args.output {
        Some(path) => std::fs::write(path, report)?,
        None => println!("{}", report),
    }
    Ok(())
}
