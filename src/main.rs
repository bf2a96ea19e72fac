//! scorecast - CLI entry point
//!
//! Loads a CSV dataset, runs the training pipeline, and prints the
//! report. All heavy lifting lives in the library.

use clap::Parser;
use scorecast::optimizer::SamplerKind;
use scorecast::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "scorecast", about = "Train a match-score regression model")]
struct Cli {
    /// Path to the CSV dataset
    #[arg(long)]
    data: String,

    /// Name of the home-score target column
    #[arg(long, default_value = "result.home_team_score")]
    home_target: String,

    /// Name of the away-score target column
    #[arg(long, default_value = "result.away_team_score")]
    away_target: String,

    /// Model family: boosted | network
    #[arg(long, default_value = "boosted")]
    model: String,

    /// Hyperparameter search trials
    #[arg(long, default_value_t = 100)]
    trials: usize,

    /// Wall-clock budget for the search, in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Use purely random proposals instead of TPE
    #[arg(long)]
    random_search: bool,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    eval_fraction: f64,

    /// Seed for partitioning, sampling, and training
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Early-stopping patience in rounds
    #[arg(long, default_value_t = 50)]
    patience: usize,

    /// Hard cap on training rounds per trial
    #[arg(long, default_value_t = 1000)]
    max_rounds: usize,

    /// Write the full report (model included) as JSON
    #[arg(long)]
    output: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scorecast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let model: ModelKind = cli.model.parse()?;
    let mut search = SearchConfig::default()
        .with_n_trials(cli.trials)
        .with_seed(cli.seed);
    if cli.random_search {
        search = search.with_sampler(SamplerKind::Random);
    }
    if let Some(secs) = cli.timeout {
        search = search.with_timeout(secs);
    }

    let config = PipelineConfig {
        target_columns: vec![cli.home_target, cli.away_target],
        eval_fraction: cli.eval_fraction,
        seed: cli.seed,
        model,
        max_rounds: cli.max_rounds,
        patience: cli.patience,
        search,
        search_space: None,
    };

    let df = load_csv(&cli.data)?;
    let report = run_training(&df, &config)?;

    println!("{}", scorecast::report::render(&report));

    if let Some(path) = cli.output {
        scorecast::report::save_json(&report, &path)?;
        println!("report written to {}", path);
    }

    Ok(())
}
