//! rmsnet command line
//!
//! ```text
//! rmsnet train    --train-images train-images-idx3-ubyte --train-labels train-labels-idx1-ubyte
//! rmsnet evaluate --model trained_models/mnist.json --images t10k-images-idx3-ubyte --labels t10k-labels-idx1-ubyte
//! rmsnet predict  --model trained_models/mnist.json digit.png
//! rmsnet serve    --model trained_models/mnist.json --addr 127.0.0.1:7878
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{evaluate::EvaluateArgs, predict::PredictArgs, serve::ServeArgs, train::TrainArgs};

#[derive(Parser)]
#[command(name = "rmsnet", version, about = "Fully connected classifier trained with RMSProp")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a classifier on an IDX image/label pair
    Train(TrainArgs),
    /// Report the accuracy of a saved model on an IDX pair
    Evaluate(EvaluateArgs),
    /// Classify a single image file
    Predict(PredictArgs),
    /// Serve predictions over HTTP
    Serve(ServeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Train(args) => commands::train::run(args),
        Commands::Evaluate(args) => commands::evaluate::run(args),
        Commands::Predict(args) => commands::predict::run(args),
        Commands::Serve(args) => commands::serve::run(args),
    }
}
