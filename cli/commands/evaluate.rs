use anyhow::Result;
use clap::Args;

use rmsnet::data::load_idx_pair;

use super::load_model;

#[derive(Args)]
pub struct EvaluateArgs {
    /// Saved model file
    #[arg(long)]
    pub model: String,

    /// IDX3 image file
    #[arg(long)]
    pub images: String,

    /// IDX1 label file
    #[arg(long)]
    pub labels: String,
}

pub fn run(args: EvaluateArgs) -> Result<()> {
    let trainer = load_model(&args.model)?;
    let data = load_idx_pair(&args.images, &args.labels)?;
    let accuracy = trainer.accuracy(&data.inputs, &data.labels)?;
    println!("Testing on {} samples", data.len());
    println!("test acc: {:.4}", accuracy * 100.0);
    Ok(())
}
