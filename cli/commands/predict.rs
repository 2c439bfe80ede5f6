use anyhow::{bail, Context, Result};
use clap::Args;

use rmsnet::data::imaging::grayscale_batch;
use rmsnet::network::InputType;
use rmsnet::Trainer;

use super::load_model;

#[derive(Args)]
pub struct PredictArgs {
    /// Saved model file
    #[arg(long)]
    pub model: String,

    /// Image to classify (PNG, JPEG, BMP or GIF)
    pub image: String,
}

pub fn run(args: PredictArgs) -> Result<()> {
    let trainer = load_model(&args.model)?;
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("failed to read {}", args.image))?;
    let class = classify_image(&trainer, &bytes)?;
    let label = trainer
        .metadata()
        .map_or_else(|| class.to_string(), |m| m.label_for(class));
    println!("{}", label);
    Ok(())
}

/// Resizes the image to the model's input grid and returns the winning class.
pub fn classify_image(trainer: &Trainer, bytes: &[u8]) -> Result<usize> {
    let (width, height) = image_shape(trainer)?;
    let input = grayscale_batch(bytes, width, height)?;
    let classes = trainer.predict(&input)?;
    match classes.first() {
        Some(&class) => Ok(class),
        None => bail!("model produced no prediction"),
    }
}

fn image_shape(trainer: &Trainer) -> Result<(u32, u32)> {
    let declared = trainer.metadata().and_then(|m| m.input_type.clone());
    match declared.unwrap_or_else(|| InputType::infer(trainer.network().input_dim())) {
        InputType::ImageGrayscale { width, height } => Ok((width, height)),
        InputType::Numeric => bail!(
            "model takes {} numeric inputs, not an image",
            trainer.network().input_dim()
        ),
    }
}
