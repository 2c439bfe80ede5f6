use anyhow::{bail, Context, Result};
use clap::Args;
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use rmsnet::data::load_idx_pair;
use rmsnet::network::{InputType, ModelMetadata, NetworkSpec};
use rmsnet::optim::Optimizer;
use rmsnet::{train_loop_with, EpochStats, LoopConfig, TrainConfig, Trainer};

use super::load_model;

#[derive(Args)]
pub struct TrainArgs {
    /// IDX3 image file with the training images
    #[arg(long)]
    pub train_images: String,

    /// IDX1 label file matching --train-images
    #[arg(long)]
    pub train_labels: String,

    /// Optional IDX3 test images, scored once after training
    #[arg(long, requires = "test_labels")]
    pub test_images: Option<String>,

    #[arg(long, requires = "test_images")]
    pub test_labels: Option<String>,

    /// Hidden layer widths
    #[arg(long, value_delimiter = ',', default_value = "100,200,200")]
    pub hidden: Vec<usize>,

    /// Number of classes (defaults to 1 + the largest training label)
    #[arg(long)]
    pub classes: Option<usize>,

    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Learning rate
    #[arg(long)]
    pub lr: Option<f64>,

    /// Update rule: rmsprop or gd
    #[arg(long)]
    pub optimizer: Option<String>,

    /// RMSProp decay of the squared-gradient average
    #[arg(long)]
    pub decay: Option<f64>,

    /// RMSProp stabilizer
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// L2 weight penalty strength
    #[arg(long)]
    pub l2: Option<f64>,

    /// Rows held out from the end of the training set for validation
    #[arg(long, default_value_t = 10_000)]
    pub val_size: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Where the trained model is written
    #[arg(long, default_value = "trained_models/rmsnet.json")]
    pub model: String,

    /// JSON file with `TrainConfig` fields; flags given here override it
    #[arg(long)]
    pub config: Option<String>,

    /// Continue training the model already stored at --model
    #[arg(long)]
    pub resume: bool,
}

impl TrainArgs {
    fn train_config(&self) -> Result<TrainConfig> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::load_json(path)
                .with_context(|| format!("failed to read training config {}", path))?,
            None => TrainConfig::default(),
        };
        if let Some(lr) = self.lr {
            config.learning_rate = lr;
        }
        if let Some(l2) = self.l2 {
            config.l2 = l2;
        }
        if let Some(name) = &self.optimizer {
            config.optimizer = Optimizer::from_name(name)?;
        }
        if let Optimizer::RmsProp { decay, epsilon } = &mut config.optimizer {
            if let Some(d) = self.decay {
                *decay = d;
            }
            if let Some(e) = self.epsilon {
                *epsilon = e;
            }
        } else if self.decay.is_some() || self.epsilon.is_some() {
            warn!("--decay and --epsilon only apply to rmsprop; ignoring them");
        }
        config.validate()?;
        Ok(config)
    }

    fn loop_config(&self) -> LoopConfig {
        let defaults = LoopConfig::default();
        LoopConfig::new(
            self.epochs.unwrap_or(defaults.epochs),
            self.batch_size.unwrap_or(defaults.batch_size),
        )
    }
}

pub fn run(args: TrainArgs) -> Result<()> {
    let config = args.train_config()?;
    let schedule = args.loop_config();

    let mut train = load_idx_pair(&args.train_images, &args.train_labels)?;
    let val = if args.val_size > 0 {
        Some(train.split_off_last(args.val_size)?)
    } else {
        None
    };
    let num_classes = args.classes.unwrap_or_else(|| train.class_count());
    if num_classes < 2 {
        bail!("need at least two classes, found {}", num_classes);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut trainer = if args.resume {
        let trainer = load_model(&args.model)?;
        if trainer.network().input_dim() != train.feature_count() {
            bail!(
                "model at {} expects {} inputs but the data has {}",
                args.model,
                trainer.network().input_dim(),
                train.feature_count()
            );
        }
        info!("resuming from {}", args.model);
        trainer
    } else {
        let mut dims = Vec::with_capacity(args.hidden.len() + 2);
        dims.push(train.feature_count());
        dims.extend_from_slice(&args.hidden);
        dims.push(num_classes);
        info!("building network {:?}", dims);
        Trainer::new(&NetworkSpec::classifier(&dims), &mut rng)?
    };
    if trainer.metadata().is_none() {
        trainer.set_metadata(ModelMetadata {
            description: Some(format!("trained on {}", args.train_images)),
            input_type: Some(InputType::infer(train.feature_count())),
            output_labels: Some((0..num_classes).map(|c| c.to_string()).collect()),
        });
    }

    let outcome = train_loop_with(
        &mut trainer,
        &train,
        val.as_ref(),
        &config,
        &schedule,
        &mut rng,
        print_epoch,
    );
    if trainer.is_diverged() {
        warn!("training diverged; {} was left untouched", args.model);
    } else {
        // Keep what was learned even when the run stopped on another error.
        trainer.save_json(&args.model)?;
        info!("model saved to {}", args.model);
    }
    outcome?;

    if let (Some(images), Some(labels)) = (&args.test_images, &args.test_labels) {
        let test = load_idx_pair(images, labels)?;
        let accuracy = trainer.accuracy(&test.inputs, &test.labels)?;
        println!("\nTesting on {} samples", test.len());
        println!("test acc: {:.4}", accuracy * 100.0);
    }
    Ok(())
}

fn print_epoch(stats: &EpochStats) {
    match stats.val_accuracy {
        Some(va) => println!(
            "Epoch[{}/{}]  train acc: {:.4}   -   val acc: {:.4}",
            stats.epoch, stats.total_epochs, stats.train_accuracy, va
        ),
        None => println!(
            "Epoch[{}/{}]  train acc: {:.4}",
            stats.epoch, stats.total_epochs, stats.train_accuracy
        ),
    }
}
