pub mod trainer;
pub mod epoch_stats;
pub mod train_config;
pub mod loop_fn;

pub use trainer::{Trainer, TrainerState};
pub use epoch_stats::EpochStats;
pub use train_config::{LoopConfig, TrainConfig};
pub use loop_fn::{train_loop, train_loop_with};
