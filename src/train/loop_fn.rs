use std::time::Instant;

use log::info;
use rand::Rng;

use crate::data::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::loss::targets::Targets;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::{LoopConfig, TrainConfig};
use crate::train::trainer::Trainer;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Trains for `schedule.epochs` epochs and returns the stats of every epoch.
///
/// Each epoch is a pass of `fit` calls over minibatches of `train`, followed by
/// accuracy on `train` and, if given, loss and accuracy on `val`. The first
/// error stops the run and is returned; a `NumericDivergence` also leaves the
/// trainer halted.
pub fn train_loop<R: Rng + ?Sized>(
    trainer: &mut Trainer,
    train: &Dataset,
    val: Option<&Dataset>,
    config: &TrainConfig,
    schedule: &LoopConfig,
    rng: &mut R,
) -> Result<Vec<EpochStats>> {
    train_loop_with(trainer, train, val, config, schedule, rng, |_| {})
}

/// Same as `train_loop`, calling `on_epoch` as soon as each epoch finishes.
pub fn train_loop_with<R, F>(
    trainer: &mut Trainer,
    train: &Dataset,
    val: Option<&Dataset>,
    config: &TrainConfig,
    schedule: &LoopConfig,
    rng: &mut R,
    mut on_epoch: F,
) -> Result<Vec<EpochStats>>
where
    R: Rng + ?Sized,
    F: FnMut(&EpochStats),
{
    schedule.validate()?;
    config.validate()?;
    if train.is_empty() {
        return Err(NnError::Dataset("training set is empty".to_owned()));
    }

    let mut history = Vec::with_capacity(schedule.epochs);
    for epoch in 1..=schedule.epochs {
        let t_start = Instant::now();

        let train_loss = run_one_epoch(trainer, train, config, schedule, rng)?;
        let train_accuracy = trainer.accuracy(&train.inputs, &train.labels)?;
        let (val_loss, val_accuracy) = match val {
            Some(v) if !v.is_empty() => (
                Some(trainer.loss(&v.inputs, Targets::Labels(&v.labels), config.l2)?),
                Some(trainer.accuracy(&v.inputs, &v.labels)?),
            ),
            _ => (None, None),
        };

        let stats = EpochStats {
            epoch,
            total_epochs: schedule.epochs,
            train_loss,
            train_accuracy,
            val_loss,
            val_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        match (stats.val_loss, stats.val_accuracy) {
            (Some(vl), Some(va)) => info!(
                "Epoch[{}/{}]  loss: {:.4}  train acc: {:.4}  -  val loss: {:.4}  val acc: {:.4}",
                epoch, schedule.epochs, train_loss, train_accuracy, vl, va
            ),
            _ => info!(
                "Epoch[{}/{}]  loss: {:.4}  train acc: {:.4}",
                epoch, schedule.epochs, train_loss, train_accuracy
            ),
        }
        on_epoch(&stats);
        history.push(stats);
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// One pass over the training data. Returns the sample-weighted mean loss.
fn run_one_epoch<R: Rng + ?Sized>(
    trainer: &mut Trainer,
    train: &Dataset,
    config: &TrainConfig,
    schedule: &LoopConfig,
    rng: &mut R,
) -> Result<f64> {
    let batches = if schedule.shuffle {
        train.batch_indices(schedule.batch_size, Some(rng))
    } else {
        train.batch_indices::<R>(schedule.batch_size, None)
    };

    let mut total_loss = 0.0;
    for rows in &batches {
        let (inputs, labels) = train.select(rows);
        total_loss += trainer.fit(&inputs, &labels, config)? * rows.len() as f64;
    }
    Ok(total_loss / train.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Two well-separated clusters in 2-D.
    fn clusters(n: usize, rng: &mut ChaCha8Rng) -> Dataset {
        let mut rows = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let label = i % 2;
            let center = if label == 0 { -2.0 } else { 2.0 };
            rows.push(vec![center + rng.gen_range(-0.5..0.5), center + rng.gen_range(-0.5..0.5)]);
            labels.push(label);
        }
        Dataset::new(Matrix::from_rows(rows).unwrap(), labels).unwrap()
    }

    #[test]
    fn separable_clusters_are_learned() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let train = clusters(64, &mut rng);
        let val = clusters(16, &mut rng);
        let mut trainer = Trainer::with_seed(&[2, 8, 2], 21).unwrap();
        let history = train_loop(
            &mut trainer,
            &train,
            Some(&val),
            &TrainConfig::new(0.01),
            &LoopConfig::new(20, 8),
            &mut rng,
        )
        .unwrap();
        assert_eq!(history.len(), 20);
        assert_eq!(history[19].epoch, 20);
        assert!(history[19].train_loss < history[0].train_loss);
        assert!(history[19].train_accuracy > 0.95);
        assert!(history[19].val_accuracy.unwrap() > 0.9);
        assert!(history[19].val_loss.unwrap() < history[0].val_loss.unwrap());
    }

    #[test]
    fn epoch_callback_sees_every_epoch_in_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let train = clusters(16, &mut rng);
        let mut trainer = Trainer::with_seed(&[2, 4, 2], 5).unwrap();
        let mut seen = Vec::new();
        let history = train_loop_with(
            &mut trainer,
            &train,
            None,
            &TrainConfig::default(),
            &LoopConfig::new(3, 4),
            &mut rng,
            |stats| seen.push(stats.clone()),
        )
        .unwrap();
        assert_eq!(seen.iter().map(|s| s.epoch).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(seen, history);
        assert!(seen.iter().all(|s| s.val_loss.is_none() && s.val_accuracy.is_none()));
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let empty = Dataset::new(Matrix::zeros(0, 2), vec![]).unwrap();
        let mut trainer = Trainer::with_seed(&[2, 2], 0).unwrap();
        let result = train_loop(
            &mut trainer,
            &empty,
            None,
            &TrainConfig::default(),
            &LoopConfig::default(),
            &mut ChaCha8Rng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(NnError::Dataset(_))));
    }
}
