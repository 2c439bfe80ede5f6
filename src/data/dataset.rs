use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Classification samples: one input row per label.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub inputs: Matrix,
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn new(inputs: Matrix, labels: Vec<usize>) -> Result<Dataset> {
        if inputs.rows != labels.len() {
            return Err(NnError::Dataset(format!(
                "{} input rows but {} labels",
                inputs.rows,
                labels.len()
            )));
        }
        Ok(Dataset { inputs, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.inputs.cols
    }

    /// `1 + max(label)`, or 0 for an empty set.
    pub fn class_count(&self) -> usize {
        self.labels.iter().max().map_or(0, |&m| m + 1)
    }

    /// Splits off the last `n` rows into a new dataset (e.g. a validation set).
    pub fn split_off_last(&mut self, n: usize) -> Result<Dataset> {
        if n >= self.len() {
            return Err(NnError::Dataset(format!(
                "cannot hold out {} of {} rows and keep any for training",
                n,
                self.len()
            )));
        }
        let keep = self.len() - n;
        let held_inputs = self.inputs.data.split_off(keep);
        let held_labels = self.labels.split_off(keep);
        self.inputs.rows = keep;
        Dataset::new(
            Matrix { rows: n, cols: self.inputs.cols, data: held_inputs },
            held_labels,
        )
    }

    /// Gathers the given rows into a batch.
    pub fn select(&self, rows: &[usize]) -> (Matrix, Vec<usize>) {
        let data = rows.iter().map(|&i| self.inputs.data[i].clone()).collect();
        let labels = rows.iter().map(|&i| self.labels[i]).collect();
        (Matrix { rows: rows.len(), cols: self.inputs.cols, data }, labels)
    }

    /// Row indices grouped into batches of `batch_size` (the last may be
    /// shorter). When `rng` is given the order is shuffled first.
    pub fn batch_indices<R: Rng + ?Sized>(&self, batch_size: usize, rng: Option<&mut R>) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        if let Some(rng) = rng {
            indices.shuffle(rng);
        }
        indices.chunks(batch_size.max(1)).map(<[usize]>::to_vec).collect()
    }
}
