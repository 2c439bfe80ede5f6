use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::{NnError, Result};

/// Dense row-major matrix of `f64`. Batches are stored one example per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Zero matrix with the same shape as `other`.
    pub fn zeros_like(other: &Matrix) -> Matrix {
        Matrix::zeros(other.rows, other.cols)
    }

    /// Builds a matrix from row vectors. All rows must have the same length.
    /// An empty `data` yields a 0×0 matrix.
    pub fn from_rows(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let rows = data.len();
        let cols = data.first().map_or(0, Vec::len);
        if let Some((i, row)) = data.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(NnError::ShapeMismatch {
                op: "from_rows",
                expected: (i, cols),
                found: (i, row.len()),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// A single-row matrix, used for bias vectors.
    pub fn row_vector(values: Vec<f64>) -> Matrix {
        Matrix {
            rows: 1,
            cols: values.len(),
            data: vec![values],
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both uniforms in (0, 1] so ln never sees 0.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Glorot-scaled normal initialization: N(0, 1) · sqrt(6 / (rows + cols)).
    ///
    /// Shape: (rows, cols) = (fan_in, fan_out), matching a Dense weight matrix.
    pub fn glorot<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let scale = (6.0 / (rows + cols) as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for x in row.iter_mut() {
                *x = Matrix::sample_standard_normal(rng) * scale;
            }
        }
        res
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Checks that `rows`/`cols` agree with the stored data. Deserialized
    /// matrices are not trusted until this passes.
    pub fn validate(&self) -> Result<()> {
        if self.data.len() != self.rows {
            return Err(NnError::CorruptModel(format!(
                "matrix declares {} rows but stores {}",
                self.rows,
                self.data.len()
            )));
        }
        if let Some(row) = self.data.iter().position(|r| r.len() != self.cols) {
            return Err(NnError::CorruptModel(format!(
                "matrix row {} has {} values, expected {}",
                row,
                self.data[row].len(),
                self.cols
            )));
        }
        Ok(())
    }

    fn expect_shape(&self, op: &'static str, expected: (usize, usize)) -> Result<()> {
        if self.shape() != expected {
            return Err(NnError::ShapeMismatch { op, expected, found: self.shape() });
        }
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Element-wise combination of two same-shape matrices.
    pub fn zip_map<F>(&self, other: &Matrix, functor: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        other.expect_shape("zip_map", self.shape())?;
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| functor(x, y)).collect())
            .collect();
        Ok(Matrix { rows: self.rows, cols: self.cols, data })
    }

    /// Matrix product `self · rhs`.
    pub fn dot(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(NnError::ShapeMismatch {
                op: "dot",
                expected: (self.cols, rhs.cols),
                found: rhs.shape(),
            });
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                for j in 0..res.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }

        Ok(res)
    }

    /// Adds a `1 × cols` row to every row of `self`.
    pub fn add_row(&self, row: &Matrix) -> Result<Matrix> {
        row.expect_shape("add_row", (1, self.cols))?;
        let bias = &row.data[0];
        let data = self
            .data
            .iter()
            .map(|r| r.iter().zip(bias.iter()).map(|(x, b)| x + b).collect())
            .collect();
        Ok(Matrix { rows: self.rows, cols: self.cols, data })
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Sums each column into a `1 × cols` row.
    pub fn column_sums(&self) -> Matrix {
        let mut sums = vec![0.0; self.cols];
        for row in &self.data {
            for (s, x) in sums.iter_mut().zip(row.iter()) {
                *s += x;
            }
        }
        Matrix::row_vector(sums)
    }

    /// Index of the largest value in each row. Ties resolve to the first index.
    pub fn argmax_rows(&self) -> Vec<usize> {
        self.data
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |(best, max), (i, &x)| {
                        if x > max { (i, x) } else { (best, max) }
                    })
                    .0
            })
            .collect()
    }

    /// Sum of squares of every element.
    pub fn squared_norm(&self) -> f64 {
        self.values().map(|x| x * x).sum()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().flat_map(|row| row.iter().copied())
    }

    pub fn is_finite(&self) -> bool {
        self.values().all(f64::is_finite)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}
