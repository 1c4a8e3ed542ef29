//! Least-squares linear predictors
//!
//! Solves `X · beta = y` in the least-squares sense with an intercept column
//! appended to the design matrix, through the SVD of `X` itself. Dropping
//! the negligible singular values yields the minimum-norm solution, which
//! keeps the fit well defined while there are fewer samples than features
//! and when feature columns repeat (the default eye sets reuse two indices).

use super::TrainingSample;
use crate::error::{EngineError, Result};
use nalgebra::{DMatrix, DVector, SVD};

/// Singular values below this fraction of the largest are treated as zero
const RCOND: f64 = 1e-10;

/// `y = w · x + b`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    weights: DVector<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    pub fn weights(&self) -> &[f64] {
        self.weights.as_slice()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    fn from_solution(beta: &DMatrix<f64>, column: usize, dim: usize) -> Self {
        let col = beta.column(column);
        Self {
            weights: DVector::from_iterator(dim, col.iter().take(dim).copied()),
            intercept: col[dim],
        }
    }
}

/// Upper bound on SVD sweeps; a well-formed design converges in far fewer
const MAX_SVD_ITERATIONS: usize = 1000;

/// Fit the horizontal and vertical predictors over the same samples.
///
/// Both share one design matrix, so it is decomposed once and solved for
/// each target column.
pub(crate) fn fit_pair(samples: &[&TrainingSample], dim: usize) -> Result<(LinearModel, LinearModel)> {
    let rows = samples.len();
    if rows == 0 {
        return Err(EngineError::SingularFit);
    }

    let design = DMatrix::from_fn(rows, dim + 1, |r, c| {
        if c < dim {
            samples[r].features.as_slice()[c]
        } else {
            1.0
        }
    });
    let targets = DMatrix::from_fn(rows, 2, |r, c| {
        let t = samples[r].target;
        if c == 0 {
            t.x
        } else {
            t.y
        }
    });
    if design.iter().chain(targets.iter()).any(|v| !v.is_finite()) {
        return Err(EngineError::SingularFit);
    }

    let svd = SVD::try_new(design, true, true, f64::EPSILON, MAX_SVD_ITERATIONS).ok_or(EngineError::SingularFit)?;
    let largest = svd.singular_values.max();
    if !(largest.is_finite() && largest > 0.0) {
        return Err(EngineError::SingularFit);
    }

    let beta = svd
        .solve(&targets, largest * RCOND)
        .map_err(|_| EngineError::SingularFit)?;
    if beta.iter().any(|v| !v.is_finite()) {
        return Err(EngineError::SingularFit);
    }

    Ok((
        LinearModel::from_solution(&beta, 0, dim),
        LinearModel::from_solution(&beta, 1, dim),
    ))
}
