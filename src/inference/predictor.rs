//! Predictor capability
//!
//! Anything that turns a (rows, features) matrix into one class code per row.

use ndarray::ArrayView2;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("input has {actual} columns, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("predictor returned no class codes")]
    EmptyOutput,

    #[error("inference runtime error: {0}")]
    Runtime(String),
}

/// Trait for inference backends (native tree ensemble, ONNX)
///
/// Implementations are immutable after load and shared across requests.
pub trait Predictor: Send + Sync {
    /// Predict one class code per input row
    fn predict(&self, batch: ArrayView2<'_, f64>) -> Result<Vec<i64>, PredictError>;

    /// Number of input columns the model was fitted on
    fn n_features(&self) -> usize;

    /// Short backend name for logs and status
    fn kind(&self) -> &'static str;
}

pub(crate) fn check_width(batch: &ArrayView2<'_, f64>, expected: usize) -> Result<(), PredictError> {
    let actual = batch.ncols();
    if actual != expected {
        return Err(PredictError::ShapeMismatch { expected, actual });
    }
    Ok(())
}
