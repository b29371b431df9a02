//! ONNX Runtime backend
//!
//! For classifiers converted with sklearn-onnx: the first output is the
//! `label` tensor of int64 class codes.

use ndarray::{Array2, ArrayView2};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::predictor::{check_width, PredictError, Predictor};

pub struct OnnxPredictor {
    /// `Session::run` needs `&mut`
    session: Mutex<Session>,
    output_name: String,
    n_features: usize,
}

impl OnnxPredictor {
    /// Build a session from decompressed model bytes
    pub fn from_bytes(model_bytes: &[u8], n_features: usize) -> Result<Self, PredictError> {
        tracing::info!("Loading ONNX model from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| PredictError::Runtime(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| PredictError::Runtime(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| PredictError::Runtime(format!("Load from memory error: {}", e)))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| PredictError::Runtime("No output defined".to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            n_features,
        })
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, batch: ArrayView2<'_, f64>) -> Result<Vec<i64>, PredictError> {
        check_width(&batch, self.n_features)?;

        // sklearn-onnx graphs take float32 input
        let input: Array2<f32> = batch.mapv(|v| v as f32);
        let input_tensor = Value::from_array(input)
            .map_err(|e| PredictError::Runtime(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| PredictError::Runtime(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or(PredictError::EmptyOutput)?;

        let (_, codes) = output
            .try_extract_tensor::<i64>()
            .map_err(|e| PredictError::Runtime(format!("Extract error: {}", e)))?;

        Ok(codes.to_vec())
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
