//! Traffic Classifier
//!
//! Input: validated feature vector. Output: Verdict.
//! The predictor is shared read-only; stats are plain atomics so the
//! inference path never takes a lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ndarray::Array2;
use serde::Serialize;
use thiserror::Error;

use super::predictor::{PredictError, Predictor};
use crate::models::{FeatureError, FeatureVector, FlowFeatures, Verdict, FEATURE_COUNT};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("invalid feature vector: {0}")]
    InvalidFeatures(#[from] FeatureError),

    #[error(transparent)]
    Predict(#[from] PredictError),
}

/// Engine stats for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub inference_count: u64,
    pub attacks_detected: u64,
    pub avg_latency_us: f64,
}

pub struct TrafficClassifier {
    predictor: Arc<dyn Predictor>,
    inference_count: AtomicU64,
    attacks_detected: AtomicU64,
    latency_sum_us: AtomicU64,
}

impl TrafficClassifier {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self {
            predictor,
            inference_count: AtomicU64::new(0),
            attacks_detected: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
        }
    }

    /// Classify one validated flow
    pub fn classify(&self, features: &FeatureVector) -> Result<Verdict, ClassifyError> {
        let start = Instant::now();

        // Single-row input matrix
        let input = Array2::from_shape_fn((1, FEATURE_COUNT), |(_, j)| features.as_array()[j]);

        let codes = self.predictor.predict(input.view())?;
        let code = *codes.first().ok_or(PredictError::EmptyOutput)?;
        let verdict = Verdict::from_code(code);

        let elapsed = start.elapsed().as_micros() as u64;
        self.latency_sum_us.fetch_add(elapsed, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if verdict.is_attack {
            self.attacks_detected.fetch_add(1, Ordering::Relaxed);
        }

        tracing::debug!(
            code,
            category = verdict.category.as_str(),
            latency_us = elapsed,
            "Flow classified"
        );

        Ok(verdict)
    }

    /// Validate a positional list, then classify
    pub fn classify_values(&self, values: &[f64]) -> Result<Verdict, ClassifyError> {
        let vector = FeatureVector::try_from_slice(values)?;
        self.classify(&vector)
    }

    /// Validate named features, then classify
    pub fn classify_flow(&self, flow: &FlowFeatures) -> Result<Verdict, ClassifyError> {
        let vector = FeatureVector::try_from(flow)?;
        self.classify(&vector)
    }

    pub fn stats(&self) -> EngineStats {
        let count = self.inference_count.load(Ordering::Relaxed);
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        EngineStats {
            inference_count: count,
            attacks_detected: self.attacks_detected.load(Ordering::Relaxed),
            avg_latency_us: if count > 0 { sum as f64 / count as f64 } else { 0.0 },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
