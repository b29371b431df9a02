//! Inference Module - model loading and classification
//!
//! The loader runs once at startup; the classifier is then shared by every
//! request. Swapping the artifact format only touches the loader.

pub mod predictor;
pub mod tree;
pub mod loader;
pub mod classifier;
#[cfg(feature = "onnx")]
pub mod onnx;

// Re-export common types
pub use loader::{load_model, LoadedModel, ModelMetadata};
pub use classifier::{ClassifyError, EngineStats, TrafficClassifier};
