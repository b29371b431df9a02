//! Flow Features - Model input layout
//!
//! **This file controls the feature schema the trained model was fitted on.**
//!
//! The model never sees feature names, only positions. `MODEL_FEATURE_ORDER`
//! is the single source of truth for those positions; the form layout below
//! is presentation order and is allowed to differ.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

// ============================================================================
// LAYOUT
// ============================================================================

/// Number of features the model consumes
pub const FEATURE_COUNT: usize = 15;

/// Feature names in the exact column order of the model input matrix
pub const MODEL_FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "iat",              // 0: Inter-arrival time between packets
    "rst_count",        // 1
    "header_length",    // 2
    "fin_count",        // 3
    "avg",              // 4: Average packet length
    "total_size",       // 5
    "rate",             // 6: Flow rate
    "ack_count",        // 7
    "magnitude",        // 8
    "ack_flag_number",  // 9
    "maximum",          // 10: Maximum packet length
    "fin_flag_number",  // 11
    "syn_flag_number",  // 12
    "rst_flag_number",  // 13
    "psh_flag_number",  // 14
];

/// Form layout: three columns of `(field, label)`
pub const FORM_COLUMNS: [[(&str, &str); 5]; 3] = [
    [
        ("iat", "Inter-Arrival Time between Packets"),
        ("header_length", "Header Length"),
        ("total_size", "Total Size of Packets"),
        ("avg", "Average"),
        ("rate", "Flow Rate"),
    ],
    [
        ("ack_flag_number", "ACK Flag Number"),
        ("fin_flag_number", "FIN Flag Number"),
        ("psh_flag_number", "PSH Flag Number"),
        ("rst_flag_number", "RST Flag Number"),
        ("syn_flag_number", "SYN Flag Number"),
    ],
    [
        ("magnitude", "Magnitude"),
        ("ack_count", "ACK Count"),
        ("fin_count", "FIN Count"),
        ("rst_count", "RST Count"),
        ("maximum", "Maximum"),
    ],
];

/// Get model column index by feature name
pub fn feature_index(name: &str) -> Option<usize> {
    MODEL_FEATURE_ORDER.iter().position(|&n| n == name)
}

// ============================================================================
// ERRORS
// ============================================================================

/// Rejection of a feature vector before it reaches the predictor
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("expected {expected} feature values, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("feature '{feature}' must be non-negative, got {value}")]
    Negative { feature: &'static str, value: f64 },

    #[error("feature '{feature}' must be a finite number")]
    NotFinite { feature: &'static str },
}

// ============================================================================
// NAMED FEATURES
// ============================================================================

/// Network-flow statistics as entered by a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct FlowFeatures {
    #[validate(range(min = 0.0))]
    pub iat: f64,
    #[validate(range(min = 0.0))]
    pub header_length: f64,
    #[validate(range(min = 0.0))]
    pub total_size: f64,
    #[validate(range(min = 0.0))]
    pub avg: f64,
    #[validate(range(min = 0.0))]
    pub rate: f64,
    #[validate(range(min = 0.0))]
    pub ack_flag_number: f64,
    #[validate(range(min = 0.0))]
    pub fin_flag_number: f64,
    #[validate(range(min = 0.0))]
    pub psh_flag_number: f64,
    #[validate(range(min = 0.0))]
    pub rst_flag_number: f64,
    #[validate(range(min = 0.0))]
    pub syn_flag_number: f64,
    #[validate(range(min = 0.0))]
    pub magnitude: f64,
    #[validate(range(min = 0.0))]
    pub ack_count: f64,
    #[validate(range(min = 0.0))]
    pub fin_count: f64,
    #[validate(range(min = 0.0))]
    pub rst_count: f64,
    #[validate(range(min = 0.0))]
    pub maximum: f64,
}

impl FlowFeatures {
    /// Assemble values in `MODEL_FEATURE_ORDER`
    pub fn to_model_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.iat,
            self.rst_count,
            self.header_length,
            self.fin_count,
            self.avg,
            self.total_size,
            self.rate,
            self.ack_count,
            self.magnitude,
            self.ack_flag_number,
            self.maximum,
            self.fin_flag_number,
            self.syn_flag_number,
            self.rst_flag_number,
            self.psh_flag_number,
        ]
    }

    /// Get feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.to_model_row()[i])
    }
}

// ============================================================================
// VALIDATED VECTOR
// ============================================================================

/// Validated model input: 15 finite, non-negative values in model order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

/// All-zero vector, the form's initial state
impl Default for FeatureVector {
    fn default() -> Self {
        Self([0.0; FEATURE_COUNT])
    }
}

impl FeatureVector {
    /// Build from a positional slice, rejecting wrong length or bad values
    pub fn try_from_slice(values: &[f64]) -> Result<Self, FeatureError> {
        let row: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| FeatureError::WrongLength {
            expected: FEATURE_COUNT,
            actual: values.len(),
        })?;
        Self::try_from_row(row)
    }

    fn try_from_row(row: [f64; FEATURE_COUNT]) -> Result<Self, FeatureError> {
        for (&feature, &value) in MODEL_FEATURE_ORDER.iter().zip(row.iter()) {
            if !value.is_finite() {
                return Err(FeatureError::NotFinite { feature });
            }
            if value < 0.0 {
                return Err(FeatureError::Negative { feature, value });
            }
        }
        Ok(Self(row))
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}

impl TryFrom<&FlowFeatures> for FeatureVector {
    type Error = FeatureError;

    fn try_from(flow: &FlowFeatures) -> Result<Self, Self::Error> {
        Self::try_from_row(flow.to_model_row())
    }
}

// ============================================================================
// TESTS
// ============================================================================
