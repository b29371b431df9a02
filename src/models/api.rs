//! JSON API request/response bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

use super::features::FlowFeatures;
use super::verdict::Verdict;

/// Positional feature list in model column order
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PositionalFeatures {
    #[validate(length(equal = 15, message = "exactly 15 feature values are required"))]
    pub features: Vec<f64>,
}

/// Named flow statistics
#[derive(Debug, Clone, Deserialize)]
pub struct NamedFeatures {
    pub flow: FlowFeatures,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected a `features` list or a `flow` object")]
    UnknownShape,
}

/// `POST /api/v1/classify` body
#[derive(Debug, Clone)]
pub enum ClassifyRequest {
    Positional(PositionalFeatures),
    Named(NamedFeatures),
}

impl ClassifyRequest {
    /// Select the body form by its top-level key, then deserialize that form
    /// so type and missing-field errors name what was wrong.
    pub fn from_json(body: Value) -> Result<Self, RequestError> {
        if body.get("features").is_some() {
            serde_json::from_value(body)
                .map(ClassifyRequest::Positional)
                .map_err(|source| RequestError::Field { field: "features", source })
        } else if body.get("flow").is_some() {
            serde_json::from_value(body)
                .map(ClassifyRequest::Named)
                .map_err(|source| RequestError::Field { field: "flow", source })
        } else {
            Err(RequestError::UnknownShape)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Echo of the values handed to the model, in column order
    pub features: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_positional_body() {
        let body = json!({ "features": [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0] });
        match ClassifyRequest::from_json(body).unwrap() {
            ClassifyRequest::Positional(p) => {
                assert_eq!(p.features.len(), 15);
                assert!(p.validate().is_ok());
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_parses_named_body() {
        let body = json!({ "flow": {
            "iat": 1.5, "header_length": 0, "total_size": 0, "avg": 0, "rate": 0,
            "ack_flag_number": 0, "fin_flag_number": 0, "psh_flag_number": 0,
            "rst_flag_number": 0, "syn_flag_number": 0, "magnitude": 0,
            "ack_count": 0, "fin_count": 0, "rst_count": 0, "maximum": 0
        }});
        match ClassifyRequest::from_json(body).unwrap() {
            ClassifyRequest::Named(n) => assert_eq!(n.flow.iat, 1.5),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_wrong_element_type_is_described() {
        let body = json!({ "features": [0, 0, "abc", 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0] });
        let message = ClassifyRequest::from_json(body).unwrap_err().to_string();
        assert!(message.starts_with("features: "), "{}", message);
        assert!(message.contains("invalid type"), "{}", message);
        assert!(message.contains("abc"), "{}", message);
    }

    #[test]
    fn test_missing_named_field_is_described() {
        let body = json!({ "flow": { "rate": 1.0 } });
        let message = ClassifyRequest::from_json(body).unwrap_err().to_string();
        assert!(message.starts_with("flow: missing field"), "{}", message);
    }

    #[test]
    fn test_unknown_shape() {
        for body in [json!({ "values": [1, 2] }), json!([0.0, 1.0]), json!("flow")] {
            assert!(matches!(ClassifyRequest::from_json(body), Err(RequestError::UnknownShape)));
        }
    }

    #[test]
    fn test_positional_length_is_validated() {
        let short = PositionalFeatures { features: vec![0.0; 14] };
        assert!(short.validate().is_err());
    }
}
