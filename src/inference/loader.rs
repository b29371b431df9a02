//! Model Loader
//!
//! Reads the gzip-compressed artifact once at startup and turns it into a
//! shared, read-only predictor. Every failure here is fatal to the caller:
//! there is no fallback model.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::predictor::Predictor;
use super::tree::{TreeEnsemble, TreeError};
use crate::models::FEATURE_COUNT;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("model artifact is not valid gzip: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("model artifact could not be deserialized: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("model artifact is structurally invalid: {0}")]
    Invalid(#[from] TreeError),

    #[error("model expects {actual} features, this service provides {expected}")]
    FeatureWidth { expected: usize, actual: usize },

    #[error("unsupported model format '{0}'")]
    UnsupportedFormat(String),

    #[error("model runtime rejected artifact: {0}")]
    Runtime(String),
}

// ============================================================================
// FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// JSON tree ensemble (`*.json.gz`)
    TreeJson,
    /// ONNX graph (`*.onnx.gz`), needs the `onnx` feature
    Onnx,
}

impl ModelFormat {
    /// Detect from the extension under `.gz`
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let inner = name.strip_suffix(".gz").unwrap_or(&name);

        match Path::new(inner).extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(ModelFormat::TreeJson),
            Some("onnx") => Ok(ModelFormat::Onnx),
            other => Err(ModelError::UnsupportedFormat(other.unwrap_or("").to_string())),
        }
    }
}

// ============================================================================
// LOADED MODEL
// ============================================================================

/// Descriptive information about the loaded artifact
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub path: String,
    pub format: ModelFormat,
    pub kind: &'static str,
    pub n_features: usize,
    pub compressed_bytes: usize,
    pub decompressed_bytes: usize,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
}

pub struct LoadedModel {
    pub predictor: Arc<dyn Predictor>,
    pub metadata: ModelMetadata,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel").field("metadata", &self.metadata).finish()
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Read, verify, decompress and deserialize the model artifact
pub fn load_model(path: &Path, expected_sha256: Option<&str>) -> Result<LoadedModel, ModelError> {
    tracing::info!("Loading model artifact from: {}", path.display());

    let format = ModelFormat::from_path(path)?;

    let compressed = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let sha256 = hex::encode(Sha256::digest(&compressed));
    if let Some(expected) = expected_sha256 {
        if !expected.eq_ignore_ascii_case(&sha256) {
            return Err(ModelError::ChecksumMismatch {
                expected: expected.to_string(),
                actual: sha256,
            });
        }
    }

    let decompressed = decompress(&compressed)?;
    let predictor = decode(format, &decompressed)?;

    if predictor.n_features() != FEATURE_COUNT {
        return Err(ModelError::FeatureWidth {
            expected: FEATURE_COUNT,
            actual: predictor.n_features(),
        });
    }

    let metadata = ModelMetadata {
        path: path.display().to_string(),
        format,
        kind: predictor.kind(),
        n_features: predictor.n_features(),
        compressed_bytes: compressed.len(),
        decompressed_bytes: decompressed.len(),
        sha256,
        loaded_at: Utc::now(),
    };

    tracing::info!(
        kind = metadata.kind,
        compressed_bytes = metadata.compressed_bytes,
        decompressed_bytes = metadata.decompressed_bytes,
        sha256 = %metadata.sha256,
        "Model loaded successfully"
    );

    Ok(LoadedModel { predictor, metadata })
}

/// Gunzip the whole artifact into memory
fn decompress(compressed: &[u8]) -> Result<Vec<u8>, ModelError> {
    let mut decoder = GzDecoder::new(compressed);
    let mut out = Vec::with_capacity(compressed.len() * 4);
    decoder.read_to_end(&mut out).map_err(ModelError::Decompress)?;
    Ok(out)
}

fn decode(format: ModelFormat, bytes: &[u8]) -> Result<Arc<dyn Predictor>, ModelError> {
    match format {
        ModelFormat::TreeJson => {
            let ensemble: TreeEnsemble = serde_json::from_slice(bytes)?;
            ensemble.validate()?;
            Ok(Arc::new(ensemble))
        }
        #[cfg(feature = "onnx")]
        ModelFormat::Onnx => {
            let predictor = super::onnx::OnnxPredictor::from_bytes(bytes, FEATURE_COUNT)
                .map_err(|e| ModelError::Runtime(e.to_string()))?;
            Ok(Arc::new(predictor))
        }
        #[cfg(not(feature = "onnx"))]
        ModelFormat::Onnx => Err(ModelError::UnsupportedFormat(
            "onnx (rebuild with --features onnx)".to_string(),
        )),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::inference::tree::{Node, Tree};
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;
    use tempfile::TempDir;

    /// 15-feature decision tree: `rate` (column 6) above 1000 is DoS, otherwise benign
    pub(crate) fn rate_tree() -> TreeEnsemble {
        TreeEnsemble {
            n_features: FEATURE_COUNT,
            classes: vec![0, 1, 2, 3, 4, 5],
            trees: vec![Tree {
                nodes: vec![
                    Node::Split { feature: 6, threshold: 1000.0, left: 1, right: 2 },
                    Node::Leaf { value: vec![10.0, 0.0, 0.0, 1.0, 0.0, 0.0] },
                    Node::Leaf { value: vec![0.0, 0.0, 2.0, 9.0, 0.0, 0.0] },
                ],
            }],
        }
    }

    pub(crate) fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    pub(crate) fn write_artifact(dir: &TempDir, name: &str, model: &TreeEnsemble) -> PathBuf {
        let path = dir.path().join(name);
        let json = serde_json::to_vec(model).unwrap();
        std::fs::write(&path, gzip(&json)).unwrap();
        path
    }

    #[test]
    fn test_loads_gzipped_tree_ensemble() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "detector.json.gz", &rate_tree());

        let loaded = tokio_test::assert_ok!(load_model(&path, None));
        assert_eq!(loaded.metadata.format, ModelFormat::TreeJson);
        assert_eq!(loaded.metadata.kind, "decision_tree");
        assert_eq!(loaded.metadata.n_features, FEATURE_COUNT);
        assert_eq!(loaded.metadata.sha256.len(), 64);
        assert!(loaded.metadata.decompressed_bytes > 0);
    }

    #[test]
    fn test_shipped_asset_loads_and_scores_zero_vector() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("assets")
            .join(crate::config::DEFAULT_MODEL_FILE);
        let loaded = load_model(&path, None).unwrap();
        assert_eq!(loaded.metadata.kind, "random_forest");

        let codes = loaded
            .predictor
            .predict(ndarray::Array2::<f64>::zeros((1, FEATURE_COUNT)).view())
            .unwrap();
        assert_eq!(codes, vec![0]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_model(&dir.path().join("absent.json.gz"), None).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_corrupt_gzip_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.json.gz");
        std::fs::write(&path, b"definitely not gzip").unwrap();
        let err = load_model(&path, None).unwrap_err();
        assert!(matches!(err, ModelError::Decompress(_)));
    }

    #[test]
    fn test_bad_json_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json.gz");
        std::fs::write(&path, gzip(b"{\"trees\": 7}")).unwrap();
        let err = load_model(&path, None).unwrap_err();
        assert!(matches!(err, ModelError::Deserialize(_)));
    }

    #[test]
    fn test_structurally_invalid_model_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut model = rate_tree();
        model.trees.clear();
        let path = write_artifact(&dir, "empty.json.gz", &model);
        let err = load_model(&path, None).unwrap_err();
        assert!(matches!(err, ModelError::Invalid(TreeError::NoTrees)));
    }

    #[test]
    fn test_wrong_feature_width_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut model = rate_tree();
        model.n_features = 20;
        let path = write_artifact(&dir, "wide.json.gz", &model);
        let err = load_model(&path, None).unwrap_err();
        assert!(matches!(err, ModelError::FeatureWidth { expected: 15, actual: 20 }));
    }

    #[test]
    fn test_checksum_pin() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "pinned.json.gz", &rate_tree());
        let digest = hex::encode(Sha256::digest(std::fs::read(&path).unwrap()));

        assert!(load_model(&path, Some(digest.to_uppercase().as_str())).is_ok());

        let err = load_model(&path, Some("00ff")).unwrap_err();
        assert!(matches!(err, ModelError::ChecksumMismatch { .. }));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_artifact_needs_feature() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/fixtures/rate_linear.onnx.gz");
        let err = load_model(&path, None).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat(msg) if msg.contains("--features onnx")));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ModelFormat::from_path(Path::new("a/model.json.gz")).unwrap(),
            ModelFormat::TreeJson
        );
        assert_eq!(
            ModelFormat::from_path(Path::new("MODEL.ONNX.GZ")).unwrap(),
            ModelFormat::Onnx
        );
        assert!(matches!(
            ModelFormat::from_path(Path::new("model.pkl.gz")),
            Err(ModelError::UnsupportedFormat(ext)) if ext == "pkl"
        ));
    }
}
