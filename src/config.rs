//! Configuration module

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Artifact file name, colocated with the application under `assets/`
pub const DEFAULT_MODEL_FILE: &str = "iomt_traffic_attack_detector.json.gz";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Compressed model artifact
    pub model_path: PathBuf,

    /// Optional SHA-256 pin for the compressed artifact
    pub model_sha256: Option<String>,

    /// Environment (development, production)
    pub environment: String,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok(), &app_dirs())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>, app_dirs: &[PathBuf]) -> Self {
        Self {
            host: get("HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),

            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8501),

            model_path: resolve_app_relative(
                &get("MODEL_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| Path::new("assets").join(DEFAULT_MODEL_FILE)),
                app_dirs,
            ),

            model_sha256: get("MODEL_SHA256")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),

            environment: get("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),

            log_format: match get("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Where the application lives: the executable's directory, then the
/// working directory.
fn app_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::with_capacity(2);
    if let Some(dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(dir);
    }
    if let Ok(cwd) = env::current_dir() {
        dirs.push(cwd);
    }
    dirs
}

/// Relative paths resolve to the first app directory that contains them.
/// When none does, the first directory is used so the load error names it.
fn resolve_app_relative(path: &Path, app_dirs: &[PathBuf]) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    app_dirs
        .iter()
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.exists())
        .or_else(|| app_dirs.first().map(|dir| dir.join(path)))
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn config_in(app_dirs: &[PathBuf], vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned(), app_dirs)
    }

    fn place_artifact(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("assets").join(DEFAULT_MODEL_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let exe_dir = TempDir::new().unwrap();
        let config = config_in(&[exe_dir.path().to_path_buf()], &[]);
        assert_eq!(config.port, 8501);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(
            config.model_path,
            exe_dir.path().join("assets").join(DEFAULT_MODEL_FILE)
        );
        assert_eq!(config.model_sha256, None);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let exe_dir = TempDir::new().unwrap();
        let config = config_in(&[exe_dir.path().to_path_buf()], &[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("MODEL_PATH", "/srv/models/forest.json.gz"),
            ("MODEL_SHA256", "  abc123 "),
            ("ENVIRONMENT", "production"),
            ("LOG_FORMAT", "json"),
        ]);
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.model_path, PathBuf::from("/srv/models/forest.json.gz"));
        assert_eq!(config.model_sha256.as_deref(), Some("abc123"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.is_production());
    }

    #[test]
    fn test_default_artifact_found_next_to_executable() {
        let exe_dir = TempDir::new().unwrap();
        let work_dir = TempDir::new().unwrap();
        let expected = place_artifact(&exe_dir);
        place_artifact(&work_dir);

        let dirs = [exe_dir.path().to_path_buf(), work_dir.path().to_path_buf()];
        assert_eq!(config_in(&dirs, &[]).model_path, expected);
    }

    #[test]
    fn test_default_artifact_falls_back_to_working_dir() {
        let exe_dir = TempDir::new().unwrap();
        let work_dir = TempDir::new().unwrap();
        let expected = place_artifact(&work_dir);

        let dirs = [exe_dir.path().to_path_buf(), work_dir.path().to_path_buf()];
        assert_eq!(config_in(&dirs, &[]).model_path, expected);
    }

    #[test]
    fn test_relative_model_path_is_app_relative() {
        let exe_dir = TempDir::new().unwrap();
        let config = config_in(&[exe_dir.path().to_path_buf()], &[("MODEL_PATH", "models/alt.json.gz")]);
        assert_eq!(config.model_path, exe_dir.path().join("models/alt.json.gz"));
    }

    #[test]
    fn test_app_dirs_start_at_the_executable() {
        let exe = env::current_exe().unwrap();
        let dirs = app_dirs();
        assert_eq!(dirs.first().map(PathBuf::as_path), exe.parent());
        assert_eq!(dirs.last(), Some(&env::current_dir().unwrap()));
        assert_eq!(dirs.len(), 2);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = config_in(&[], &[("PORT", "not-a-port"), ("MODEL_SHA256", "  ")]);
        assert_eq!(config.port, 8501);
        assert_eq!(config.model_sha256, None);
    }
}
