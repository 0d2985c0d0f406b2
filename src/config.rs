use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf};

pub const DEFAULT_ARTIFACT_DIR: &str = "summative/linear_regression";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub artifact_dir: PathBuf,
    pub log_predictions: bool,
}

/// Optional JSON config file named by `BIKE_CONFIG`; env vars win over it.
#[derive(Deserialize, Debug, Default)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    artifact_dir: Option<PathBuf>,
    log_predictions: Option<bool>,
}

impl FileConfig {
    fn load(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("config file {} not found", path))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path))
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the config from a key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match lookup("BIKE_CONFIG") {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };

        let host = lookup("HOST").or(file.host).unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match lookup("PORT") {
            Some(p) => p
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid number, got '{}'", p))?,
            None => file.port.unwrap_or(8000),
        };
        let artifact_dir = lookup("ARTIFACT_DIR")
            .map(PathBuf::from)
            .or(file.artifact_dir)
            .unwrap_or_else(resolve_artifact_dir);
        let log_predictions = match lookup("LOG_PRED") {
            Some(v) => v == "1",
            None => file.log_predictions.unwrap_or(false),
        };

        Ok(Self { host, port, artifact_dir, log_predictions })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Finds the artifact directory when none is configured: workspace-relative
/// first, then the parent directory, then next to the executable.
fn resolve_artifact_dir() -> PathBuf {
    let candidates = [
        PathBuf::from(DEFAULT_ARTIFACT_DIR),
        PathBuf::from("..").join(DEFAULT_ARTIFACT_DIR),
        {
            let mut p = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
            p.pop(); // exe dir
            p.push(DEFAULT_ARTIFACT_DIR);
            p
        },
    ];

    for c in candidates {
        if c.is_dir() {
            return c;
        }
    }

    // loading will report the missing files
    PathBuf::from(DEFAULT_ARTIFACT_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8000");
        assert!(!cfg.log_predictions);
        assert!(cfg.artifact_dir.ends_with(DEFAULT_ARTIFACT_DIR));
    }

    #[test]
    fn env_values() {
        let cfg = ServiceConfig::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9090"),
            ("ARTIFACT_DIR", "/srv/models"),
            ("LOG_PRED", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9090");
        assert_eq!(cfg.artifact_dir, PathBuf::from("/srv/models"));
        assert!(cfg.log_predictions);
    }

    #[test]
    fn bad_port() {
        let err = ServiceConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn file_then_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bike.json");
        fs::write(&path, r#"{"host": "10.0.0.1", "port": 7000, "log_predictions": true}"#).unwrap();
        let path = path.to_string_lossy().to_string();

        let cfg = ServiceConfig::from_lookup(lookup(&[("BIKE_CONFIG", path.as_str())])).unwrap();
        assert_eq!(cfg.bind_addr(), "10.0.0.1:7000");
        assert!(cfg.log_predictions);

        let cfg = ServiceConfig::from_lookup(lookup(&[("BIKE_CONFIG", path.as_str()), ("PORT", "7001"), ("LOG_PRED", "0")])).unwrap();
        assert_eq!(cfg.port, 7001);
        assert!(!cfg.log_predictions);
    }

    #[test]
    fn missing_config_file() {
        assert!(ServiceConfig::from_lookup(lookup(&[("BIKE_CONFIG", "/nonexistent/bike.json")])).is_err());
    }
}
