use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable holding the Gemini API credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Placeholder value some setup guides leave behind; treated as unset.
const API_KEY_PLACEHOLDER: &str = "API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Gemini model identifier.
    #[serde(default = "default_model_id")]
    pub id: String,
    /// Sampling temperature passed to the service.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum tokens the model may generate per call.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Per-request timeout for the HTTP client.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: default_model_id(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Maximum characters per chunk of combined slide text.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    /// Total attempts per model call (first try included).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_model_id() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_temperature() -> f64 {
    0.1
}
fn default_max_output_tokens() -> u32 {
    2000
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_chunk_size() -> usize {
    8000
}
fn default_max_retries() -> u32 {
    3
}

/// Load configuration from a TOML file, or fall back to defaults when the
/// file does not exist. Every setting has a default; the API credential is
/// environment-only and never read from the file.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate model settings
    if config.model.id.is_empty() {
        anyhow::bail!("model.id must not be empty");
    }

    if !(0.0..=2.0).contains(&config.model.temperature) {
        anyhow::bail!("model.temperature must be in [0.0, 2.0]");
    }

    if config.model.max_output_tokens == 0 {
        anyhow::bail!("model.max_output_tokens must be > 0");
    }

    if config.model.timeout_secs == 0 {
        anyhow::bail!("model.timeout_secs must be > 0");
    }

    // Validate analysis settings
    if config.analysis.max_chunk_size == 0 {
        anyhow::bail!("analysis.max_chunk_size must be > 0");
    }

    if config.analysis.max_retries == 0 {
        anyhow::bail!("analysis.max_retries must be >= 1");
    }

    Ok(config)
}

/// Resolve the Gemini API credential from the environment.
///
/// Missing, empty, or placeholder values are a configuration error and are
/// rejected here, before any pipeline work begins.
pub fn resolve_api_key() -> Result<String> {
    let value = std::env::var(API_KEY_ENV)
        .map_err(|_| anyhow::anyhow!("{} environment variable not set", API_KEY_ENV))?;

    if value.is_empty() || value == API_KEY_PLACEHOLDER {
        anyhow::bail!(
            "{} is set to a placeholder value; provide a real Gemini API key",
            API_KEY_ENV
        );
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deckaudit.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.model.id, "gemini-2.5-flash");
        assert_eq!(cfg.analysis.max_chunk_size, 8000);
        assert_eq!(cfg.analysis.max_retries, 3);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let (_dir, path) = write_config("[analysis]\nmax_chunk_size = 500\n");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.analysis.max_chunk_size, 500);
        assert_eq!(cfg.analysis.max_retries, 3);
        assert!((cfg.model.temperature - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let (_dir, path) = write_config("[analysis]\nmax_chunk_size = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("max_chunk_size"));
    }

    #[test]
    fn out_of_range_temperature_rejected() {
        let (_dir, path) = write_config("[model]\ntemperature = 3.5\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn zero_retries_rejected() {
        let (_dir, path) = write_config("[analysis]\nmax_retries = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("max_retries"));
    }
}
