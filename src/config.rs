//! Pipeline configuration.
//!
//! Loaded once at process start from a JSON file and passed by reference into
//! each component. Every section has defaults so a minimal file only needs
//! the repository to mine.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for the config file.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "rectify.json";
/// Overrides the analysis backend with a local command.
pub const ANALYSIS_COMMAND_ENV: &str = "RECTIFY_ANALYSIS_COMMAND";
/// Overrides the baseline backend with a local command.
pub const BASELINE_COMMAND_ENV: &str = "RECTIFY_BASELINE_COMMAND";

const DEFAULT_ENDPOINT: &str = "http://localhost:11434/v1/chat/completions";
const DEFAULT_ANALYSIS_MODEL: &str = "qwen2.5-coder:7b";
const DEFAULT_BASELINE_MODEL: &str = "qwen2.5-coder:0.5b";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub schema_version: u32,
    #[serde(default)]
    pub io: IoConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default = "default_analysis_backend")]
    pub analysis_model: ModelBackend,
    #[serde(default = "default_baseline_backend")]
    pub baseline_model: ModelBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IoConfig {
    /// Repository URL or local path to mine.
    pub repo: String,
    /// Clone destination for remote repositories; defaults under the user cache dir.
    pub local_repo_path: Option<PathBuf>,
    pub output_csv_path: PathBuf,
    /// Stop after this many qualifying commits.
    pub processing_limit: Option<usize>,
    /// Only files ending in one of these suffixes become rows.
    pub file_extensions: Vec<String>,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            local_repo_path: None,
            output_csv_path: PathBuf::from("results.csv"),
            processing_limit: None,
            file_extensions: vec![".py".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct InferenceConfig {
    /// Diffs are cut to this many characters before any model sees them.
    pub max_input_chars: usize,
    pub baseline_batch_size: usize,
    /// Stored when the rectify response carries no usable message.
    pub rectify_fallback_message: String,
    /// Stored when the baseline generator answers with a blank message.
    pub baseline_fallback_message: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 4000,
            baseline_batch_size: 8,
            rectify_fallback_message: "fix: rectification failed".to_string(),
            baseline_fallback_message: "fix: baseline unavailable".to_string(),
        }
    }
}

/// How a model is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelBackend {
    /// Local command; prompt on stdin, answer on stdout.
    Command { command: String },
    /// OpenAI-compatible chat completions endpoint.
    Http(HttpBackend),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpBackend {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding a bearer token, if the server needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_output_tokens() -> u32 {
    256
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.8
}

fn default_timeout_secs() -> u64 {
    300
}

fn http_backend(model: &str) -> ModelBackend {
    ModelBackend::Http(HttpBackend {
        endpoint: DEFAULT_ENDPOINT.to_string(),
        model: model.to_string(),
        api_key_env: None,
        max_output_tokens: default_max_output_tokens(),
        temperature: default_temperature(),
        top_p: default_top_p(),
        timeout_secs: default_timeout_secs(),
    })
}

fn default_analysis_backend() -> ModelBackend {
    http_backend(DEFAULT_ANALYSIS_MODEL)
}

fn default_baseline_backend() -> ModelBackend {
    http_backend(DEFAULT_BASELINE_MODEL)
}

/// Build the config written by `rectify init`.
pub fn default_config() -> PipelineConfig {
    PipelineConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        io: IoConfig::default(),
        inference: InferenceConfig::default(),
        analysis_model: default_analysis_backend(),
        baseline_model: default_baseline_backend(),
    }
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: PipelineConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Persist a config in a stable, pretty JSON format.
pub fn write_config(path: &Path, config: &PipelineConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Replace configured backends with commands from the environment, if set.
pub fn apply_env_overrides(config: &mut PipelineConfig) {
    if let Some(command) = env_command(ANALYSIS_COMMAND_ENV) {
        config.analysis_model = ModelBackend::Command { command };
    }
    if let Some(command) = env_command(BASELINE_COMMAND_ENV) {
        config.baseline_model = ModelBackend::Command { command };
    }
}

fn env_command(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Validate settings that every command relies on.
pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.io.output_csv_path.as_os_str().is_empty() {
        return Err(anyhow!("io.output_csv_path must be non-empty"));
    }
    if config.inference.max_input_chars == 0 {
        return Err(anyhow!("inference.max_input_chars must be greater than 0"));
    }
    if config.inference.baseline_batch_size == 0 {
        return Err(anyhow!("inference.baseline_batch_size must be greater than 0"));
    }
    if config.inference.rectify_fallback_message.trim().is_empty() {
        return Err(anyhow!("inference.rectify_fallback_message must be non-empty"));
    }
    if config.inference.baseline_fallback_message.trim().is_empty() {
        return Err(anyhow!("inference.baseline_fallback_message must be non-empty"));
    }
    if config.io.processing_limit == Some(0) {
        return Err(anyhow!("io.processing_limit must be greater than 0 when set"));
    }
    validate_backend(&config.analysis_model, "analysis_model")?;
    validate_backend(&config.baseline_model, "baseline_model")?;
    Ok(())
}

/// Additional checks for `rectify run`, which has to mine something.
pub fn validate_for_run(config: &PipelineConfig) -> Result<()> {
    validate_config(config)?;
    if config.io.repo.trim().is_empty() {
        return Err(anyhow!("io.repo must name a repository URL or path"));
    }
    if config
        .io
        .file_extensions
        .iter()
        .all(|ext| ext.trim().is_empty())
    {
        return Err(anyhow!("io.file_extensions must list at least one suffix"));
    }
    Ok(())
}

fn validate_backend(backend: &ModelBackend, label: &str) -> Result<()> {
    match backend {
        ModelBackend::Command { command } => {
            if command.trim().is_empty() {
                return Err(anyhow!("{label}.command must be non-empty"));
            }
        }
        ModelBackend::Http(settings) => {
            if settings.endpoint.trim().is_empty() {
                return Err(anyhow!("{label}.endpoint must be non-empty"));
            }
            if settings.model.trim().is_empty() {
                return Err(anyhow!("{label}.model must be non-empty"));
            }
            if settings.timeout_secs == 0 {
                return Err(anyhow!("{label}.timeout_secs must be greater than 0"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
