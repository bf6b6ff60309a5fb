use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::discovery::normalize_extension;
use crate::extract::ExtractionStrategy;
use crate::generation::{DEFAULT_SUMMARIZATION_PROMPT, DEFAULT_TRANSLATION_PROMPT, RetryPolicy};
use crate::language::TextDirection;
use crate::paths;
use crate::task::{ProcessingMode, TaskKind};
use crate::writer::{DocumentStyle, OutputFormat};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("missing required configuration: '{0}'")]
    MissingKey(&'static str),

    #[error("invalid configuration value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// `api` section as written in the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
    #[serde(alias = "endpoint")]
    pub base_url: Option<String>,
    /// API key stored directly in config.
    pub api_key: Option<String>,
    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,
    pub model: Option<String>,
}

impl ApiSettings {
    /// Gets the API key, preferring the environment variable over the config file.
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(env_var) = &self.api_key_env
            && let Ok(key) = std::env::var(env_var)
            && !key.trim().is_empty()
        {
            return Some(key.trim().to_string());
        }
        self.api_key
            .as_ref()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    pub mode: ProcessingMode,
    pub file_types: Vec<String>,
    pub pdf_method: ExtractionStrategy,
    pub output_language: String,
    pub output_format: OutputFormat,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Both,
            file_types: vec!["pdf".to_string()],
            pdf_method: ExtractionStrategy::Extract,
            output_language: "English".to_string(),
            output_format: OutputFormat::Docx,
        }
    }
}

/// `paths` section as written in the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub input_dir: Option<PathBuf>,
    pub translate_dir: Option<PathBuf>,
    pub summarize_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub translation: String,
    pub summarization: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            translation: DEFAULT_TRANSLATION_PROMPT.to_string(),
            summarization: DEFAULT_SUMMARIZATION_PROMPT.to_string(),
        }
    }
}

impl PromptSettings {
    pub fn template(&self, task: TaskKind) -> &str {
        match task {
            TaskKind::Translation => &self.translation,
            TaskKind::Summarization => &self.summarization,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout: u64,
    pub show_progress: bool,
    pub continue_on_error: bool,
    /// Skip tasks whose output file already exists.
    pub skip_existing: bool,
    /// Truncate extracted text to this many characters; `0` disables.
    pub max_content_chars: usize,
    pub show_timing: bool,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            max_tokens: 16000,
            temperature: 0.3,
            timeout: 300,
            show_progress: true,
            continue_on_error: true,
            skip_existing: true,
            max_content_chars: 0,
            show_timing: false,
            max_retries: 0,
            retry_base_delay_ms: 1000,
        }
    }
}

impl AdvancedSettings {
    /// Retry policy whose delays never exceed the request timeout.
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: std::time::Duration::from_millis(self.retry_base_delay_ms),
            max_delay: std::time::Duration::from_secs(self.timeout),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    pub name: String,
    pub size: u32,
    pub heading_size: u32,
}

impl Default for FontSettings {
    fn default() -> Self {
        let style = DocumentStyle::default();
        Self {
            name: style.font_name,
            size: style.font_size,
            heading_size: style.heading_size,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormattingSettings {
    pub font: FontSettings,
    pub text_direction: TextDirection,
}

/// The configuration file structure.
///
/// Every section is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub api: ApiSettings,
    pub processing: ProcessingSettings,
    pub paths: PathSettings,
    pub prompts: PromptSettings,
    pub advanced: AdvancedSettings,
    pub formatting: FormattingSettings,
}

impl ConfigFile {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Resolved API settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Resolved input and output roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    pub input_dir: PathBuf,
    pub translate_dir: PathBuf,
    pub summarize_dir: PathBuf,
}

/// Resolved configuration for one run. Immutable once built.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub processing: ProcessingSettings,
    pub paths: PathConfig,
    pub prompts: PromptSettings,
    pub advanced: AdvancedSettings,
    pub formatting: FormattingSettings,
}

impl Config {
    /// Output root for a task.
    pub fn output_dir(&self, task: TaskKind) -> &Path {
        match task {
            TaskKind::Translation => &self.paths.translate_dir,
            TaskKind::Summarization => &self.paths.summarize_dir,
        }
    }

    pub fn document_style(&self) -> DocumentStyle {
        let font = &self.formatting.font;
        DocumentStyle {
            font_name: font.name.clone(),
            font_size: font.size,
            heading_size: font.heading_size,
            rtl: self
                .formatting
                .text_direction
                .is_rtl(&self.processing.output_language),
        }
    }
}

/// Command-line overrides that take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub mode: Option<ProcessingMode>,
    pub model: Option<String>,
    /// Output language override.
    pub to: Option<String>,
}

/// Resolves configuration by merging CLI options with config file settings.
///
/// # Errors
///
/// Returns an error if a required key (API key, model, input directory) is
/// missing or a value is out of range.
pub fn resolve_config(
    options: &ResolveOptions,
    config_file: &ConfigFile,
) -> Result<Config, ConfigError> {
    let api_key = config_file.api.get_api_key().ok_or_else(|| {
        if config_file.api.api_key_env.is_some() {
            ConfigError::MissingKey("api.api_key (or the variable named by api.api_key_env)")
        } else {
            ConfigError::MissingKey("api.api_key")
        }
    })?;

    let model = options
        .model
        .as_ref()
        .or(config_file.api.model.as_ref())
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or(ConfigError::MissingKey("api.model"))?;

    let base_url = config_file
        .api
        .base_url
        .as_ref()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let input_dir = config_file
        .paths
        .input_dir
        .clone()
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or(ConfigError::MissingKey("paths.input_dir"))?;

    let mut processing = config_file.processing.clone();
    if let Some(mode) = options.mode {
        processing.mode = mode;
    }
    if let Some(to) = &options.to {
        processing.output_language.clone_from(to);
    }
    processing.file_types = processing
        .file_types
        .iter()
        .map(|ext| normalize_extension(ext))
        .filter(|ext| !ext.is_empty())
        .collect();
    processing.file_types.sort();
    processing.file_types.dedup();

    if processing.file_types.is_empty() {
        return Err(ConfigError::Invalid {
            key: "processing.file_types",
            reason: "at least one file type is required".to_string(),
        });
    }

    let advanced = config_file.advanced.clone();
    if advanced.max_tokens == 0 {
        return Err(ConfigError::Invalid {
            key: "advanced.max_tokens",
            reason: "must be a positive integer".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&advanced.temperature) {
        return Err(ConfigError::Invalid {
            key: "advanced.temperature",
            reason: format!("{} is outside [0, 1]", advanced.temperature),
        });
    }
    if advanced.timeout == 0 {
        return Err(ConfigError::Invalid {
            key: "advanced.timeout",
            reason: "must be at least one second".to_string(),
        });
    }

    Ok(Config {
        api: ApiConfig {
            base_url,
            api_key,
            model,
        },
        processing,
        paths: PathConfig {
            input_dir,
            translate_dir: config_file
                .paths
                .translate_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("translates")),
            summarize_dir: config_file
                .paths
                .summarize_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("summaries")),
        },
        prompts: config_file.prompts.clone(),
        advanced,
        formatting: config_file.formatting.clone(),
    })
}

/// Manages loading the configuration file.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Uses `path` if given, otherwise the default location.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            config_path: path.unwrap_or_else(paths::default_config_path),
        }
    }

    pub const fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Reads and parses the file; `.toml` files are parsed as TOML, anything else as YAML.
    pub fn load(&self) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(&self.config_path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound(self.config_path.clone())
            } else {
                ConfigError::Read {
                    path: self.config_path.clone(),
                    source,
                }
            }
        })?;

        let is_toml = self
            .config_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let parsed = if is_toml {
            ConfigFile::from_toml(&contents)
        } else {
            ConfigFile::from_yaml(&contents)
        };

        parsed.map_err(|e| match e {
            ConfigError::Parse(message) => {
                ConfigError::Parse(format!("{}: {message}", self.config_path.display()))
            }
            other => other,
        })
    }

    /// Loads the file and resolves it against `options`.
    pub fn load_resolved(&self, options: &ResolveOptions) -> Result<Config, ConfigError> {
        resolve_config(options, &self.load()?)
    }
}
