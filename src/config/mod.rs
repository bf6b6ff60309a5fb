mod manager;

pub use manager::{
    AdvancedSettings, ApiConfig, ApiSettings, Config, ConfigError, ConfigFile, ConfigManager,
    DEFAULT_BASE_URL, FontSettings, FormattingSettings, PathConfig, PathSettings,
    ProcessingSettings, PromptSettings, ResolveOptions, resolve_config,
};
