//! Project settings (`.intl-db.json`).

/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Project file matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    CONFIG_FILE_NAME,
    ConfigError,
    I18nSettings,
    IndexingConfig,
    OutputConfig,
    ValidationError,
};
