//! Configuration management for mdwiki.
//!
//! Parses `mdwiki.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `render.link_prefix`
//! - `pages.source_dir`
//!
//! A value without `${` is taken literally, so a bare `$` needs no escaping.

use std::borrow::Cow;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the wiki link prefix.
    pub link_prefix: Option<String>,
    /// Override the page source directory.
    pub source_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdwiki.toml";

const DEFAULT_LINK_PREFIX: &str = "/view/";
const DEFAULT_SOURCE_DIR: &str = "data";
const DEFAULT_EXTENSION: &str = ".md";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rendering configuration.
    pub render: RenderConfig,
    /// Page storage configuration (paths are relative strings from TOML).
    pages: PagesConfigRaw,

    /// Resolved page storage configuration (set after loading).
    #[serde(skip)]
    pub pages_resolved: PagesConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Prefix prepended to page titles in wiki link targets.
    pub link_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            link_prefix: DEFAULT_LINK_PREFIX.to_owned(),
        }
    }
}

/// Raw page configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PagesConfigRaw {
    source_dir: Option<String>,
    extension: Option<String>,
}

/// Resolved page storage configuration with absolute paths.
#[derive(Debug, Default)]
pub struct PagesConfig {
    /// Directory holding one file per page.
    pub source_dir: PathBuf,
    /// Page file extension, including the leading dot.
    pub extension: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`render.link_prefix`").
        field: String,
        /// Error message (e.g., "${`WIKI_PREFIX`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdwiki.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(link_prefix) = &settings.link_prefix {
            self.render.link_prefix.clone_from(link_prefix);
        }
        if let Some(source_dir) = &settings.source_dir {
            self.pages_resolved.source_dir.clone_from(source_dir);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            render: RenderConfig::default(),
            pages: PagesConfigRaw::default(),
            pages_resolved: PagesConfig {
                source_dir: base.join(DEFAULT_SOURCE_DIR),
                extension: DEFAULT_EXTENSION.to_owned(),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_render()?;
        self.validate_pages()?;
        Ok(())
    }

    /// The link prefix ends up inside an `href` attribute.
    fn validate_render(&self) -> Result<(), ConfigError> {
        let prefix = &self.render.link_prefix;
        if let Some(c) = prefix
            .chars()
            .find(|&c| matches!(c, '"' | '<' | '>') || c.is_whitespace())
        {
            return Err(ConfigError::Validation(format!(
                "render.link_prefix cannot contain {c:?}"
            )));
        }
        Ok(())
    }

    fn validate_pages(&self) -> Result<(), ConfigError> {
        let extension = &self.pages_resolved.extension;
        if !extension.starts_with('.') || extension.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "pages.extension must start with '.' and name an extension, got {extension:?}"
            )));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.expand_vars_with(&|name| std::env::var(name).ok())
    }

    /// Expand `${VAR}` references, resolving names through `lookup`.
    fn expand_vars_with(&mut self, lookup: &dyn Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        self.render.link_prefix = expand_field(&self.render.link_prefix, "render.link_prefix", lookup)?;

        if let Some(dir) = self.pages.source_dir.take() {
            self.pages.source_dir = Some(expand_field(&dir, "pages.source_dir", lookup)?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.pages_resolved = PagesConfig {
            source_dir: config_dir.join(
                self.pages
                    .source_dir
                    .as_deref()
                    .unwrap_or(DEFAULT_SOURCE_DIR),
            ),
            extension: self
                .pages
                .extension
                .clone()
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_owned()),
        };
    }
}

fn expand_field(
    value: &str,
    field: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    // An unset variable is an error unless the reference carries a default.
    shellexpand::env_with_context(value, |name| lookup(name).map(Some).ok_or(()))
        .map(Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} is not set", e.var_name),
        })
}
