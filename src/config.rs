//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/taxpick/taxpick.toml`
//! 3. Local config: `<project_dir>/.taxpick.toml`
//! 4. Environment variables: `TAXPICK_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::PickerOptions;
use crate::application::ApplicationError;
use crate::domain::DEFAULT_DEPTH;

/// Default number of children requested per query.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Analytics settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Log user actions as analytics events
    pub enabled: bool,
    /// First part of the event label, e.g. "Preprints"
    pub label_prefix: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            label_prefix: "Preprints".into(),
        }
    }
}

/// Raw analytics config for intermediate parsing (None means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawAnalyticsConfig {
    pub enabled: Option<bool>,
    pub label_prefix: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub taxonomy_file: Option<PathBuf>,
    pub selection_file: Option<PathBuf>,
    pub depth: Option<usize>,
    pub page_size: Option<usize>,
    pub edit_mode: Option<bool>,
    #[serde(default)]
    pub analytics: RawAnalyticsConfig,
}

/// Unified configuration for taxpick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Taxonomy document (TOML or JSON)
    pub taxonomy_file: PathBuf,
    /// Where the selected subjects are saved (JSON)
    pub selection_file: PathBuf,
    /// Number of taxonomy tiers
    pub depth: usize,
    /// Maximum children returned per query
    pub page_size: usize,
    /// Editing an existing item instead of a new submission
    pub edit_mode: bool,
    pub analytics: AnalyticsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let taxonomy_file = global_config_dir()
            .map(|dir| dir.join("taxonomy.toml"))
            .unwrap_or_else(|| PathBuf::from("taxonomy.toml"));

        Self {
            taxonomy_file,
            selection_file: PathBuf::from("subjects.json"),
            depth: DEFAULT_DEPTH,
            page_size: DEFAULT_PAGE_SIZE,
            edit_mode: false,
            analytics: AnalyticsConfig::default(),
        }
    }
}

/// Get the XDG config directory for taxpick.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "taxpick").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("taxpick.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".taxpick.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Picker options derived from these settings.
    pub fn picker_options(&self) -> PickerOptions {
        PickerOptions {
            depth: self.depth,
            edit_mode: self.edit_mode,
            label_prefix: self.analytics.label_prefix.clone(),
        }
    }

    /// Expand shell variables and tilde in path fields.
    fn expand_paths(&mut self) {
        self.taxonomy_file = expand_path(&self.taxonomy_file);
        self.selection_file = expand_path(&self.selection_file);
    }

    /// Resolve relative file paths against `base`.
    fn anchor_paths(&mut self, base: &Path) {
        if self.taxonomy_file.is_relative() {
            self.taxonomy_file = base.join(&self.taxonomy_file);
        }
        if self.selection_file.is_relative() {
            self.selection_file = base.join(&self.selection_file);
        }
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            taxonomy_file: overlay
                .taxonomy_file
                .clone()
                .unwrap_or_else(|| self.taxonomy_file.clone()),
            selection_file: overlay
                .selection_file
                .clone()
                .unwrap_or_else(|| self.selection_file.clone()),
            depth: overlay.depth.unwrap_or(self.depth),
            page_size: overlay.page_size.unwrap_or(self.page_size),
            edit_mode: overlay.edit_mode.unwrap_or(self.edit_mode),
            analytics: AnalyticsConfig {
                enabled: overlay.analytics.enabled.unwrap_or(self.analytics.enabled),
                label_prefix: overlay
                    .analytics
                    .label_prefix
                    .clone()
                    .unwrap_or_else(|| self.analytics.label_prefix.clone()),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config; relative
    ///   file paths are resolved against it
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local project config
        if let Some(project) = project_dir {
            let local_path = local_config_path(project);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        if let Some(project) = project_dir {
            current.anchor_paths(project);
        }
        current.validate()?;

        Ok(current)
    }

    /// Apply TAXPICK_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TAXPICK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("taxonomy_file") {
            settings.taxonomy_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("selection_file") {
            settings.selection_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_int("depth") {
            settings.depth = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("invalid depth: {}", val),
            })?;
        }
        if let Ok(val) = config.get_int("page_size") {
            settings.page_size = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("invalid page_size: {}", val),
            })?;
        }
        if let Ok(val) = config.get_bool("edit_mode") {
            settings.edit_mode = val;
        }
        if let Ok(val) = config.get_bool("analytics.enabled") {
            settings.analytics.enabled = val;
        }
        if let Ok(val) = config.get_string("analytics.label_prefix") {
            settings.analytics.label_prefix = val;
        }

        Ok(settings)
    }

    /// Reject settings the picker cannot run with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.depth == 0 {
            return Err(ApplicationError::Config {
                message: "depth must be at least 1".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ApplicationError::Config {
                message: "page_size must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# taxpick configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/taxpick/taxpick.toml
#   Local:  <project>/.taxpick.toml
#   Env:    TAXPICK_* environment variables (TAXPICK_ANALYTICS__ENABLED=false)

# Taxonomy document, TOML or JSON
# taxonomy_file = "~/.config/taxpick/taxonomy.toml"

# Where selected subjects are saved
# selection_file = "subjects.json"

# Number of taxonomy tiers
# depth = 3

# Maximum children returned per query
# page_size = 100

# Editing an existing item (changes the analytics label only)
# edit_mode = false

[analytics]
# enabled = true
# label_prefix = "Preprints"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
