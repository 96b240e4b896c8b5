//! Gallery layout configuration.
//!
//! The layout (media directory, manifest location, categories and the legacy
//! folders to merge) is plain data loaded once per run and validated into an
//! immutable [`Layout`]. Nothing in the crate reads global state.
//!
//! # Configuration File Format
//!
//! Every key is optional. Missing keys fall back to the preset for `mode`:
//!
//! ```toml
//! mode = "consolidate"            # or "simple"
//! media_dir = "media"
//! manifest_path = "media_manifest.json"
//!
//! [[categories]]
//! name = "wins"
//! folder = "wins"
//!
//! [consolidation]
//! target = "general"
//! legacy_folders = ["funny", "toxic", "hackers", "glitch_abuser", "history"]
//! ```

use crate::category::Category;
use crate::consolidator::Consolidation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = ".galleryrc.toml";

/// Default media base directory, relative to the working directory.
pub const DEFAULT_MEDIA_DIR: &str = "media";

/// Default manifest location, relative to the working directory.
pub const DEFAULT_MANIFEST_PATH: &str = "media_manifest.json";

/// Categories of the consolidating layout.
pub const PRIMARY_CATEGORIES: [&str; 3] = ["wins", "losses", "general"];

/// Categories of the older simple layout.
pub const SIMPLE_CATEGORIES: [&str; 7] = [
    "wins",
    "losses",
    "funny",
    "toxic",
    "hackers",
    "glitch_abuser",
    "history",
];

/// Folders merged into [`DEFAULT_TARGET`], in merge order.
pub const LEGACY_FOLDERS: [&str; 5] = ["funny", "toxic", "hackers", "glitch_abuser", "history"];

/// Folder receiving the legacy files.
pub const DEFAULT_TARGET: &str = "general";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A folder name is not a single relative path component.
    #[error("Invalid folder name '{0}': expected a single relative folder name")]
    InvalidFolder(String),

    /// A category name is empty.
    #[error("Category names must not be empty")]
    EmptyCategoryName,

    /// Two categories share a logical name.
    #[error("Duplicate category '{0}'")]
    DuplicateCategory(String),

    /// The consolidation target is not one of the configured categories.
    #[error("Consolidation target '{0}' is not the folder of any configured category")]
    MissingTarget(String),

    /// A legacy folder is also the consolidation target.
    #[error("Legacy folder '{0}' cannot also be the consolidation target")]
    LegacyIsTarget(String),

    /// A legacy folder is the folder of a configured category.
    #[error("Legacy folder '{0}' is also the folder of category '{1}'")]
    LegacyIsCategory(String, String),

    /// No categories are configured.
    #[error("At least one category must be configured")]
    NoCategories,
}

/// Which layout the gallery follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Seven independent categories, nothing is merged.
    Simple,
    /// Legacy folders are merged into `general` before renumbering.
    #[default]
    Consolidate,
}

/// A logical category and the folder backing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub folder: String,
}

/// Which folders get merged, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationConfig {
    pub target: String,
    #[serde(default)]
    pub legacy_folders: Vec<String>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            legacy_folders: LEGACY_FOLDERS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Raw configuration as read from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    #[serde(default)]
    pub mode: Mode,

    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// Explicit categories. Empty means the preset for `mode`.
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,

    /// Explicit consolidation. Absent means the preset; ignored in simple mode.
    #[serde(default)]
    pub consolidation: Option<ConsolidationConfig>,
}

fn default_media_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MEDIA_DIR)
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST_PATH)
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            media_dir: default_media_dir(),
            manifest_path: default_manifest_path(),
            categories: Vec::new(),
            consolidation: None,
        }
    }
}

impl GalleryConfig {
    /// Configuration for the given mode with every other key at its default.
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.galleryrc.toml` in the current directory
    /// 3. Look for `~/.config/gallery-tidy/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("gallery-tidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Validate the configuration and resolve mode presets into a [`Layout`].
    ///
    /// # Errors
    ///
    /// Returns an error for empty or duplicate category names, folder names that are
    /// not a single relative component, or an inconsistent consolidation section.
    pub fn compile(self) -> Result<Layout, ConfigError> {
        let category_configs = if self.categories.is_empty() {
            preset_categories(self.mode)
        } else {
            self.categories
        };

        if category_configs.is_empty() {
            return Err(ConfigError::NoCategories);
        }

        let mut seen = HashSet::new();
        let mut categories = Vec::with_capacity(category_configs.len());
        for CategoryConfig { name, folder } in category_configs {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyCategoryName);
            }
            validate_folder(&folder)?;
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateCategory(name));
            }
            categories.push(Category::new(name, folder));
        }

        let consolidation = match self.mode {
            Mode::Simple => None,
            Mode::Consolidate => {
                let ConsolidationConfig {
                    target,
                    legacy_folders,
                } = self.consolidation.unwrap_or_default();

                validate_folder(&target)?;
                if !categories.iter().any(|c| c.folder() == target) {
                    return Err(ConfigError::MissingTarget(target));
                }
                for folder in &legacy_folders {
                    validate_folder(folder)?;
                    if *folder == target {
                        return Err(ConfigError::LegacyIsTarget(folder.clone()));
                    }
                    // Its files would be merged away and the folder recreated empty.
                    let owner = categories.iter().find(|c| c.folder() == folder.as_str());
                    if let Some(category) = owner {
                        return Err(ConfigError::LegacyIsCategory(
                            folder.clone(),
                            category.name().to_string(),
                        ));
                    }
                }
                Some(Consolidation::new(target, legacy_folders))
            }
        };

        Ok(Layout {
            media_dir: self.media_dir,
            manifest_path: self.manifest_path,
            categories,
            consolidation,
        })
    }
}

fn preset_categories(mode: Mode) -> Vec<CategoryConfig> {
    let names: &[&str] = match mode {
        Mode::Simple => &SIMPLE_CATEGORIES,
        Mode::Consolidate => &PRIMARY_CATEGORIES,
    };
    names
        .iter()
        .map(|name| CategoryConfig {
            name: name.to_string(),
            folder: name.to_string(),
        })
        .collect()
}

/// A folder must be exactly one normal path component below the media directory.
fn validate_folder(folder: &str) -> Result<(), ConfigError> {
    let mut components = Path::new(folder).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !folder.contains(['/', '\\']) => Ok(()),
        _ => Err(ConfigError::InvalidFolder(folder.to_string())),
    }
}

/// Validated, immutable description of one gallery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    media_dir: PathBuf,
    manifest_path: PathBuf,
    categories: Vec<Category>,
    consolidation: Option<Consolidation>,
}

impl Layout {
    /// The media base directory.
    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Where the manifest is written.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Categories in manifest order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The merge step, if this layout has one.
    pub fn consolidation(&self) -> Option<&Consolidation> {
        self.consolidation.as_ref()
    }
}
