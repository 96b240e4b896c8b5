/// Gallery categories and the folders backing them.
///
/// A category is a logical name (the manifest key) mapped to a folder below
/// the media directory. Resolving a category makes sure its folder exists.
///
/// # Examples
///
/// ```
/// use gallery_tidy::category::Category;
/// use std::path::Path;
///
/// let wins = Category::new("wins", "wins");
/// assert_eq!(wins.path(Path::new("media")), Path::new("media/wins"));
/// ```
use crate::error::{GalleryError, GalleryResult};
use std::fs;
use std::path::{Path, PathBuf};

/// A logical category and its folder name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category {
    name: String,
    folder: String,
}

impl Category {
    /// Creates a category. The folder is relative to the media directory.
    pub fn new(name: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
        }
    }

    /// The manifest key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The folder name below the media directory.
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// The folder path below `media_dir`.
    pub fn path(&self, media_dir: &Path) -> PathBuf {
        media_dir.join(&self.folder)
    }
}

/// What resolving a folder found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The folder was already there.
    Existing(PathBuf),
    /// The folder was missing and has been created (or would be, in a dry run).
    Created(PathBuf),
}

impl Resolution {
    /// The resolved folder path.
    pub fn path(&self) -> &Path {
        match self {
            Resolution::Existing(path) | Resolution::Created(path) => path,
        }
    }

    /// True if the folder did not exist before.
    pub fn is_created(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }
}

/// Makes sure `path` is a directory, creating it and its parents if missing.
///
/// In a dry run nothing is created; a missing folder still reports `Created`.
///
/// # Errors
///
/// Returns `NotADirectory` if something other than a directory sits at `path`,
/// and `DirectoryCreationFailed` if the folder cannot be created.
pub fn ensure_directory(path: &Path, dry_run: bool) -> GalleryResult<Resolution> {
    if path.is_dir() {
        return Ok(Resolution::Existing(path.to_path_buf()));
    }
    if path.exists() {
        return Err(GalleryError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    if !dry_run {
        fs::create_dir_all(path).map_err(|e| GalleryError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::debug!("Created directory {}", path.display());
    }

    Ok(Resolution::Created(path.to_path_buf()))
}

/// Resolves categories to folders below one media directory.
#[derive(Debug, Clone)]
pub struct CategoryResolver {
    media_dir: PathBuf,
    dry_run: bool,
}

impl CategoryResolver {
    /// Creates a resolver for `media_dir`.
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
            dry_run: false,
        }
    }

    /// When set, missing folders are reported but not created.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The media directory categories live in.
    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Resolves a category folder, creating it when missing.
    ///
    /// A freshly created folder has nothing in it, so callers record an empty
    /// file list for it and skip further processing this run.
    pub fn resolve(&self, category: &Category) -> GalleryResult<Resolution> {
        ensure_directory(&category.path(&self.media_dir), self.dry_run)
    }
}
