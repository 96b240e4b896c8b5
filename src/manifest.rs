//! The gallery manifest: category name to ordered file names.
//!
//! The manifest is rebuilt from scratch on every run and written as a JSON
//! object with 4-space indentation, keys in category order:
//!
//! ```json
//! {
//!     "wins": [
//!         "1.jpg",
//!         "2.png"
//!     ],
//!     "losses": []
//! }
//! ```

use crate::error::{GalleryError, GalleryResult};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::ser::PrettyFormatter;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const INDENT: &[u8] = b"    ";

/// Ordered mapping from category name to the file names it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, Vec<String>)>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the file list of a category. A category seen before keeps its position.
    pub fn insert(&mut self, category: impl Into<String>, files: Vec<String>) {
        let category = category.into();
        match self.entries.iter_mut().find(|(name, _)| *name == category) {
            Some((_, existing)) => *existing = files,
            None => self.entries.push((category, files)),
        }
    }

    /// The file list of a category.
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, files)| files.as_slice())
    }

    /// Categories with their file lists, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, files)| (name.as_str(), files.as_slice()))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files across all categories.
    pub fn total_files(&self) -> usize {
        self.entries.iter().map(|(_, files)| files.len()).sum()
    }

    /// Renders the manifest as indented JSON.
    pub fn to_json(&self) -> GalleryResult<String> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever emits valid UTF-8.
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Writes the manifest to `path`, replacing whatever was there.
    ///
    /// The JSON goes to a temporary file next to `path` which is then renamed
    /// over it, so a failed write leaves the previous manifest untouched.
    ///
    /// # Errors
    ///
    /// Returns `ManifestWriteFailed` if the file cannot be written or replaced.
    pub fn write(&self, path: &Path) -> GalleryResult<()> {
        let json = self.to_json()?;
        let temp_path = temp_path_for(path);

        let written = write_synced(&temp_path, json.as_bytes())
            .and_then(|()| fs::rename(&temp_path, path));

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(GalleryError::ManifestWriteFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }

        log::debug!("Wrote manifest to {}", path.display());
        Ok(())
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, files) in &self.entries {
            map.serialize_entry(category, files)?;
        }
        map.end()
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "manifest".to_string());
    path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()))
}

fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Manifest {
        let mut manifest = Manifest::new();
        manifest.insert("wins", vec!["1.jpg".to_string(), "2.png".to_string()]);
        manifest.insert("losses", vec![]);
        manifest
    }

    #[test]
    fn test_json_uses_four_space_indent_and_insertion_order() {
        let json = sample().to_json().unwrap();
        let expected = "{\n    \"wins\": [\n        \"1.jpg\",\n        \"2.png\"\n    ],\n    \"losses\": []\n}";
        assert_eq!(json, expected);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut manifest = sample();
        manifest.insert("wins", vec!["1.gif".to_string()]);

        let order: Vec<_> = manifest.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["wins", "losses"]);
        assert_eq!(manifest.get("wins"), Some(&["1.gif".to_string()][..]));
        assert_eq!(manifest.total_files(), 1);
    }

    #[test]
    fn test_write_overwrites_previous_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("media_manifest.json");
        fs::write(&path, "{\"stale\": [\"9.jpg\"], \"extra\": []}").unwrap();

        sample().write(&path).expect("write failed");

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"wins": ["1.jpg", "2.png"], "losses": []})
        );

        // No temporary files left behind.
        let leftovers = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_write_failure_keeps_nothing_behind() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("missing").join("media_manifest.json");

        let result = sample().write(&path);

        assert!(matches!(
            result,
            Err(GalleryError::ManifestWriteFailed { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_onto_directory_keeps_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("media_manifest.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "keep").unwrap();

        let result = sample().write(&path);

        assert!(result.is_err());
        assert!(path.join("keep.txt").exists());
    }

    #[test]
    fn test_non_ascii_names_are_written_as_utf8() {
        let mut manifest = Manifest::new();
        manifest.insert("general", vec!["été.png".to_string()]);

        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"été.png\""));
    }
}
