//! Directory listing and file name helpers.
//!
//! Every stage of a run looks at folders the same way: only regular files,
//! never hidden ones, ordered by plain code point comparison of their names.

use crate::error::{GalleryError, GalleryResult};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// A visible regular file discovered inside a gallery folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// The file name as recorded in the manifest.
    pub name: String,
    /// The full path to the file.
    pub path: PathBuf,
}

impl FileEntry {
    /// Creates an entry for `name` inside `dir`.
    pub fn new(dir: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = dir.join(&name);
        Self { name, path }
    }
}

/// Returns true for names that start with a dot.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Lists the non-hidden regular files directly inside `dir`, sorted by name.
///
/// Symlinks count as files when they point at one. Entries that cannot be
/// inspected are skipped.
pub fn list_visible_files(dir: &Path) -> GalleryResult<Vec<FileEntry>> {
    let entries = fs::read_dir(dir).map_err(|e| GalleryError::ReadDirFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files: Vec<FileEntry> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if is_hidden(&name) || !path.is_file() {
                return None;
            }
            Some(FileEntry { name, path })
        })
        .collect();

    sort_entries(&mut files);
    Ok(files)
}

/// Sorts entries by name using code point order ("10.png" before "2.png").
pub fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Splits a file name into stem and extension, keeping the dot on the extension.
///
/// Leading dots never start an extension, so `.profile` has none.
///
/// ```
/// use gallery_tidy::scan::split_extension;
///
/// assert_eq!(split_extension("clip.MP4"), ("clip", ".MP4"));
/// assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
/// assert_eq!(split_extension("README"), ("README", ""));
/// ```
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if !name[..idx].chars().all(|c| c == '.') => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Returns true if anything (file, folder, dangling symlink) sits at `path`.
pub fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Picks a free name for `file_name` inside `dir`.
///
/// The name itself is used when free; otherwise `_1`, `_2`, ... is inserted
/// before the extension until `is_taken` reports a free path. The name is
/// kept byte for byte, including names that are not valid UTF-8.
pub fn unique_path(
    dir: &Path,
    file_name: impl AsRef<OsStr>,
    is_taken: impl Fn(&Path) -> bool,
) -> PathBuf {
    let file_name = file_name.as_ref();
    let candidate = dir.join(file_name);
    if !is_taken(&candidate) {
        return candidate;
    }

    let (stem, ext) = split_os_extension(file_name);
    let mut counter: u64 = 1;
    loop {
        let mut name = stem.clone();
        name.push(format!("_{counter}"));
        name.push(&ext);
        let candidate = dir.join(name);
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// [`split_extension`] for names that may not be UTF-8.
fn split_os_extension(file_name: &OsStr) -> (OsString, OsString) {
    if let Some(name) = file_name.to_str() {
        let (stem, ext) = split_extension(name);
        return (stem.into(), ext.into());
    }

    let path = Path::new(file_name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            let mut dotted = OsString::from(".");
            dotted.push(ext);
            (stem.to_os_string(), dotted)
        }
        _ => (file_name.to_os_string(), OsString::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.jpg"), ("a", ".jpg"));
        assert_eq!(split_extension("b.PNG"), ("b", ".PNG"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension("trailing."), ("trailing", "."));
        assert_eq!(split_extension("..x"), ("..x", ""));
        assert_eq!(split_extension(".hidden.txt"), (".hidden", ".txt"));
    }

    #[test]
    fn test_list_skips_hidden_and_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("b.png"), "b").unwrap();
        fs::write(dir.join("a.jpg"), "a").unwrap();
        fs::write(dir.join(".DS_Store"), "meta").unwrap();
        fs::create_dir(dir.join("nested")).unwrap();

        let files = list_visible_files(dir).expect("listing failed");
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn test_list_sorts_by_code_point() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        for name in ["2.png", "10.png", "B.gif", "a.gif"] {
            fs::write(dir.join(name), name).unwrap();
        }

        let files = list_visible_files(dir).expect("listing failed");
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["10.png", "2.png", "B.gif", "a.gif"]);
    }

    #[test]
    fn test_list_missing_directory_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = list_visible_files(&temp_dir.path().join("missing"));
        assert!(matches!(result, Err(GalleryError::ReadDirFailed { .. })));
    }

    #[test]
    fn test_unique_path_appends_counter() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        assert_eq!(unique_path(dir, "x.gif", is_occupied), dir.join("x.gif"));

        fs::write(dir.join("x.gif"), "one").unwrap();
        fs::write(dir.join("x_1.gif"), "two").unwrap();
        assert_eq!(unique_path(dir, "x.gif", is_occupied), dir.join("x_2.gif"));
    }

    #[test]
    fn test_unique_path_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("notes"), "n").unwrap();

        assert_eq!(unique_path(dir, "notes", is_occupied), dir.join("notes_1"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unique_path_keeps_non_utf8_bytes() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        let name = OsStr::from_bytes(b"x\xff.gif");
        fs::write(dir.join(name), "taken").unwrap();

        let free = unique_path(dir, name, is_occupied);

        let bytes = free.file_name().unwrap().to_os_string().into_vec();
        assert_eq!(bytes, b"x\xff_1.gif".to_vec());
    }
}
