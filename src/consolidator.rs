/// Merging of legacy category folders into one target folder.
///
/// Each legacy folder's visible files are moved (never copied) into the target
/// folder. Name collisions get a `_N` suffix, failures are recorded per file,
/// and a legacy folder left empty is removed afterwards.
use crate::category::{Resolution, ensure_directory};
use crate::error::{GalleryError, GalleryResult};
use crate::scan::{self, FileEntry};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The legacy folders to merge and the folder receiving their files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consolidation {
    target: String,
    legacy_folders: Vec<String>,
}

impl Consolidation {
    /// Creates a consolidation step. Folders are relative to the media directory.
    pub fn new(target: impl Into<String>, legacy_folders: Vec<String>) -> Self {
        Self {
            target: target.into(),
            legacy_folders,
        }
    }

    /// The folder receiving legacy files.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Legacy folders in merge order.
    pub fn legacy_folders(&self) -> &[String] {
        &self.legacy_folders
    }
}

/// A single file moved into the target folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Where the file was.
    pub source: PathBuf,
    /// Where the file is now.
    pub destination: PathBuf,
}

impl MoveRecord {
    /// The file name at the destination.
    pub fn destination_name(&self) -> String {
        file_name_of(&self.destination)
    }

    /// True if the file had to take a suffixed name to avoid a collision.
    pub fn was_renamed(&self) -> bool {
        self.source.file_name() != self.destination.file_name()
    }
}

/// What happened to a legacy folder after its files were processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleanup {
    /// The folder did not exist, or is not a directory; nothing to do.
    Skipped,
    /// The folder was empty and has been removed.
    Removed,
    /// The folder still holds entries (failed moves, hidden files, subfolders).
    Retained { remaining: usize },
    /// The folder was empty but could not be removed.
    Failed(String),
}

/// Outcome of merging one legacy folder.
#[derive(Debug, Clone)]
pub struct FolderReport {
    /// The legacy folder name.
    pub folder: String,
    /// The legacy folder path.
    pub path: PathBuf,
    /// Files moved into the target.
    pub moved: Vec<MoveRecord>,
    /// Files that could not be moved, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// What happened to the folder itself.
    pub cleanup: Cleanup,
}

impl FolderReport {
    fn new(folder: &str, path: PathBuf) -> Self {
        Self {
            folder: folder.to_string(),
            path,
            moved: Vec::new(),
            failed: Vec::new(),
            cleanup: Cleanup::Skipped,
        }
    }
}

/// Outcome of the whole consolidation step.
#[derive(Debug, Clone)]
pub struct ConsolidationReport {
    /// The target folder.
    pub target: PathBuf,
    /// True if the target folder had to be created.
    pub target_created: bool,
    /// Per legacy folder results, in merge order.
    pub folders: Vec<FolderReport>,
}

impl ConsolidationReport {
    /// Number of files moved across all legacy folders.
    pub fn moved_count(&self) -> usize {
        self.folders.iter().map(|f| f.moved.len()).sum()
    }

    /// Number of files that could not be moved.
    pub fn failed_count(&self) -> usize {
        self.folders.iter().map(|f| f.failed.len()).sum()
    }

    /// Emptied legacy folders that could not be removed.
    pub fn cleanup_failures(&self) -> usize {
        self.folders
            .iter()
            .filter(|f| matches!(f.cleanup, Cleanup::Failed(_)))
            .count()
    }

    /// Moves that needed a collision suffix.
    pub fn collisions(&self) -> impl Iterator<Item = &MoveRecord> {
        self.folders
            .iter()
            .flat_map(|f| f.moved.iter())
            .filter(|m| m.was_renamed())
    }

    /// File names arriving in the target folder, in move order.
    pub fn arrivals(&self) -> Vec<String> {
        self.folders
            .iter()
            .flat_map(|f| f.moved.iter())
            .map(MoveRecord::destination_name)
            .collect()
    }

    /// Legacy folders that were removed.
    pub fn removed_folders(&self) -> impl Iterator<Item = &FolderReport> {
        self.folders
            .iter()
            .filter(|f| f.cleanup == Cleanup::Removed)
    }
}

/// Moves legacy folder contents into the target folder.
pub struct Consolidator {
    media_dir: PathBuf,
    plan: Consolidation,
    dry_run: bool,
    // Names handed out during a dry run, since nothing lands on disk.
    claimed: HashSet<PathBuf>,
}

impl Consolidator {
    /// Creates a consolidator for `plan` below `media_dir`.
    pub fn new(media_dir: impl Into<PathBuf>, plan: Consolidation) -> Self {
        Self {
            media_dir: media_dir.into(),
            plan,
            dry_run: false,
            claimed: HashSet::new(),
        }
    }

    /// When set, moves and removals are planned but not performed.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The target folder path.
    pub fn target_dir(&self) -> PathBuf {
        self.media_dir.join(&self.plan.target)
    }

    /// Runs the merge for every legacy folder, in order.
    ///
    /// # Errors
    ///
    /// Fails only if the target folder cannot be created; legacy folders are then
    /// left untouched. Per-file and cleanup failures are recorded in the report.
    pub fn run(&mut self) -> GalleryResult<ConsolidationReport> {
        let target = ensure_directory(&self.target_dir(), self.dry_run)?;
        if let Resolution::Created(path) = &target {
            log::info!("Created consolidation target {}", path.display());
        }

        let legacy_folders = self.plan.legacy_folders.clone();
        let folders = legacy_folders
            .iter()
            .map(|folder| self.consolidate_folder(folder))
            .collect();

        Ok(ConsolidationReport {
            target: target.path().to_path_buf(),
            target_created: target.is_created(),
            folders,
        })
    }

    /// Moves every visible file of one legacy folder into the target, then removes
    /// the folder if nothing is left in it.
    pub fn consolidate_folder(&mut self, folder: &str) -> FolderReport {
        let legacy_dir = self.media_dir.join(folder);
        let mut report = FolderReport::new(folder, legacy_dir.clone());

        if !legacy_dir.is_dir() {
            log::debug!("Legacy folder {} not present", legacy_dir.display());
            return report;
        }

        let files = match scan::list_visible_files(&legacy_dir) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("{}", e);
                report.failed.push((legacy_dir, e.to_string()));
                return report;
            }
        };

        for file in &files {
            match self.move_into_target(file) {
                Ok(record) => report.moved.push(record),
                Err(e) => {
                    log::warn!("{}", e);
                    report.failed.push((file.path.clone(), e.to_string()));
                }
            }
        }

        report.cleanup = self.cleanup(&legacy_dir, report.moved.len());
        report
    }

    /// Moves one file into the target folder under a free name.
    ///
    /// # Errors
    ///
    /// Returns `MoveFailed` if the file cannot be moved; it then stays where it was.
    pub fn move_into_target(&mut self, file: &FileEntry) -> GalleryResult<MoveRecord> {
        let target_dir = self.target_dir();
        // `file.name` is lossy; the move keeps the name as it is on disk.
        let file_name: OsString = file
            .path
            .file_name()
            .map_or_else(|| file.name.clone().into(), OsStr::to_os_string);
        let destination = scan::unique_path(&target_dir, &file_name, |candidate| {
            scan::is_occupied(candidate) || self.claimed.contains(candidate)
        });

        if self.dry_run {
            self.claimed.insert(destination.clone());
        } else {
            move_file(&file.path, &destination).map_err(|e| GalleryError::MoveFailed {
                from: file.path.clone(),
                to: destination.clone(),
                source: e,
            })?;
            log::debug!(
                "Moved {} -> {}",
                file.path.display(),
                destination.display()
            );
        }

        Ok(MoveRecord {
            source: file.path.clone(),
            destination,
        })
    }

    fn cleanup(&self, legacy_dir: &Path, moved: usize) -> Cleanup {
        let remaining = match fs::read_dir(legacy_dir) {
            Ok(entries) => entries.count(),
            Err(e) => return Cleanup::Failed(e.to_string()),
        };
        // Planned moves have not happened yet in a dry run.
        let remaining = if self.dry_run {
            remaining.saturating_sub(moved)
        } else {
            remaining
        };

        if remaining > 0 {
            return Cleanup::Retained { remaining };
        }
        if self.dry_run {
            return Cleanup::Removed;
        }

        match fs::remove_dir(legacy_dir) {
            Ok(()) => {
                log::debug!("Removed empty folder {}", legacy_dir.display());
                Cleanup::Removed
            }
            Err(e) => {
                let error = GalleryError::CleanupFailed {
                    path: legacy_dir.to_path_buf(),
                    source: e,
                };
                log::warn!("{}", error);
                Cleanup::Failed(error.to_string())
            }
        }
    }
}

/// Moves a file, falling back to copy and delete across filesystems.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(source, destination)?;
            if let Err(e) = fs::remove_file(source) {
                // Keep a single copy on disk.
                let _ = fs::remove_file(destination);
                return Err(e);
            }
            Ok(())
        }
        result => result,
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn consolidation(legacy: &[&str]) -> Consolidation {
        Consolidation::new("general", legacy.iter().map(|f| f.to_string()).collect())
    }

    #[test]
    fn test_merge_creates_target_and_removes_empty_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media = temp_dir.path();
        fs::create_dir(media.join("funny")).unwrap();
        fs::write(media.join("funny").join("clip.mp4"), "clip").unwrap();

        let report = Consolidator::new(media, consolidation(&["funny"]))
            .run()
            .expect("consolidation failed");

        assert!(report.target_created);
        assert_eq!(report.moved_count(), 1);
        assert!(media.join("general").join("clip.mp4").is_file());
        assert!(!media.join("funny").exists());
        assert_eq!(report.folders[0].cleanup, Cleanup::Removed);
    }

    #[test]
    fn test_collision_gets_suffix_and_keeps_both_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media = temp_dir.path();
        fs::create_dir_all(media.join("general")).unwrap();
        fs::create_dir(media.join("funny")).unwrap();
        fs::create_dir(media.join("toxic")).unwrap();
        fs::write(media.join("funny").join("x.gif"), "funny").unwrap();
        fs::write(media.join("toxic").join("x.gif"), "toxic").unwrap();

        let report = Consolidator::new(media, consolidation(&["funny", "toxic"]))
            .run()
            .expect("consolidation failed");

        let general = media.join("general");
        assert_eq!(fs::read_to_string(general.join("x.gif")).unwrap(), "funny");
        assert_eq!(fs::read_to_string(general.join("x_1.gif")).unwrap(), "toxic");
        assert_eq!(report.collisions().count(), 1);
        assert_eq!(report.arrivals(), vec!["x.gif", "x_1.gif"]);
        assert_eq!(report.removed_folders().count(), 2);
    }

    #[test]
    fn test_collision_with_existing_target_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media = temp_dir.path();
        fs::create_dir_all(media.join("general")).unwrap();
        fs::create_dir(media.join("history")).unwrap();
        fs::write(media.join("general").join("1.png"), "existing").unwrap();
        fs::write(media.join("general").join("1_1.png"), "existing too").unwrap();
        fs::write(media.join("history").join("1.png"), "legacy").unwrap();

        let report = Consolidator::new(media, consolidation(&["history"]))
            .run()
            .expect("consolidation failed");

        assert_eq!(report.arrivals(), vec!["1_2.png"]);
        assert_eq!(
            fs::read_to_string(media.join("general").join("1_2.png")).unwrap(),
            "legacy"
        );
    }

    #[test]
    fn test_hidden_files_and_subfolders_keep_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media = temp_dir.path();
        let hackers = media.join("hackers");
        fs::create_dir_all(hackers.join("nested")).unwrap();
        fs::write(hackers.join(".DS_Store"), "meta").unwrap();
        fs::write(hackers.join("cheat.png"), "png").unwrap();

        let report = Consolidator::new(media, consolidation(&["hackers"]))
            .run()
            .expect("consolidation failed");

        assert_eq!(report.moved_count(), 1);
        assert_eq!(report.folders[0].cleanup, Cleanup::Retained { remaining: 2 });
        assert!(hackers.join(".DS_Store").exists());
        assert!(hackers.join("nested").is_dir());
    }

    #[test]
    fn test_missing_legacy_folder_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let report = Consolidator::new(temp_dir.path(), consolidation(&["glitch_abuser"]))
            .run()
            .expect("consolidation failed");

        assert_eq!(report.moved_count(), 0);
        assert_eq!(report.folders[0].cleanup, Cleanup::Skipped);
    }

    #[test]
    fn test_dry_run_plans_collisions_without_touching_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media = temp_dir.path();
        fs::create_dir(media.join("funny")).unwrap();
        fs::create_dir(media.join("toxic")).unwrap();
        fs::write(media.join("funny").join("x.gif"), "funny").unwrap();
        fs::write(media.join("toxic").join("x.gif"), "toxic").unwrap();

        let report = Consolidator::new(media, consolidation(&["funny", "toxic"]))
            .dry_run(true)
            .run()
            .expect("consolidation failed");

        assert_eq!(report.arrivals(), vec!["x.gif", "x_1.gif"]);
        assert_eq!(report.removed_folders().count(), 2);
        assert!(!media.join("general").exists());
        assert!(media.join("funny").join("x.gif").exists());
        assert!(media.join("toxic").join("x.gif").exists());
    }

    #[test]
    fn test_target_in_the_way_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media = temp_dir.path();
        fs::write(media.join("general"), "a file, not a folder").unwrap();
        fs::create_dir(media.join("funny")).unwrap();
        fs::write(media.join("funny").join("a.png"), "png").unwrap();

        let result = Consolidator::new(media, consolidation(&["funny"])).run();

        assert!(matches!(result, Err(GalleryError::NotADirectory { .. })));
        assert!(media.join("funny").join("a.png").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_move_failure_leaves_file_and_folder() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media = temp_dir.path();
        let general = media.join("general");
        fs::create_dir_all(&general).unwrap();
        fs::create_dir(media.join("toxic")).unwrap();
        fs::write(media.join("toxic").join("rage.png"), "png").unwrap();
        fs::set_permissions(&general, fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores permission bits; nothing to assert there.
        if fs::write(general.join(".probe"), "").is_ok() {
            fs::set_permissions(&general, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report = Consolidator::new(media, consolidation(&["toxic"]))
            .run()
            .expect("consolidation failed");
        fs::set_permissions(&general, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.folders[0].cleanup, Cleanup::Retained { remaining: 1 });
        assert!(media.join("toxic").join("rage.png").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_name_too_long_for_suffix_is_a_move_failure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media = temp_dir.path();
        let name = format!("{}.gif", "a".repeat(251));
        fs::create_dir_all(media.join("general")).unwrap();
        fs::create_dir(media.join("toxic")).unwrap();
        fs::write(media.join("general").join(&name), "existing").unwrap();
        fs::write(media.join("toxic").join(&name), "legacy").unwrap();

        let report = Consolidator::new(media, consolidation(&["toxic"]))
            .run()
            .expect("consolidation failed");

        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.folders[0].cleanup, Cleanup::Retained { remaining: 1 });
        assert_eq!(
            fs::read_to_string(media.join("toxic").join(&name)).unwrap(),
            "legacy"
        );
        assert_eq!(
            fs::read_to_string(media.join("general").join(&name)).unwrap(),
            "existing"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_folder_that_cannot_be_removed_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media = temp_dir.path().join("media");
        let elsewhere = temp_dir.path().join("elsewhere");
        fs::create_dir_all(media.join("general")).unwrap();
        fs::create_dir(&elsewhere).unwrap();
        fs::write(elsewhere.join("a.png"), "png").unwrap();
        // rmdir refuses a symlink even when the folder behind it is empty.
        std::os::unix::fs::symlink(&elsewhere, media.join("funny")).unwrap();

        let report = Consolidator::new(&media, consolidation(&["funny"]))
            .run()
            .expect("consolidation failed");

        assert_eq!(report.moved_count(), 1);
        assert!(matches!(report.folders[0].cleanup, Cleanup::Failed(_)));
        assert!(media.join("funny").exists());
        assert!(media.join("general").join("a.png").is_file());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_survives_the_move() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let media = temp_dir.path();
        let name = OsStr::from_bytes(b"x\xff.gif");
        fs::create_dir(media.join("funny")).unwrap();
        fs::write(media.join("funny").join(name), "funny").unwrap();

        let report = Consolidator::new(media, consolidation(&["funny"]))
            .run()
            .expect("consolidation failed");

        let moved = &report.folders[0].moved[0];
        assert!(!moved.was_renamed());
        let bytes = moved.destination.file_name().unwrap().to_os_string().into_vec();
        assert_eq!(bytes, b"x\xff.gif".to_vec());
        assert!(media.join("general").join(name).is_file());
    }
}
