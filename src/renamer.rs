//! Sequential renaming of category folders.
//!
//! Files are sorted by name (code point order) and renamed to `1.ext`,
//! `2.ext`, ... with the extension lowercased. Every file yields a
//! [`RenameOutcome`]; a failed rename keeps the file under its old name and
//! the manifest records that name, so nothing on disk goes untracked.
//!
//! Renames go through a staging name first. Without it, renumbering
//! `1.png, 10.png, 2.png` would move `10.png` onto the still-present `2.png`.

use crate::error::{GalleryError, GalleryResult};
use crate::scan::{self, FileEntry};
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of the temporary names used between the two rename phases.
///
/// Visible on purpose: if a run dies half way, the next run still sees and
/// renumbers the staged files.
pub const STAGING_PREFIX: &str = "_staged_";

/// Builds the sequential name for the file at 1-based `index`.
///
/// ```
/// use gallery_tidy::renamer::sequential_name;
///
/// assert_eq!(sequential_name(2, "b.PNG"), "2.png");
/// assert_eq!(sequential_name(7, "notes"), "7");
/// ```
pub fn sequential_name(index: usize, file_name: &str) -> String {
    let (_, ext) = scan::split_extension(file_name);
    format!("{index}{}", ext.to_lowercase())
}

/// A file and the name it should end up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRename {
    pub entry: FileEntry,
    pub target: String,
}

impl PlannedRename {
    /// True if the file already carries its sequential name.
    pub fn is_noop(&self) -> bool {
        self.entry.name == self.target
    }
}

/// Sorts `entries` and assigns each its sequential name.
pub fn plan(mut entries: Vec<FileEntry>) -> Vec<PlannedRename> {
    scan::sort_entries(&mut entries);
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let target = sequential_name(i + 1, &entry.name);
            PlannedRename { entry, target }
        })
        .collect()
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The file already had its sequential name.
    Unchanged { name: String },
    /// The file was renamed (or would be, in a dry run).
    Renamed { from: String, to: String },
    /// The rename failed; `recorded` is the name the file has on disk now.
    Failed {
        original: String,
        target: String,
        recorded: String,
        reason: String,
    },
}

impl RenameOutcome {
    /// The name that goes into the manifest.
    pub fn recorded_name(&self) -> &str {
        match self {
            RenameOutcome::Unchanged { name } => name,
            RenameOutcome::Renamed { to, .. } => to,
            RenameOutcome::Failed { recorded, .. } => recorded,
        }
    }

    pub fn is_renamed(&self) -> bool {
        matches!(self, RenameOutcome::Renamed { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RenameOutcome::Failed { .. })
    }
}

/// Renumbers the files of a category folder.
#[derive(Debug, Clone, Default)]
pub struct SequentialRenamer {
    dry_run: bool,
}

impl SequentialRenamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, outcomes describe the planned renames and nothing is touched.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Lists, sorts and renames every visible file in `dir`.
    ///
    /// # Errors
    ///
    /// Fails only if the folder cannot be listed. Individual rename failures are
    /// reported as [`RenameOutcome::Failed`].
    pub fn rename_category(&self, dir: &Path) -> GalleryResult<Vec<RenameOutcome>> {
        let entries = scan::list_visible_files(dir)?;
        Ok(self.apply(dir, &plan(entries)))
    }

    /// Carries out a plan inside `dir`. Outcomes follow the plan's order.
    pub fn apply(&self, dir: &Path, plan: &[PlannedRename]) -> Vec<RenameOutcome> {
        if self.dry_run {
            return plan.iter().map(|planned| simulate(dir, plan, planned)).collect();
        }

        let mut outcomes: Vec<Option<RenameOutcome>> = vec![None; plan.len()];
        let mut staged: Vec<(usize, PathBuf)> = Vec::new();

        for (i, planned) in plan.iter().enumerate() {
            if planned.is_noop() {
                outcomes[i] = Some(preview(planned));
                continue;
            }

            let staging_name = format!("{STAGING_PREFIX}{}", planned.target);
            let staging = scan::unique_path(dir, &staging_name, scan::is_occupied);
            match fs::rename(&planned.entry.path, &staging) {
                Ok(()) => staged.push((i, staging)),
                Err(e) => {
                    let error = GalleryError::RenameFailed {
                        from: planned.entry.path.clone(),
                        to: dir.join(&planned.target),
                        source: e,
                    };
                    outcomes[i] = Some(failure(planned, planned.entry.name.clone(), &error));
                }
            }
        }

        for (i, staging) in staged {
            let planned = &plan[i];
            let target_path = dir.join(&planned.target);

            let result = if scan::is_occupied(&target_path) {
                Err(GalleryError::TargetOccupied {
                    path: target_path.clone(),
                })
            } else {
                fs::rename(&staging, &target_path).map_err(|e| GalleryError::RenameFailed {
                    from: planned.entry.path.clone(),
                    to: target_path.clone(),
                    source: e,
                })
            };

            outcomes[i] = Some(match result {
                Ok(()) => {
                    log::debug!("Renamed {} -> {}", planned.entry.name, planned.target);
                    preview(planned)
                }
                Err(error) => {
                    let recorded = restore(&staging, &planned.entry);
                    failure(planned, recorded, &error)
                }
            });
        }

        outcomes.into_iter().flatten().collect()
    }
}

fn preview(planned: &PlannedRename) -> RenameOutcome {
    if planned.is_noop() {
        RenameOutcome::Unchanged {
            name: planned.entry.name.clone(),
        }
    } else {
        RenameOutcome::Renamed {
            from: planned.entry.name.clone(),
            to: planned.target.clone(),
        }
    }
}

/// The outcome a real run would give `planned`, without touching the disk.
///
/// Files that get renamed are staged away first, so only names outside the
/// rename set can block a target.
fn simulate(dir: &Path, plan: &[PlannedRename], planned: &PlannedRename) -> RenameOutcome {
    if planned.is_noop() {
        return preview(planned);
    }

    let target_path = dir.join(&planned.target);
    let staged_away = plan
        .iter()
        .any(|other| !other.is_noop() && other.entry.name == planned.target);
    if scan::is_occupied(&target_path) && !staged_away {
        let error = GalleryError::TargetOccupied { path: target_path };
        return failure(planned, planned.entry.name.clone(), &error);
    }

    preview(planned)
}

fn failure(planned: &PlannedRename, recorded: String, error: &GalleryError) -> RenameOutcome {
    log::warn!("{}", error);
    RenameOutcome::Failed {
        original: planned.entry.name.clone(),
        target: planned.target.clone(),
        recorded,
        reason: error.to_string(),
    }
}

/// Moves a staged file back to its original name. Returns the name it ends up under.
fn restore(staging: &Path, entry: &FileEntry) -> String {
    if !scan::is_occupied(&entry.path) && fs::rename(staging, &entry.path).is_ok() {
        return entry.name.clone();
    }

    log::warn!(
        "Could not restore {} from {}",
        entry.name,
        staging.display()
    );
    staging
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.name.clone())
}
