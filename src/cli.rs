//! Command-line interface module for gallery-tidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration loading and overrides
//! - Orchestrating consolidation, renaming and manifest writing
//! - Progress and error reporting

use crate::category::{CategoryResolver, Resolution, ensure_directory};
use crate::config::{GalleryConfig, Layout, Mode};
use crate::consolidator::{Cleanup, ConsolidationReport, Consolidator};
use crate::error::GalleryResult;
use crate::output::{OutputFormatter, file_word};
use crate::renamer::{self, RenameOutcome, SequentialRenamer};
use crate::report::{CategoryReport, RunReport};
use crate::scan::{self, FileEntry};
use clap::Parser;
use std::path::PathBuf;

/// Keep a media gallery tidy: merge legacy folders, renumber files, write the manifest.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "gallery-tidy", version, about)]
pub struct Args {
    /// Configuration file (defaults to .galleryrc.toml, then ~/.config/gallery-tidy/config.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Media base directory
    #[arg(long, value_name = "DIR")]
    pub media_dir: Option<PathBuf>,

    /// Where to write the manifest
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Gallery layout
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Show what would happen without touching any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Loads the configuration and applies command-line overrides.
    pub fn load_config(&self) -> GalleryResult<GalleryConfig> {
        let mut config = GalleryConfig::load(self.config.as_deref())?;
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(media_dir) = &self.media_dir {
            config.media_dir = media_dir.clone();
        }
        if let Some(manifest) = &self.manifest {
            config.manifest_path = manifest.clone();
        }
        Ok(config)
    }
}

/// Runs the application for parsed command-line arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use gallery_tidy::cli::{Args, run_cli};
///
/// let args = Args::parse();
/// match run_cli(&args) {
///     Ok(report) => println!("{} files tracked", report.manifest.total_files()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(args: &Args) -> GalleryResult<RunReport> {
    let layout = args.load_config()?.compile()?;
    run_cli_with_config(&layout, args.dry_run)
}

/// Runs the full consolidate, rename, write sequence for `layout`.
///
/// Per-file and per-category problems are printed and recorded in the report;
/// only a media directory that cannot be created is returned as an error.
pub fn run_cli_with_config(layout: &Layout, dry_run: bool) -> GalleryResult<RunReport> {
    let mut report = RunReport::new(dry_run);

    if dry_run {
        OutputFormatter::dry_run_notice("No files will be moved, renamed or written.");
    }
    OutputFormatter::info(&format!(
        "Starting gallery update in {}",
        layout.media_dir().display()
    ));

    if let Resolution::Created(path) = ensure_directory(layout.media_dir(), dry_run)? {
        OutputFormatter::info(&format!("Created media directory: {}", path.display()));
    }

    if let Some(consolidation) = layout.consolidation() {
        OutputFormatter::header(&format!(
            "Consolidating legacy folders into {}/",
            consolidation.target()
        ));
        let mut consolidator =
            Consolidator::new(layout.media_dir(), consolidation.clone()).dry_run(dry_run);
        match consolidator.run() {
            Ok(merge) => {
                print_consolidation(&merge, dry_run);
                report.consolidation = Some(merge);
            }
            Err(e) => {
                OutputFormatter::error(&format!("Skipping consolidation: {}", e));
                report.consolidation_error = Some(e.to_string());
            }
        }
    }

    let resolver = CategoryResolver::new(layout.media_dir()).dry_run(dry_run);
    let renamer = SequentialRenamer::new().dry_run(dry_run);

    for category in layout.categories() {
        let path = category.path(layout.media_dir());
        // In a dry run the target folder and its new files only exist in the plan.
        let incoming = planned_arrivals(&report, &path);

        let resolution = match incoming {
            Some(_) => Ok(Resolution::Existing(path.clone())),
            None => resolver.resolve(category),
        };

        match resolution {
            Ok(Resolution::Created(path)) => {
                OutputFormatter::info(&format!("Created directory: {}", path.display()));
                report.created_categories.push(category.name().to_string());
                report.manifest.insert(category.name(), Vec::new());
                continue;
            }
            Ok(Resolution::Existing(_)) => {}
            Err(e) => {
                OutputFormatter::error(&format!("Category '{}': {}", category.name(), e));
                report
                    .setup_failures
                    .push((category.name().to_string(), e.to_string()));
                report.manifest.insert(category.name(), Vec::new());
                continue;
            }
        }

        OutputFormatter::header(&format!(
            "Processing category: {} ({})",
            category.name(),
            path.display()
        ));

        let mut entries = if path.is_dir() {
            match scan::list_visible_files(&path) {
                Ok(entries) => entries,
                Err(e) => {
                    OutputFormatter::error(&e.to_string());
                    report
                        .setup_failures
                        .push((category.name().to_string(), e.to_string()));
                    report.manifest.insert(category.name(), Vec::new());
                    continue;
                }
            }
        } else {
            Vec::new()
        };
        if let Some(incoming) = incoming {
            entries.extend(incoming.into_iter().map(|name| FileEntry::new(&path, name)));
        }

        let outcomes = renamer.apply(&path, &renamer::plan(entries));
        print_outcomes(&outcomes, dry_run);

        let files = outcomes
            .iter()
            .map(|o| o.recorded_name().to_string())
            .collect();
        report.manifest.insert(category.name(), files);
        report.categories.push(CategoryReport {
            name: category.name().to_string(),
            path,
            outcomes,
        });
    }

    write_manifest(layout, &mut report);
    report.print_summary();

    Ok(report)
}

/// Files a dry run would have merged into `path`, if `path` is the target.
fn planned_arrivals(report: &RunReport, path: &std::path::Path) -> Option<Vec<String>> {
    if !report.dry_run {
        return None;
    }
    report
        .consolidation
        .as_ref()
        .filter(|merge| merge.target == path)
        .map(ConsolidationReport::arrivals)
}

fn write_manifest(layout: &Layout, report: &mut RunReport) {
    let path = layout.manifest_path();

    if report.dry_run {
        match report.manifest.to_json() {
            Ok(json) => {
                OutputFormatter::dry_run_notice(&format!(
                    "Manifest that would be written to {}:",
                    path.display()
                ));
                OutputFormatter::plain(&json);
            }
            Err(e) => OutputFormatter::error(&e.to_string()),
        }
        return;
    }

    match report.manifest.write(path) {
        Ok(()) => {
            report.manifest_written = true;
            OutputFormatter::success(&format!(
                "Gallery manifest updated successfully! Saved to {}",
                path.display()
            ));
        }
        Err(e) => {
            OutputFormatter::error(&format!("ERROR: {}", e));
            OutputFormatter::plain("Please check file permissions or if the file is in use.");
            report.manifest_error = Some(e.to_string());
        }
    }
}

fn print_consolidation(merge: &ConsolidationReport, dry_run: bool) {
    if merge.target_created {
        OutputFormatter::info(&format!("Created directory: {}", merge.target.display()));
    }

    let move_verb = if dry_run { "Would move" } else { "Moved" };
    for folder in &merge.folders {
        if folder.cleanup == Cleanup::Skipped
            && folder.moved.is_empty()
            && folder.failed.is_empty()
        {
            continue;
        }

        OutputFormatter::plain(&format!(
            " {}/ ({} {})",
            folder.folder,
            folder.moved.len() + folder.failed.len(),
            file_word(folder.moved.len() + folder.failed.len())
        ));

        for record in &folder.moved {
            let source_name = record
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if record.was_renamed() {
                OutputFormatter::warning(&format!(
                    "  {} {} -> {} (name already taken)",
                    move_verb,
                    source_name,
                    record.destination_name()
                ));
            } else {
                OutputFormatter::success(&format!("  {} {}", move_verb, source_name));
            }
        }

        for (path, reason) in &folder.failed {
            OutputFormatter::error(&format!("  Could not move {}: {}", path.display(), reason));
        }

        match &folder.cleanup {
            Cleanup::Removed if dry_run => OutputFormatter::dry_run_notice(&format!(
                "Would remove empty folder {}/",
                folder.folder
            )),
            Cleanup::Removed => {
                OutputFormatter::success(&format!("  Removed empty folder {}/", folder.folder))
            }
            Cleanup::Retained { remaining } => OutputFormatter::warning(&format!(
                "  Kept {}/: {} {} left inside",
                folder.folder,
                remaining,
                if *remaining == 1 { "entry" } else { "entries" }
            )),
            Cleanup::Failed(reason) => OutputFormatter::error(&format!(
                "  Could not remove {}/: {}",
                folder.folder, reason
            )),
            Cleanup::Skipped => {}
        }
    }
}

fn print_outcomes(outcomes: &[RenameOutcome], dry_run: bool) {
    if outcomes.is_empty() {
        OutputFormatter::plain("  No files found.");
        return;
    }

    for outcome in outcomes {
        match outcome {
            RenameOutcome::Unchanged { name } => {
                OutputFormatter::plain(&format!("  File already correctly named: {}", name))
            }
            RenameOutcome::Renamed { from, to } if dry_run => {
                OutputFormatter::dry_run_notice(&format!("  Would rename: {} -> {}", from, to))
            }
            RenameOutcome::Renamed { from, to } => {
                OutputFormatter::success(&format!("Renamed: {} -> {}", from, to))
            }
            RenameOutcome::Failed {
                original,
                target,
                recorded,
                reason,
            } => {
                OutputFormatter::error(&format!(
                    "ERROR: Could not rename '{}' to '{}'. Reason: {}",
                    original, target, reason
                ));
                OutputFormatter::plain(
                    "  Please ensure the file is not open or in use by any other program.",
                );
                OutputFormatter::plain(&format!("  Keeping it in the manifest as '{}'", recorded));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_is_a_full_run() {
        let args = Args::try_parse_from(["gallery-tidy"]).unwrap();

        assert!(!args.dry_run);
        assert!(args.config.is_none());
        assert!(args.mode.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_flags_parse() {
        let args = Args::try_parse_from([
            "gallery-tidy",
            "--dry-run",
            "--mode",
            "simple",
            "--media-dir",
            "pics",
            "--manifest",
            "out.json",
            "-vv",
        ])
        .unwrap();

        assert!(args.dry_run);
        assert_eq!(args.mode, Some(Mode::Simple));
        assert_eq!(args.media_dir, Some(PathBuf::from("pics")));
        assert_eq!(args.manifest, Some(PathBuf::from("out.json")));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("gallery.toml");
        std::fs::write(&config_path, "media_dir = \"from_file\"\n").unwrap();

        let args = Args {
            config: Some(config_path),
            manifest: Some(PathBuf::from("elsewhere.json")),
            mode: Some(Mode::Simple),
            ..Args::default()
        };
        let config = args.load_config().unwrap();

        assert_eq!(config.media_dir, PathBuf::from("from_file"));
        assert_eq!(config.manifest_path, PathBuf::from("elsewhere.json"));
        assert_eq!(config.mode, Mode::Simple);
    }
}
