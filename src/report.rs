//! Results of one gallery run.

use crate::consolidator::ConsolidationReport;
use crate::manifest::Manifest;
use crate::output::{OutputFormatter, file_word};
use crate::renamer::RenameOutcome;
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Renaming results for one category.
#[derive(Debug, Clone)]
pub struct CategoryReport {
    /// Manifest key.
    pub name: String,
    /// Category folder.
    pub path: PathBuf,
    /// Per-file outcomes in manifest order.
    pub outcomes: Vec<RenameOutcome>,
}

/// Everything a run did, in the order it happened.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// When the run started.
    pub started_at: DateTime<Local>,
    /// True if nothing was changed on disk.
    pub dry_run: bool,
    /// The manifest built by the run.
    pub manifest: Manifest,
    /// Merge results, when the layout has a consolidation step that could start.
    pub consolidation: Option<ConsolidationReport>,
    /// Why the consolidation step could not start.
    pub consolidation_error: Option<String>,
    /// Categories whose files were renumbered.
    pub categories: Vec<CategoryReport>,
    /// Categories whose folder was freshly created, and so recorded empty.
    pub created_categories: Vec<String>,
    /// Categories that could not be set up or listed, with the reason.
    pub setup_failures: Vec<(String, String)>,
    /// True once the manifest is on disk.
    pub manifest_written: bool,
    /// Why the manifest could not be written.
    pub manifest_error: Option<String>,
}

impl RunReport {
    /// Creates an empty report for a run starting now.
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Local::now(),
            dry_run,
            manifest: Manifest::new(),
            consolidation: None,
            consolidation_error: None,
            categories: Vec::new(),
            created_categories: Vec::new(),
            setup_failures: Vec::new(),
            manifest_written: false,
            manifest_error: None,
        }
    }

    /// Rename outcomes for a category.
    pub fn outcomes(&self, category: &str) -> Option<&[RenameOutcome]> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.outcomes.as_slice())
    }

    fn all_outcomes(&self) -> impl Iterator<Item = &RenameOutcome> {
        self.categories.iter().flat_map(|c| c.outcomes.iter())
    }

    /// Number of files renamed.
    pub fn renamed_count(&self) -> usize {
        self.all_outcomes().filter(|o| o.is_renamed()).count()
    }

    /// Number of files that kept their old name because the rename failed.
    pub fn rename_failures(&self) -> usize {
        self.all_outcomes().filter(|o| o.is_failure()).count()
    }

    /// Number of files merged into the target folder.
    pub fn moved_count(&self) -> usize {
        self.consolidation
            .as_ref()
            .map_or(0, ConsolidationReport::moved_count)
    }

    /// Number of files that could not be merged.
    pub fn move_failures(&self) -> usize {
        self.consolidation
            .as_ref()
            .map_or(0, ConsolidationReport::failed_count)
    }

    /// Total number of problems reported during the run.
    pub fn error_count(&self) -> usize {
        let cleanup_failures = self
            .consolidation
            .as_ref()
            .map_or(0, ConsolidationReport::cleanup_failures);

        self.rename_failures()
            + self.move_failures()
            + cleanup_failures
            + self.setup_failures.len()
            + usize::from(self.consolidation_error.is_some())
            + usize::from(self.manifest_error.is_some())
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Prints the closing summary.
    pub fn print_summary(&self) {
        let rows: Vec<(String, usize)> = self
            .manifest
            .iter()
            .map(|(name, files)| (name.to_string(), files.len()))
            .collect();
        OutputFormatter::summary_table(&rows, self.manifest.total_files());

        let verb = if self.dry_run { "would be" } else { "were" };
        let moved = self.moved_count();
        if self.consolidation.is_some() {
            OutputFormatter::plain(&format!(
                "{} {} {} merged into the target folder",
                moved,
                file_word(moved),
                verb
            ));
        }
        let renamed = self.renamed_count();
        OutputFormatter::plain(&format!(
            "{} {} {} renamed",
            renamed,
            file_word(renamed),
            verb
        ));
        OutputFormatter::plain(&format!(
            "Run started {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        ));

        let errors = self.error_count();
        if errors > 0 {
            OutputFormatter::warning(&format!(
                "{} {} reported. Please review the messages above.",
                errors,
                if errors == 1 { "problem" } else { "problems" }
            ));
        }
    }
}
