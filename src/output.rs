//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored
//! status lines and the closing summary table.

use colored::*;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Summary tables with per-category counts
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gallery_tidy::output::OutputFormatter;
    /// OutputFormatter::success("Renamed: a.jpg -> 1.jpg");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// Per-file problems are part of normal progress output, so this goes to
    /// stdout like everything else.
    pub fn error(message: &str) {
        println!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints a summary table with file counts per category, in the given order.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gallery_tidy::output::OutputFormatter;
    ///
    /// let rows = vec![("wins".to_string(), 12), ("general".to_string(), 40)];
    /// OutputFormatter::summary_table(&rows, 52);
    /// ```
    pub fn summary_table(rows: &[(String, usize)], total_files: usize) {
        Self::header("SUMMARY");

        let max_category_len = rows
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in rows {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            file_word(total_files),
            width = max_category_len
        );
    }
}

/// "file" or "files" depending on `count`.
pub fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_word() {
        assert_eq!(file_word(0), "files");
        assert_eq!(file_word(1), "file");
        assert_eq!(file_word(2), "files");
    }
}
