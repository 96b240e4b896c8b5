//! gallery-tidy - keeps a media gallery directory in order
//!
//! This library merges legacy category folders into one target folder,
//! renumbers the files of every category to `1.ext, 2.ext, ...` and writes a
//! JSON manifest listing the files of each category.

pub mod category;
pub mod cli;
pub mod config;
pub mod consolidator;
pub mod error;
pub mod manifest;
pub mod output;
pub mod renamer;
pub mod report;
pub mod scan;

pub use category::{Category, CategoryResolver, Resolution};
pub use config::{ConfigError, GalleryConfig, Layout, Mode};
pub use consolidator::{Consolidation, ConsolidationReport, Consolidator};
pub use error::{GalleryError, GalleryResult};
pub use manifest::Manifest;
pub use renamer::{RenameOutcome, SequentialRenamer};
pub use report::RunReport;

pub use cli::{Args, run_cli, run_cli_with_config};

/// Initializes logging. `RUST_LOG` takes precedence over `verbosity`.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
