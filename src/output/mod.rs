//! Output module for exporting the article collection
//!
//! This module handles:
//! - Writing the collection as JSON and CSV
//! - Reading the previous JSON export back as the archive
//! - Summarizing the archive and state for operators

mod csv_export;
mod json;
pub mod stats;
mod traits;

pub use csv_export::{render_csv, CSV_HEADER};
pub use json::{load_archive, render_json};
pub use stats::{compute_statistics, load_statistics, print_statistics, ArchiveStatistics};
pub use traits::{OutputError, OutputResult};

use crate::article::Article;
use crate::storage::stage_file;
use std::path::Path;

/// Writes the collection to both export formats
///
/// Both files are rendered and staged next to their targets before either
/// target is replaced. The CSV is renamed into place first and the JSON
/// archive last, so the archive never runs ahead of the CSV.
///
/// # Arguments
///
/// * `articles` - The ordered collection to export
/// * `json_path` - Destination of the JSON export
/// * `csv_path` - Destination of the CSV export
pub fn write_exports(articles: &[Article], json_path: &Path, csv_path: &Path) -> OutputResult<()> {
    let json = stage_file(json_path, &render_json(articles)?)?;
    let csv = stage_file(csv_path, &render_csv(articles)?)?;

    csv.persist(csv_path).map_err(|e| e.error)?;
    json.persist(json_path).map_err(|e| e.error)?;

    tracing::info!(
        "Saved {} articles to {} and {}",
        articles.len(),
        json_path.display(),
        csv_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_exports_creates_both_files() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("articles.json");
        let csv_path = dir.path().join("articles.csv");

        write_exports(&[Article::new("A", None, "https://x/1")], &json_path, &csv_path).unwrap();

        assert!(json_path.exists());
        assert!(csv_path.exists());
    }

    #[test]
    fn test_csv_failure_leaves_json_archive_untouched() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("articles.json");
        write_exports(&[Article::new("A", None, "https://x/1")], &json_path, &dir.path().join("a.csv"))
            .unwrap();
        let before = std::fs::read(&json_path).unwrap();

        let articles = vec![
            Article::new("B", None, "https://x/2"),
            Article::new("A", None, "https://x/1"),
        ];
        let result = write_exports(&articles, &json_path, &dir.path().join("missing").join("a.csv"));

        assert!(matches!(result, Err(OutputError::Io(_))));
        assert_eq!(std::fs::read(&json_path).unwrap(), before);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_write_exports_stops_on_json_failure() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("missing").join("articles.json");
        let csv_path = dir.path().join("articles.csv");

        let result = write_exports(&[], &json_path, &csv_path);

        assert!(matches!(result, Err(OutputError::Io(_))));
        assert!(!csv_path.exists());
    }
}
