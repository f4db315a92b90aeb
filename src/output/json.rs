//! JSON export and archive loading
//!
//! The JSON export doubles as the archive: the next run reads it back to
//! recover the bodies of articles it already knows by URL.

use crate::article::Article;
use crate::output::traits::{OutputError, OutputResult};
use std::io::ErrorKind;
use std::path::Path;

/// Renders `articles` as a pretty-printed JSON array
///
/// Non-ASCII titles are written verbatim (UTF-8), not escaped.
pub fn render_json(articles: &[Article]) -> OutputResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(articles)?)
}

/// Reads a previous JSON export
///
/// # Returns
///
/// * `Ok(vec![])` - No export exists yet
/// * `Ok(articles)` - The archived articles, in file order
/// * `Err(OutputError::ArchiveCorrupt)` - The file exists but is unreadable
pub fn load_archive(path: &Path) -> OutputResult<Vec<Article>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("No article archive at {}", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(OutputError::ArchiveCorrupt {
                path: path.to_path_buf(),
                message: format!("unreadable: {}", e),
            })
        }
    };

    let articles: Vec<Article> =
        serde_json::from_str(&content).map_err(|e| OutputError::ArchiveCorrupt {
            path: path.to_path_buf(),
            message: format!("malformed JSON: {}", e),
        })?;

    tracing::info!("Loaded {} archived articles from {}", articles.len(), path.display());
    Ok(articles)
}
