use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `contents` to a synced temp file in the directory of `path`
///
/// Nothing at `path` changes until the returned file is persisted; dropping
/// it removes the temp file.
pub fn stage_file(path: &Path, contents: &[u8]) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    Ok(temp)
}

/// Replaces `path` with `contents` via a sibling temp file and a rename
///
/// The temp file lives in the target's directory so the rename never crosses
/// filesystems. If anything fails the previous file is left as it was.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    stage_file(path, contents)?
        .persist(path)
        .map_err(|e| e.error)?;

    tracing::trace!("Atomically replaced {}", path.display());
    Ok(())
}
