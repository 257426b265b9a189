//! Crash-safe file publication
//!
//! Artifacts are written to a temporary file in the destination directory,
//! flushed, and then renamed over the target. Readers observe either the old
//! content or the complete new content, never a truncated file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::trace;

/// Mode for private key files
pub(crate) const PRIVATE_MODE: u32 = 0o600;

/// Mode for certificates and chains
pub(crate) const PUBLIC_MODE: u32 = 0o644;

/// Replace `path` with `contents`
pub(crate) fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let tmp = stage(path, contents, mode)?;
    tmp.persist(path)?;
    trace!(path = %path.display(), bytes = contents.len(), "Published file");
    Ok(())
}

/// Publish `contents` at `path` only if nothing exists there yet
///
/// Returns `false` when another writer got there first; the existing file is
/// left untouched.
pub(crate) fn create_new(path: &Path, contents: &[u8], mode: u32) -> io::Result<bool> {
    let tmp = stage(path, contents, mode)?;
    match tmp.persist_noclobber(path) {
        Ok(_) => {
            trace!(path = %path.display(), bytes = contents.len(), "Created file");
            Ok(true)
        }
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error),
    }
}

fn stage(path: &Path, contents: &[u8], mode: u32) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    set_mode(tmp.as_file(), mode)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

#[cfg(unix)]
fn set_mode(file: &File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &File, _mode: u32) -> io::Result<()> {
    Ok(())
}
