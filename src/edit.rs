use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Where rule targets are read from and written back to.
///
/// The engine threads every rule through a store: [`FileStore`] edits the
/// source tree in place, [`OverlayStore`] keeps writes in memory so a run can
/// be checked without modifying anything.
pub trait Store {
    /// Read the full text of `path`.
    fn read(&mut self, path: &Path) -> Result<String, EditError>;

    /// Replace the full text of `path`.
    fn write(&mut self, path: &Path, content: &str) -> Result<(), EditError>;
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl EditError {
    pub fn path(&self) -> &Path {
        match self {
            EditError::Read { path, .. } | EditError::Write { path, .. } => path,
        }
    }
}

/// Edits files on disk.
///
/// Reads require valid UTF-8. Writes are atomic (tempfile + fsync + rename),
/// keep the permissions of the file they replace and bump its mtime so build
/// tools notice the change.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStore;

impl Store for FileStore {
    fn read(&mut self, path: &Path) -> Result<String, EditError> {
        let content = fs::read_to_string(path).map_err(|source| EditError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = content.len(), "read target");
        Ok(content)
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<(), EditError> {
        let wrap = |source| EditError::Write {
            path: path.to_path_buf(),
            source,
        };
        atomic_write(path, content.as_bytes()).map_err(wrap)?;
        filetime::set_file_mtime(path, filetime::FileTime::now()).map_err(wrap)?;
        debug!(path = %path.display(), bytes = content.len(), "wrote target");
        Ok(())
    }
}

/// Reads through to disk, keeps writes in memory.
///
/// A target is read from disk the first time only; afterwards the overlay
/// copy is returned, so sequential rules see each other's output exactly as
/// they would with [`FileStore`].
#[derive(Debug, Default, Clone)]
pub struct OverlayStore {
    files: HashMap<PathBuf, String>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content written for `path`, if any rule wrote it.
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Number of distinct targets held in memory.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Store for OverlayStore {
    fn read(&mut self, path: &Path) -> Result<String, EditError> {
        if let Some(content) = self.files.get(path) {
            return Ok(content.clone());
        }
        FileStore.read(path)
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<(), EditError> {
        debug!(path = %path.display(), bytes = content.len(), "buffered target");
        self.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the original file is left untouched.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Tempfile must live on the same filesystem for the rename to be atomic
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let permissions = fs::metadata(path).ok().map(|meta| meta.permissions());

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;

    // NamedTempFile is created 0600
    if let Some(permissions) = permissions {
        temp.as_file().set_permissions(permissions)?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
