use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keeps rule targets inside the source tree being rebranded.
#[derive(Debug, Clone)]
pub struct SourceRoot {
    /// Absolute path to the source tree
    root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("target is outside the source root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("target is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("cannot resolve {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SourceRoot {
    /// Create a guard for `root`.
    ///
    /// The root is canonicalized to handle symlinks correctly. The root's
    /// `.git/` directory is forbidden.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = canonicalize(root.as_ref())?;

        let mut forbidden_paths = Vec::new();
        if let Ok(git_dir) = root.join(".git").canonicalize() {
            forbidden_paths.push(git_dir);
        }

        Ok(Self {
            root,
            forbidden_paths,
        })
    }

    /// Check that an existing target is safe to edit.
    ///
    /// Returns the canonicalized absolute path if safe.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let canonical = canonicalize(&self.join(path))?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    /// Resolve a target against the root without touching the filesystem.
    pub fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical.to_path_buf(),
                root: self.root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of `target` relative to the root, for display.
    pub fn relative<'a>(&self, target: &'a Path) -> &'a Path {
        target.strip_prefix(&self.root).unwrap_or(target)
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize().map_err(|source| SafetyError::Canonicalize {
        path: path.to_path_buf(),
        source,
    })
}
