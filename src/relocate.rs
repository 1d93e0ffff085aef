//! Copy generated image assets back into the source tree.
//!
//! Assets are produced elsewhere under `<assets>/<images>/generated/`, laid
//! out like the source tree. Every `png`, `svg` and `ico` below that
//! directory is copied to the same relative path under the source root.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Extensions picked up by [`relocate_assets`], compared case-insensitively.
pub const ASSET_EXTENSIONS: &[&str] = &["png", "svg", "ico"];

#[derive(Error, Debug)]
pub enum RelocateError {
    #[error("generated asset directory not found: {0}")]
    MissingSource(PathBuf),

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// One copied asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: PathBuf,
    pub to: PathBuf,
    /// Path relative to both the generated directory and the source root
    pub relative: PathBuf,
}

/// `<assets_dir>/<images>/generated`
pub fn generated_dir(assets_dir: &Path, images: &str) -> PathBuf {
    assets_dir.join(images).join("generated")
}

fn is_asset(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ASSET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Copy every asset below `source` to the same relative path under `root`.
///
/// Directories are created as needed; existing files are overwritten. Copies
/// happen in sorted path order.
pub fn relocate_assets(source: &Path, root: &Path) -> Result<Vec<Relocation>, RelocateError> {
    if !source.is_dir() {
        return Err(RelocateError::MissingSource(source.to_path_buf()));
    }

    let mut relocations = Vec::new();

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| RelocateError::Walk {
            path: source.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() || !is_asset(entry.path()) {
            continue;
        }

        let from = entry.path().to_path_buf();
        let Ok(relative) = from.strip_prefix(source).map(Path::to_path_buf) else {
            continue;
        };
        let to = root.join(&relative);

        let copy_error = |e| RelocateError::Copy {
            from: from.clone(),
            to: to.clone(),
            source: e,
        };
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(copy_error)?;
        }
        fs::copy(&from, &to).map_err(copy_error)?;
        debug!(from = %from.display(), to = %to.display(), "relocated asset");

        relocations.push(Relocation { from, to, relative });
    }

    Ok(relocations)
}
