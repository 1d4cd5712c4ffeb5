//! File type to destination path convention

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use super::DownloadError;
use crate::providers::FileType;

/// Fixed mount-point mapping from file type to path fragment
///
/// Every file type maps to its own name unless overridden in `[paths]`.
#[derive(Debug, Clone, Default)]
pub struct PathConvention {
    overrides: BTreeMap<FileType, String>,
}

impl PathConvention {
    pub fn new(overrides: BTreeMap<FileType, String>) -> Self {
        Self { overrides }
    }

    pub fn type_to_path(&self, file_type: FileType) -> String {
        self.overrides
            .get(&file_type)
            .cloned()
            .unwrap_or_else(|| file_type.as_str().to_string())
    }

    /// `<type-path>/<fragment>`; an empty fragment leaves the trailing slash
    pub fn destination(&self, file_type: FileType, fragment: &str) -> String {
        format!("{}/{}", self.type_to_path(file_type), fragment)
    }
}

/// Resolve a destination path under `base_dir`, refusing to escape it
pub fn resolve_destination(base_dir: &Path, dest: &str) -> Result<PathBuf, DownloadError> {
    let relative = Path::new(dest.trim_start_matches('/'));

    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(DownloadError::InvalidPath(dest.to_string()));
    }

    Ok(base_dir.join(relative))
}
