use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::StorageError;

/// Move a file from `src` to `dst`. Uses `rename` first (fast, atomic on same
/// filesystem). Falls back to copy + delete when rename fails, which covers
/// cross-device moves.
pub(crate) fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

pub(crate) fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Builds `<yyyyMMddHHmmssSSS>_<original>`, the name a source file is
/// relocated under.
///
/// Two files with the same original name handled within the same
/// millisecond get the same generated name.
pub fn generated_name(at: DateTime<Local>, source_path: &Path) -> String {
    let original = source_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    format!("{}_{}", at.format("%Y%m%d%H%M%S%3f"), original)
}

/// Relocates source files once their processing is over.
pub struct FileLifecycle {
    processed_directory: PathBuf,
    error_directory: PathBuf,
}

impl FileLifecycle {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(processed_directory: P, error_directory: Q) -> Self {
        Self {
            processed_directory: processed_directory.as_ref().to_path_buf(),
            error_directory: error_directory.as_ref().to_path_buf(),
        }
    }

    pub fn processed_directory(&self) -> &Path {
        &self.processed_directory
    }

    pub fn error_directory(&self) -> &Path {
        &self.error_directory
    }

    /// Moves a successfully split source into the processed directory.
    pub fn move_to_processed(
        &self,
        source_path: &Path,
        generated_name: &str,
    ) -> Result<PathBuf, StorageError> {
        Self::relocate(source_path, &self.processed_directory, generated_name)
    }

    /// Moves a failed source into the error directory.
    pub fn move_to_error(
        &self,
        source_path: &Path,
        generated_name: &str,
    ) -> Result<PathBuf, StorageError> {
        Self::relocate(source_path, &self.error_directory, generated_name)
    }

    fn relocate(
        source_path: &Path,
        directory: &Path,
        generated_name: &str,
    ) -> Result<PathBuf, StorageError> {
        ensure_directory(directory)?;
        let target = directory.join(generated_name);
        move_file(source_path, &target)?;
        Ok(target)
    }
}
