//! Temporary page output written next to the final output file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use crate::error::StorageError;
use crate::processor::Page;

use super::filesystem::{ensure_directory, move_file};

/// Settings shared by every temp output of a deployment.
#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub temp_extension: String,
    pub final_extension: String,
    pub encoding: &'static Encoding,
    /// Line written between two pages.
    pub page_separator: String,
}

/// A page dump under `<dir>/<name><temp_extension>` that becomes
/// `<dir>/<stem><final_extension>` once finalized.
///
/// Dropping an unfinalized output deletes the temporary file.
pub struct TempOutput {
    temp_path: PathBuf,
    final_path: PathBuf,
    writer: Option<BufWriter<File>>,
    encoding: &'static Encoding,
    separator: String,
    pages_written: u64,
}

impl TempOutput {
    pub fn create(settings: &OutputSettings, generated_name: &str) -> Result<Self, StorageError> {
        ensure_directory(&settings.directory)?;

        let temp_path = settings
            .directory
            .join(format!("{}{}", generated_name, settings.temp_extension));
        let stem = Path::new(generated_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(generated_name);
        let final_path = settings
            .directory
            .join(format!("{}{}", stem, settings.final_extension));

        let file = File::create(&temp_path).map_err(|e| StorageError::WriteFile {
            path: temp_path.clone(),
            source: e,
        })?;

        Ok(Self {
            temp_path,
            final_path,
            writer: Some(BufWriter::new(file)),
            encoding: settings.encoding,
            separator: settings.page_separator.clone(),
            pages_written: 0,
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    pub fn write_page(&mut self, page: &Page) -> Result<(), StorageError> {
        let mut text = String::new();
        if self.pages_written > 0 {
            text.push_str(&self.separator);
            text.push('\n');
        }
        for line in &page.lines {
            text.push_str(line);
            text.push('\n');
        }

        let (bytes, _, had_errors) = self.encoding.encode(&text);
        if had_errors {
            return Err(StorageError::Unencodable {
                encoding: self.encoding.name().to_string(),
            });
        }

        let writer = self.writer.as_mut().ok_or_else(|| StorageError::WriteFile {
            path: self.temp_path.clone(),
            source: std::io::Error::other("output already closed"),
        })?;
        writer
            .write_all(&bytes)
            .map_err(|e| StorageError::WriteFile {
                path: self.temp_path.clone(),
                source: e,
            })?;
        self.pages_written += 1;
        Ok(())
    }

    /// Flushes and renames the temp file to its final name.
    pub fn finalize(mut self) -> Result<PathBuf, StorageError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| StorageError::WriteFile {
                path: self.temp_path.clone(),
                source: e,
            })?;
        }
        if let Err(e) = move_file(&self.temp_path, &self.final_path) {
            if let Err(cleanup) = remove_if_exists(&self.temp_path) {
                log::warn!("{}", cleanup);
            }
            return Err(e);
        }
        Ok(self.final_path.clone())
    }

    /// Closes and deletes the temp file.
    pub fn discard(mut self) -> Result<(), StorageError> {
        self.writer.take();
        remove_if_exists(&self.temp_path)
    }
}

impl Drop for TempOutput {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            if let Err(e) = remove_if_exists(&self.temp_path) {
                log::warn!("{}", e);
            }
        }
    }
}

fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::RemoveFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
