use std::path::{Path, PathBuf};

use log::{debug, info};
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{ConfigError, WorkerError};

/// Locates source files in the input directory, restricted to names that
/// fully match the configured pattern.
pub struct DirectoryScanner {
    input_directory: PathBuf,
    pattern: Regex,
    pattern_source: String,
}

impl DirectoryScanner {
    pub fn new<P: AsRef<Path>>(input_directory: P, pattern: &str) -> Result<Self, ConfigError> {
        let anchored = format!("^(?:{})$", pattern);
        let compiled = Regex::new(&anchored).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            input_directory: input_directory.as_ref().to_path_buf(),
            pattern: compiled,
            pattern_source: pattern.to_string(),
        })
    }

    pub fn input_directory(&self) -> &Path {
        &self.input_directory
    }

    pub fn matches(&self, filename: &str) -> bool {
        self.pattern.is_match(filename)
    }

    /// Returns the input path of a document's file.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, WorkerError> {
        let is_plain_name = Path::new(filename)
            .file_name()
            .map(|n| n == filename)
            .unwrap_or(false);
        if !is_plain_name {
            return Err(WorkerError::UnsafeFilename(filename.to_string()));
        }

        if !self.matches(filename) {
            return Err(WorkerError::PatternMismatch {
                filename: filename.to_string(),
                pattern: self.pattern_source.clone(),
            });
        }

        let path = self.input_directory.join(filename);
        if !path.is_file() {
            return Err(WorkerError::MissingSource(path));
        }
        Ok(path)
    }

    /// Lists the top-level files of the input directory whose names match.
    pub fn scan(&self) -> Result<Vec<PathBuf>, WorkerError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.input_directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| WorkerError::ScanFailed {
                path: self.input_directory.clone(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            if let Some(name) = entry.file_name().to_str() {
                if self.matches(name) {
                    debug!("Found source file: {}", entry.path().display());
                    files.push(entry.path().to_path_buf());
                }
            }
        }

        info!(
            "Scanned {} source files in {}",
            files.len(),
            self.input_directory.display()
        );
        Ok(files)
    }
}
