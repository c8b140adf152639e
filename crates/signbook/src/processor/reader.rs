//! Line-oriented reading of text files in a configured character encoding.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use crate::error::ProcessError;

/// Looks up an encoding by its WHATWG label (`"ISO-8859-1"`, `"utf-8"`, ...).
///
/// UTF-16 variants are rejected because lines are split on the bytes `\r`
/// and `\n`.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, ProcessError> {
    match Encoding::for_label(label.trim().as_bytes()) {
        Some(enc) if enc == encoding_rs::UTF_16LE || enc == encoding_rs::UTF_16BE => {
            Err(ProcessError::UnknownEncoding(label.to_string()))
        }
        Some(enc) => Ok(enc),
        None => Err(ProcessError::UnknownEncoding(label.to_string())),
    }
}

/// Lazily yields the decoded lines of a file.
///
/// A line ends at `\n`, `\r` or `\r\n`, and the terminator is removed. A
/// final line without a terminator is still yielded. Byte sequences that
/// are malformed for the encoding surface as `InvalidData` errors instead of
/// being replaced.
pub struct LineReader {
    path: PathBuf,
    reader: BufReader<File>,
    encoding: &'static Encoding,
    buf: Vec<u8>,
    line_number: usize,
    /// The previous line ended at `\r`; a leading `\n` belongs to it.
    skip_lf: bool,
    failed: bool,
}

impl LineReader {
    pub fn open(path: &Path, encoding: &'static Encoding) -> Result<Self, ProcessError> {
        let file = File::open(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            encoding,
            buf: Vec::new(),
            line_number: 0,
            skip_lf: false,
            failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let mut read_any = false;

        loop {
            let (consumed, done) = {
                let available = self.reader.fill_buf()?;
                if available.is_empty() {
                    break;
                }
                if self.skip_lf {
                    self.skip_lf = false;
                    if available[0] == b'\n' {
                        (1, false)
                    } else {
                        continue;
                    }
                } else {
                    read_any = true;
                    match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                        Some(end) => {
                            self.buf.extend_from_slice(&available[..end]);
                            self.skip_lf = available[end] == b'\r';
                            (end + 1, true)
                        }
                        None => {
                            self.buf.extend_from_slice(available);
                            (available.len(), false)
                        }
                    }
                }
            };
            self.reader.consume(consumed);
            if done {
                break;
            }
        }

        if !read_any {
            return Ok(None);
        }
        self.line_number += 1;

        match self
            .encoding
            .decode_without_bom_handling_and_without_replacement(&self.buf)
        {
            Some(text) => Ok(Some(text.into_owned())),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "line {} is not valid {}",
                    self.line_number,
                    self.encoding.name()
                ),
            )),
        }
    }
}

impl Iterator for LineReader {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads at most `limit` lines from the start of a file.
pub fn first_lines(
    path: &Path,
    encoding: &'static Encoding,
    limit: usize,
) -> Result<Vec<String>, ProcessError> {
    LineReader::open(path, encoding)?
        .take(limit)
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })
}
