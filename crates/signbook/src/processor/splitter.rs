//! Splits a stream of lines into pages at page-break marker lines.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a line is compared against the page-break marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The whole line must equal the marker.
    #[default]
    Exact,
    /// The marker may appear anywhere in the line.
    Contains,
}

impl MatchMode {
    pub fn matches(&self, line: &str, marker: &str) -> bool {
        match self {
            Self::Exact => line == marker,
            Self::Contains => line.contains(marker),
        }
    }
}

/// A completed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub lines: Vec<String>,
}

#[derive(Error, Debug)]
pub enum SplitError<E> {
    #[error("failed to read line: {0}")]
    Read(#[source] io::Error),

    #[error("failed to emit page {number}: {source}")]
    Emit {
        number: u64,
        #[source]
        source: E,
    },
}

pub struct PageSplitter {
    marker: String,
    mode: MatchMode,
}

impl PageSplitter {
    pub fn new(marker: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            marker: marker.into(),
            mode,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Streams `lines` into pages, calling `emit` once per page in ascending
    /// page order, and returns the number of pages produced.
    ///
    /// The first line is a document header and never lands in a page. A
    /// marker line closes the current page unless the page is still empty.
    /// Whatever remains at the end of the stream is the last page, even if
    /// it is empty. The first read or emit error stops the split.
    pub fn split<I, F, E>(&self, lines: I, mut emit: F) -> Result<u64, SplitError<E>>
    where
        I: IntoIterator<Item = io::Result<String>>,
        F: FnMut(Page) -> Result<(), E>,
    {
        let mut lines = lines.into_iter();
        let mut counter: u64 = 0;
        let mut current: Vec<String> = Vec::new();

        // header
        if let Some(first) = lines.next() {
            first.map_err(SplitError::Read)?;
        }

        for line in lines {
            let line = line.map_err(SplitError::Read)?;

            if self.mode.matches(&line, &self.marker) {
                if current.is_empty() {
                    continue;
                }
                let page = Page {
                    number: counter,
                    lines: std::mem::take(&mut current),
                };
                emit(page).map_err(|source| SplitError::Emit {
                    number: counter,
                    source,
                })?;
                counter += 1;
                continue;
            }

            current.push(line);
        }

        emit(Page {
            number: counter,
            lines: current,
        })
        .map_err(|source| SplitError::Emit {
            number: counter,
            source,
        })?;

        Ok(counter + 1)
    }

    /// Collects every page of an in-memory line sequence.
    pub fn split_to_vec<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Page> {
        let mut pages = Vec::new();
        let result = self.split(
            lines.iter().map(|l| Ok(l.as_ref().to_string())),
            |page| -> Result<(), std::convert::Infallible> {
                pages.push(page);
                Ok(())
            },
        );
        // Neither the in-memory source nor the collector can fail.
        debug_assert!(result.is_ok());
        pages
    }
}
