//! Page-break marker detection and per-document marker resolution.

use std::path::Path;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{BookRow, DatabaseError, DocumentRow};
use crate::error::ProcessError;
use crate::processor::reader;
use crate::store::DocumentStore;

/// Number of leading lines inspected when detecting a marker.
pub const DEFAULT_DETECT_LINES: usize = 5;

#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("no page-break marker could be resolved for document '{document_id}'")]
    Unresolved { document_id: String },

    #[error(transparent)]
    Read(#[from] ProcessError),

    #[error("marker lookup failed: {0}")]
    Store(#[from] DatabaseError),
}

/// Returns the first catalog marker found as a substring of any of `lines`.
///
/// The catalog is scanned in its natural order, and for each entry the lines
/// in read order. Empty markers never match.
pub fn detect_marker<'a, S: AsRef<str>>(lines: &[S], catalog: &'a [BookRow]) -> Option<&'a str> {
    catalog
        .iter()
        .filter(|book| !book.page_break.is_empty())
        .find(|book| lines.iter().any(|l| l.as_ref().contains(&book.page_break)))
        .map(|book| book.page_break.as_str())
}

/// Where the page-break marker of a document comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MarkerResolutionStrategy {
    /// One marker for every document.
    #[serde(rename = "fixed")]
    FixedMarker {
        #[serde(default = "default_fixed_marker")]
        marker: String,
    },
    /// The marker stored on the document record.
    #[serde(rename = "stored")]
    StoredOnDocument,
    /// The stored marker if known, otherwise detected from the book catalog.
    #[serde(rename = "catalog")]
    DetectedFromCatalog {
        #[serde(default = "default_detect_lines")]
        detect_lines: usize,
    },
}

fn default_detect_lines() -> usize {
    DEFAULT_DETECT_LINES
}

fn default_fixed_marker() -> String {
    "1".to_string()
}

impl Default for MarkerResolutionStrategy {
    fn default() -> Self {
        Self::FixedMarker {
            marker: default_fixed_marker(),
        }
    }
}

/// A marker together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMarker {
    pub marker: String,
    /// True when the marker was found in the catalog during this run and
    /// has been written back to the document.
    pub detected: bool,
}

impl MarkerResolutionStrategy {
    /// Resolves the marker for `doc`, reading the head of `source` if the
    /// catalog has to be consulted. A detected marker is persisted on the
    /// document before returning.
    pub fn resolve(
        &self,
        doc: &DocumentRow,
        store: &dyn DocumentStore,
        source: &Path,
        encoding: &'static Encoding,
    ) -> Result<ResolvedMarker, MarkerError> {
        let stored = doc.page_break.as_deref().filter(|m| !m.is_empty());

        match self {
            Self::FixedMarker { marker } => Ok(ResolvedMarker {
                marker: marker.clone(),
                detected: false,
            }),
            Self::StoredOnDocument => stored
                .map(|m| ResolvedMarker {
                    marker: m.to_string(),
                    detected: false,
                })
                .ok_or_else(|| MarkerError::Unresolved {
                    document_id: doc.id.clone(),
                }),
            Self::DetectedFromCatalog { detect_lines } => {
                if let Some(m) = stored {
                    return Ok(ResolvedMarker {
                        marker: m.to_string(),
                        detected: false,
                    });
                }

                let head = reader::first_lines(source, encoding, *detect_lines)?;
                let catalog = store.list_books()?;
                let marker = detect_marker(&head, &catalog)
                    .ok_or_else(|| MarkerError::Unresolved {
                        document_id: doc.id.clone(),
                    })?
                    .to_string();

                log::debug!("Detected page break '{}' for document {}", marker, doc.id);
                store.set_page_break(&doc.id, &marker)?;

                Ok(ResolvedMarker {
                    marker,
                    detected: true,
                })
            }
        }
    }
}
