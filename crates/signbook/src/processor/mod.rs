//! Text-processing building blocks: encoding-aware line reading, page
//! splitting and page-break marker resolution.

pub mod marker;
pub mod reader;
pub mod splitter;

pub use marker::{detect_marker, MarkerError, MarkerResolutionStrategy, ResolvedMarker};
pub use reader::{first_lines, resolve_encoding, LineReader};
pub use splitter::{MatchMode, Page, PageSplitter, SplitError};
