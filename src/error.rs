//! Error types for typeahead.

use std::fmt;

/// Errors caused by a misconfigured display resolution.
///
/// Items that are not plain strings need a display extractor to supply their
/// textual representation. These errors surface lazily, on the first filter
/// evaluation that touches an offending item, because items may not exist yet
/// when the widget is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Items are not strings and no display extractor was configured.
    MissingDisplayExtractor {
        /// The source row that could not be resolved.
        row: usize,
    },
    /// The configured display extractor returned no text for an item.
    DisplayNotResolvable {
        /// The source row that could not be resolved.
        row: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDisplayExtractor { row } => {
                write!(
                    f,
                    "item at row {row} is not a string and no display extractor is configured"
                )
            }
            Self::DisplayNotResolvable { row } => {
                write!(
                    f,
                    "display extractor produced no text for the item at row {row}"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A specialized Result type for typeahead operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
