// ========================================================================================
//                               The record source
// ========================================================================================

//! Loading and decoding of the record file.
//!
//! The input is a single JSON array of `{"a": <int>, "b": <int>}` objects. The whole
//! file is read and decoded up front; the engine never streams. Any failure here
//! aborts the run before the aggregation core is ever started, so no partial total
//! can be produced from a bad file.

use crate::types::Record;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Everything that can go wrong while turning a file into records. Failures are
/// assumed to be user-input errors, so the messages name the offending file.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read record file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("record file '{path}' is not a JSON array of {{\"a\", \"b\"}} objects: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and decodes the full record file into memory.
pub fn load_records(path: &Path) -> Result<Vec<Record>, SourceError> {
    let bytes = fs::read(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| SourceError::Decode {
        path: path.display().to_string(),
        source,
    })
}
