//! Error types for NuExport

use thiserror::Error;

/// NuExport error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration (duplicate names, malformed binning, ...).
    ///
    /// Always raised before the first record is read.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A variable, multi-variable, cut or weight could not be evaluated on one record.
    #[error("Extraction error in '{name}': {cause}")]
    Extraction {
        /// Name of the failing variable/cut/weight.
        name: String,
        /// What went wrong.
        cause: FieldError,
    },

    /// Input dataset or output path unusable.
    #[error("Resource error: {0}")]
    Resource(String),

    /// Histogram normalization impossible (e.g. zero observed exposure).
    #[error("Normalization error: {0}")]
    Normalization(String),
}

impl Error {
    /// Attach a variable/cut name to a [`FieldError`].
    pub fn extraction(name: impl Into<String>, cause: FieldError) -> Self {
        Error::Extraction { name: name.into(), cause }
    }

    /// `true` for errors scoped to a single record (skip-and-continue candidates).
    pub fn is_per_event(&self) -> bool {
        matches!(self, Error::Extraction { .. })
    }
}

/// Reason a field lookup on a record failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Indexed into a sub-list that is too short.
    #[error("{list}[{index}] out of bounds (len {len})")]
    OutOfBounds {
        /// Sub-list path, e.g. `mc.nu`.
        list: &'static str,
        /// Requested index.
        index: usize,
        /// Actual length.
        len: usize,
    },

    /// Optional block absent from the record.
    #[error("missing {0}")]
    Missing(&'static str),

    /// Computation produced an invalid value.
    #[error("{0}")]
    Invalid(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_message_names_the_variable() {
        let err = Error::extraction(
            "trueLepE",
            FieldError::OutOfBounds { list: "mc.nu[0].prim", index: 0, len: 0 },
        );
        let msg = err.to_string();
        assert!(msg.contains("trueLepE"), "{msg}");
        assert!(msg.contains("mc.nu[0].prim[0] out of bounds (len 0)"), "{msg}");
        assert!(err.is_per_event());
    }

    #[test]
    fn fatal_errors_are_not_per_event() {
        assert!(!Error::Resource("x".into()).is_per_event());
        assert!(!Error::Configuration("x".into()).is_per_event());
        assert!(!Error::Normalization("x".into()).is_per_event());
    }
}
