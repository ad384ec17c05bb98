//! # nx-core
//!
//! Shared error taxonomy, event-source traits and run bookkeeping for the
//! NuExport analysis crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod source;
pub mod types;

pub use error::{Error, FieldError, Result};
pub use source::{Exposure, MemorySource, Spill, SpillSource};
pub use types::RunSummary;

/// Workspace version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
