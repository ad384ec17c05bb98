//! # nx-caf
//!
//! Event schema, spill reader and standard analysis definitions for the
//! NuExport jobs.
//!
//! - [`schema`]: the per-spill [`SpillInfo`] and per-slice [`StandardRecord`]
//! - [`reader`]: JSON-lines spill files as a [`CafSource`]
//! - [`catalogs`], [`cuts`], [`weights`]: named variables, selections and
//!   central-value weights built on `nx-ana`
//! - [`presets`]: the compiled-in export and plotting jobs

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalogs;
pub mod cuts;
pub mod kinematics;
pub mod presets;
pub mod reader;
pub mod schema;
pub mod weights;

pub use catalogs::{EnergyTune, MultiVarDefs, VarDefs, VertexSource};
pub use presets::{PRESETS, Preset, PresetKind, PresetOutcome};
pub use reader::{CafSource, JsonlSource};
pub use schema::{SpillInfo, StandardRecord};
