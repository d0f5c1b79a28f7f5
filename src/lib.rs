//! Crafting material planner
//!
//! Turns a crafting list into a flat, inventory-aware list of materials to
//! gather, with attribution back to the list entries and to owned intermediates.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod expand;
pub mod flatten;
pub mod grouping;
pub mod import;
pub mod inventory;
pub mod models;
pub mod plan_file;
pub mod planner;
pub mod reconcile;
pub mod report;

pub use catalog::CatalogIndex;
pub use error::{PlannerError, Result};
pub use expand::{Expander, MaterialNode};
pub use inventory::{InventorySnapshot, InventorySource, SourceKind};
pub use models::{MaterialKind, MaterialRef, MaterialRequirement, RootEntry};
pub use planner::{PlannerOptions, Resolution, resolve};
