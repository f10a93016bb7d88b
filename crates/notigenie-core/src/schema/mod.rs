//! Schema domain module.
//!
//! # Module Structure
//!
//! - `model`: Schema entries and the closed property-type set
//! - `identifier`: Remote identifier normalization
//! - `registry`: Load-once, read-only registry of logical databases
//! - `source`: Trait for the external schema source

mod identifier;
mod model;
mod registry;
mod source;

pub use identifier::{is_valid_identifier, normalize_identifier};
pub use model::{PropertyDefinition, PropertyType, SchemaEntry};
pub use registry::SchemaRegistry;
pub use source::SchemaSource;
