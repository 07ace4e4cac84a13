//! # medprompt tasks
//!
//! Domain model for templated-prompt tasks: typed, partially-required
//! key/value records scoped to an audience segment.
//!
//! - **Property**: one named, typed, optionally-required slot
//! - **Task**: an ordered, named collection of properties with a
//!   mapping-style interface and JSON round-trip
//! - **PublicTarget**: the audience segment that scopes task uniqueness
//! - **MedicalEndUser**: one segment's in-memory task registry

mod error;
mod property;
mod target;
mod task;

pub use error::{Result, TaskError};
pub use property::{Property, PropertyRecord, PropertyType, PropertyValue};
pub use target::{MedicalEndUser, PublicTarget};
pub use task::{Task, TaskRecord};
