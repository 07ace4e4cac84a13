//! # medprompt storage
//!
//! File-backed persistence for tasks and templates: one JSON file per
//! record, named by audience segment, under a repository root chosen by
//! the caller. The filename index is the listing; no manifest or database
//! sits beside the record files.

mod error;
mod repository;

pub use error::{Result, StorageError};
pub use repository::Repository;
