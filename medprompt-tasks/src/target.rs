//! Audience segments and the segment-scoped task registry
//!
//! Every task belongs to exactly one public target segment; task names are
//! unique only within a segment. `MedicalEndUser` is the in-memory registry
//! of one segment's tasks.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::task::Task;

/// The closed set of audience segments a task can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicTarget {
    Patient,
    NonMedicalStudent,
    MedicalStudent,
    Physician,
}

impl PublicTarget {
    /// The segment token used in record filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicTarget::Patient => "PATIENT",
            PublicTarget::NonMedicalStudent => "NON_MEDICAL_STUDENT",
            PublicTarget::MedicalStudent => "MEDICAL_STUDENT",
            PublicTarget::Physician => "PHYSICIAN",
        }
    }

    /// All segments, in declaration order.
    pub fn all() -> [PublicTarget; 4] {
        [
            PublicTarget::Patient,
            PublicTarget::NonMedicalStudent,
            PublicTarget::MedicalStudent,
            PublicTarget::Physician,
        ]
    }
}

impl FromStr for PublicTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PATIENT" => Ok(PublicTarget::Patient),
            "NON_MEDICAL_STUDENT" => Ok(PublicTarget::NonMedicalStudent),
            "MEDICAL_STUDENT" => Ok(PublicTarget::MedicalStudent),
            "PHYSICIAN" => Ok(PublicTarget::Physician),
            other => Err(format!("unknown public target: {other}")),
        }
    }
}

/// Title-cased display form: "Non Medical Student".
impl fmt::Display for PublicTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for word in self.as_str().split('_') {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            let mut chars = word.chars();
            if let Some(head) = chars.next() {
                write!(f, "{}", head)?;
                write!(f, "{}", chars.as_str().to_lowercase())?;
            }
        }
        Ok(())
    }
}

/// One segment's participant: the set of tasks defined for that audience.
#[derive(Debug, Clone)]
pub struct MedicalEndUser {
    target: PublicTarget,
    tasks: IndexMap<String, Task>,
}

impl MedicalEndUser {
    /// Create an empty registry for the given segment.
    pub fn new(target: PublicTarget) -> Self {
        Self {
            target,
            tasks: IndexMap::new(),
        }
    }

    /// The segment this participant covers.
    pub fn target(&self) -> PublicTarget {
        self.target
    }

    /// Register a task under its name.
    ///
    /// A name collision is reported and leaves the existing task in place;
    /// returns whether the task was registered.
    pub fn assign(&mut self, task: Task) -> bool {
        if self.tasks.contains_key(task.name()) {
            warn!(
                task = task.name(),
                target = %self.target(),
                "task already exists for this target, keeping the existing one"
            );
            return false;
        }
        self.tasks.insert(task.name().to_string(), task);
        true
    }

    /// Look up a task by name.
    pub fn get_task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Look up a task for live editing.
    pub fn get_task_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.get_mut(name)
    }

    /// Drop a task from the registry; returns whether it existed.
    pub fn remove_task(&mut self, name: &str) -> bool {
        self.tasks.shift_remove(name).is_some()
    }

    /// Registered tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Registered task names in registration order.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
