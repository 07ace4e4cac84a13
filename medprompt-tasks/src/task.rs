//! Tasks: ordered, named collections of typed properties
//!
//! A task behaves as a mapping from canonical property name to current
//! value, with an explicit interface rather than an implicit protocol.
//! Newly created properties pick up the task's current mutability mode as
//! their required flag; updates re-apply the mode.

use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use indexmap::IndexMap;
use medprompt_common::to_canonical;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskError};
use crate::property::{Property, PropertyRecord, PropertyType, PropertyValue};
use crate::target::PublicTarget;

/// On-disk record shape for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub properties: Vec<PropertyRecord>,
}

/// A named, typed record of properties defining one templated-prompt use
/// case, owned by exactly one audience segment.
#[derive(Debug, Clone)]
pub struct Task {
    name: String,
    target: PublicTarget,
    properties: IndexMap<String, Property>,
    // Transient: whether the next assignment marks its property required.
    require_new: bool,
}

impl Task {
    /// Create an empty task for the given segment.
    pub fn new(name: impl Into<String>, target: PublicTarget) -> Self {
        Self {
            name: name.into(),
            target,
            properties: IndexMap::new(),
            require_new: false,
        }
    }

    /// Create a task seeded with required inputs: the given pairs are
    /// assigned under mutable mode, then the task returns to detailed mode.
    pub fn with_required_inputs<I>(
        name: impl Into<String>,
        target: PublicTarget,
        required_inputs: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (String, PropertyValue)>,
    {
        let mut task = Self::new(name, target);
        task.to_mutable();
        for (key, value) in required_inputs {
            task.insert(&key, value)?;
        }
        task.to_detailed();
        Ok(task)
    }

    /// Task name, unique within its segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The audience segment this task belongs to.
    pub fn target(&self) -> PublicTarget {
        self.target
    }

    /// Identity derived from segment and name; stable across property
    /// mutation.
    pub fn id(&self) -> String {
        format!("{}/{}", self.target.as_str(), to_canonical(&self.name))
    }

    /// Subsequent assignments mark their property as a required input.
    pub fn to_mutable(&mut self) {
        self.require_new = true;
    }

    /// Subsequent assignments mark their property as additional detail.
    pub fn to_detailed(&mut self) {
        self.require_new = false;
    }

    fn find(&self, key: &str) -> Result<&Property> {
        let canonical = to_canonical(key);
        self.properties
            .get(&canonical)
            .ok_or(TaskError::PropertyNotFound { name: canonical })
    }

    /// Create or update a property.
    ///
    /// On create, the property's type is inferred from the value and its
    /// required flag from the current mutability mode. On update, the value
    /// is assigned under the property's existing type rules and the mode is
    /// re-applied to the required flag.
    pub fn insert(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        let canonical = to_canonical(key);
        let required = self.require_new;

        match self.properties.get_mut(&canonical) {
            Some(property) => property.set_value(value, Some(required)),
            None => {
                let mut property = Property::new(
                    medprompt_common::from_canonical(&canonical),
                    value.property_type(),
                    required,
                );
                property.set_value(value, None)?;
                self.properties.insert(canonical, property);
                Ok(())
            }
        }
    }

    /// Current value of a property; `None` when assigned but undefined.
    pub fn get(&self, key: &str) -> Result<Option<PropertyValue>> {
        Ok(self.find(key)?.value())
    }

    /// Remove a property.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        let canonical = to_canonical(key);
        self.properties
            .shift_remove(&canonical)
            .map(|_| ())
            .ok_or(TaskError::PropertyNotFound { name: canonical })
    }

    /// Whether a property exists under the given (display or canonical) name.
    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(&to_canonical(key))
    }

    /// Canonical property names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Canonical property names sorted for stable display.
    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.properties.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the task has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Canonical names of the required-input subset, in insertion order.
    pub fn get_required_inputs(&self) -> Vec<String> {
        self.properties
            .iter()
            .filter(|(_, property)| property.required())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Declared type of a property.
    pub fn prop_type(&self, key: &str) -> Result<PropertyType> {
        Ok(self.find(key)?.property_type())
    }

    /// Current value of a property, or its first-ever value when
    /// `use_default` is set.
    pub fn prop_value(&self, key: &str, use_default: bool) -> Result<Option<PropertyValue>> {
        let property = self.find(key)?;
        if use_default {
            Ok(property.default_value().cloned())
        } else {
            Ok(property.value())
        }
    }

    /// JSON record of a single property.
    pub fn prop_to_json(&self, key: &str) -> Result<serde_json::Value> {
        self.find(key)?.to_json()
    }

    /// Whether the named property is a required input.
    pub fn is_required_property(&self, key: &str) -> Result<bool> {
        Ok(self.find(key)?.required())
    }

    /// Serialize to the `{name, properties}` record.
    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            name: self.name.clone(),
            properties: self
                .properties
                .values()
                .map(Property::to_record)
                .collect(),
        }
    }

    /// Serialize to a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_record())?)
    }

    /// Rebuild a task from a record within the given segment.
    ///
    /// Each property is inserted under the mutability mode its record
    /// demands (mutable when it was required, detailed otherwise) so the
    /// persisted flags are reproduced; never-defined properties are
    /// restored directly.
    pub fn from_record(record: TaskRecord, target: PublicTarget) -> Result<Self> {
        let mut task = Task::new(record.name, target);
        for property_record in &record.properties {
            match PropertyValue::from_json(property_record.property_type, &property_record.value)? {
                Some(value) => {
                    if property_record.required {
                        task.to_mutable();
                    }
                    task.insert(&property_record.name, value)?;
                    task.to_detailed();
                }
                None => {
                    let property = Property::from_record(property_record)?;
                    task.properties
                        .insert(property_record.name.clone(), property);
                }
            }
        }
        Ok(task)
    }

    /// Write the task record to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_record())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a task record from a JSON file into the given segment.
    pub fn load(path: &Path, target: PublicTarget) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let record: TaskRecord = serde_json::from_str(&content)?;
        Self::from_record(record, target)
    }
}

/// Tasks are equal when their names match. Names are unique within a
/// segment by construction; see DESIGN.md for the cross-segment caveat.
impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Task {}

/// Combines the name with a sum of per-property value hashes. The hash
/// changes as property values change: a task used as a map key must not be
/// mutated while in the map.
impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        let mut content: u64 = 0;
        for property in self.properties.values() {
            content = content.wrapping_add(property.content_hash());
        }
        state.write_u64(content);
    }
}
