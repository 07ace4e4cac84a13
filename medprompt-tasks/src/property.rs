//! Typed property slots and their JSON records
//!
//! A property is one named, typed, optionally-required slot within a task.
//! Values are a closed set of shapes; list-valued properties behave as a
//! most-recently-selected-first ordered set of options rather than a plain
//! scalar.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::NaiveDate;
use medprompt_common::{format_date, from_canonical, parse_date, to_canonical};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskError};

/// The closed set of value types a property may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    /// Whole numbers
    #[serde(rename = "int")]
    Integer,
    /// Floating-point numbers
    #[serde(rename = "float")]
    Float,
    /// Free text
    #[serde(rename = "str")]
    Text,
    /// Calendar dates, formatted `DD-MM-YYYY` in records
    #[serde(rename = "date")]
    Date,
    /// An ordered set of selectable option strings; the head is the
    /// currently selected one
    #[serde(rename = "list")]
    ListOfText,
}

impl PropertyType {
    /// The canonical short name used in records.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Integer => "int",
            PropertyType::Float => "float",
            PropertyType::Text => "str",
            PropertyType::Date => "date",
            PropertyType::ListOfText => "list",
        }
    }
}

impl FromStr for PropertyType {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int" => Ok(PropertyType::Integer),
            "float" => Ok(PropertyType::Float),
            "str" => Ok(PropertyType::Text),
            "date" => Ok(PropertyType::Date),
            "list" => Ok(PropertyType::ListOfText),
            other => Err(TaskError::UnknownPropertyType {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed property value, one arm per [`PropertyType`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    ListOfText(Vec<String>),
}

impl PropertyValue {
    /// The type this value inhabits.
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Integer(_) => PropertyType::Integer,
            PropertyValue::Float(_) => PropertyType::Float,
            PropertyValue::Text(_) => PropertyType::Text,
            PropertyValue::Date(_) => PropertyType::Date,
            PropertyValue::ListOfText(_) => PropertyType::ListOfText,
        }
    }

    /// Type-formatted JSON form: numbers as numbers, dates as `DD-MM-YYYY`
    /// strings, lists as arrays.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::Integer(i) => serde_json::Value::from(*i),
            PropertyValue::Float(f) => serde_json::Value::from(*f),
            PropertyValue::Text(s) => serde_json::Value::from(s.as_str()),
            PropertyValue::Date(d) => serde_json::Value::from(format_date(*d)),
            PropertyValue::ListOfText(items) => serde_json::Value::from(items.clone()),
        }
    }

    /// Parse a record value of the given declared type. A JSON null is an
    /// undefined value.
    pub fn from_json(
        property_type: PropertyType,
        value: &serde_json::Value,
    ) -> Result<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }

        let parsed = match property_type {
            PropertyType::Integer => value.as_i64().map(PropertyValue::Integer),
            PropertyType::Float => value.as_f64().map(PropertyValue::Float),
            PropertyType::Text => value.as_str().map(|s| PropertyValue::Text(s.to_string())),
            PropertyType::Date => match value.as_str() {
                Some(s) => Some(PropertyValue::Date(parse_date(s)?)),
                None => None,
            },
            PropertyType::ListOfText => match value.as_array() {
                Some(items) => {
                    let mut options = Vec::with_capacity(items.len());
                    for item in items {
                        match item.as_str() {
                            Some(s) => options.push(s.to_string()),
                            None => {
                                return Err(TaskError::InvalidRecord {
                                    message: format!("non-string list option: {item}"),
                                })
                            }
                        }
                    }
                    Some(PropertyValue::ListOfText(options))
                }
                None => None,
            },
        };

        parsed.map(Some).ok_or_else(|| TaskError::InvalidRecord {
            message: format!("value {value} does not fit type '{property_type}'"),
        })
    }

    /// Hash of the current value, used by the task's content hash.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self {
            PropertyValue::Integer(i) => i.hash(&mut hasher),
            PropertyValue::Float(f) => f.to_bits().hash(&mut hasher),
            PropertyValue::Text(s) => s.hash(&mut hasher),
            PropertyValue::Date(d) => d.hash(&mut hasher),
            PropertyValue::ListOfText(items) => items.hash(&mut hasher),
        }
        hasher.finish()
    }
}

/// Natural string form used when substituting into template text. Lists
/// render as their selected (head) option.
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(i) => write!(f, "{i}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Date(d) => f.write_str(&format_date(*d)),
            PropertyValue::ListOfText(items) => {
                f.write_str(items.first().map(String::as_str).unwrap_or_default())
            }
        }
    }
}

/// On-disk record shape for one property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Canonical machine key
    pub name: String,
    /// Type-formatted value, null when undefined
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub required: bool,
}

/// A single named, typed, optionally-required slot holding a current value
/// and remembering its first-ever assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    property_type: PropertyType,
    required: bool,
    value: Option<PropertyValue>,
    default_value: Option<PropertyValue>,
}

impl Property {
    /// Create an empty property with the given display name and type.
    pub fn new(name: impl Into<String>, property_type: PropertyType, required: bool) -> Self {
        Self {
            name: name.into(),
            property_type,
            required,
            value: None,
            default_value: None,
        }
    }

    /// Display name (human label form).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type.
    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// Whether this slot must be filled for the task to be usable.
    pub fn required(&self) -> bool {
        self.required
    }

    /// Whether a value has been assigned.
    pub fn defined(&self) -> bool {
        self.value.is_some()
    }

    /// Current value for consumers: list-valued properties yield their
    /// selected (head) option as text, everything else the stored value.
    pub fn value(&self) -> Option<PropertyValue> {
        match &self.value {
            Some(PropertyValue::ListOfText(items)) => items
                .first()
                .map(|head| PropertyValue::Text(head.clone())),
            other => other.clone(),
        }
    }

    /// The stored value as-is, full list included.
    pub fn raw_value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    /// First-ever assigned value, fixed at the first successful
    /// [`set_value`](Self::set_value).
    pub fn default_value(&self) -> Option<&PropertyValue> {
        self.default_value.as_ref()
    }

    /// Assign a value.
    ///
    /// A value of the wrong type is rejected, with one exception: handing a
    /// text value to a list-valued property selects that option, moving it
    /// to the head of the list (inserting it if new). `required`, when
    /// given, updates the flag as a side effect.
    pub fn set_value(&mut self, value: PropertyValue, required: Option<bool>) -> Result<()> {
        let stored = match (&self.property_type, value) {
            (PropertyType::ListOfText, PropertyValue::Text(option)) => {
                let mut items = match self.value.take() {
                    Some(PropertyValue::ListOfText(items)) => items,
                    _ => Vec::new(),
                };
                items.retain(|existing| existing != &option);
                items.insert(0, option);
                PropertyValue::ListOfText(items)
            }
            (_, value) if value.property_type() == self.property_type => value,
            (_, value) => {
                return Err(TaskError::TypeMismatch {
                    name: self.name.clone(),
                    expected: self.property_type.as_str().to_string(),
                    actual: value.property_type().as_str().to_string(),
                })
            }
        };

        if self.default_value.is_none() {
            self.default_value = Some(stored.clone());
        }
        self.value = Some(stored);

        if let Some(required) = required {
            self.required = required;
        }
        Ok(())
    }

    /// Hash of the current value; undefined hashes to zero.
    pub fn content_hash(&self) -> u64 {
        self.value
            .as_ref()
            .map(PropertyValue::content_hash)
            .unwrap_or(0)
    }

    /// Serialize to the `{name, value, type, required}` record.
    pub fn to_record(&self) -> PropertyRecord {
        PropertyRecord {
            name: to_canonical(&self.name),
            value: self
                .value
                .as_ref()
                .map(PropertyValue::to_json)
                .unwrap_or(serde_json::Value::Null),
            property_type: self.property_type,
            required: self.required,
        }
    }

    /// Serialize to a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_record())?)
    }

    /// Rebuild from a record. The stored value becomes the default, as it
    /// was the first value this property ever held here.
    pub fn from_record(record: &PropertyRecord) -> Result<Self> {
        let mut property = Property::new(
            from_canonical(&record.name),
            record.property_type,
            record.required,
        );
        if let Some(value) = PropertyValue::from_json(record.property_type, &record.value)? {
            // Bypass list promotion: the record holds the full stored shape.
            property.default_value = Some(value.clone());
            property.value = Some(value);
        }
        Ok(property)
    }

    /// Rebuild from a JSON value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let record: PropertyRecord = serde_json::from_value(value.clone())?;
        Self::from_record(&record)
    }
}
