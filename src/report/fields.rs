//! Column declarations for report requests.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Declared type of a report field, as named by the field catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Money,
    Date,
    Double,
    Long,
    Integer,
    /// Any list-valued type, e.g. `StringList` or `LongList`.
    List(String),
    Other(String),
}

impl FieldType {
    pub fn parse(name: &str) -> Self {
        match name {
            "Money" => FieldType::Money,
            "Date" => FieldType::Date,
            "Double" => FieldType::Double,
            "Long" => FieldType::Long,
            "Integer" => FieldType::Integer,
            other if other.contains("List") => FieldType::List(other.to_string()),
            other => FieldType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Money => "Money",
            FieldType::Date => "Date",
            FieldType::Double => "Double",
            FieldType::Long => "Long",
            FieldType::Integer => "Integer",
            FieldType::List(name) | FieldType::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        FieldType::parse(name)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied cleaning function. Receives the raw, untrimmed cell.
pub type Cleaner = Arc<dyn Fn(&str) -> anyhow::Result<Value> + Send + Sync>;

/// One requested report column.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    pub alias: Option<String>,
    pub field_type: Option<FieldType>,
    pub cleaning: Option<Cleaner>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            field_type: None,
            cleaning: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn field_type(mut self, field_type: impl Into<FieldType>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    pub fn cleaning<F>(mut self, cleaner: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.cleaning = Some(Arc::new(cleaner));
        self
    }

    /// Column title in the header row.
    pub fn header(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("field_type", &self.field_type)
            .field("cleaning", &self.cleaning.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Constant-valued synthetic column.
#[derive(Debug, Clone, PartialEq)]
pub struct AdditionalField {
    pub name: String,
    pub value: Value,
    pub prepend: bool,
}

impl AdditionalField {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            prepend: false,
        }
    }

    pub fn prepend(mut self) -> Self {
        self.prepend = true;
        self
    }
}

/// Place additional values around a row the same way for header and data:
/// appended in declaration order, prepends each inserted at the front.
pub(crate) fn splice_additional<T, F>(row: &mut Vec<T>, additional: &[AdditionalField], mut value: F)
where
    F: FnMut(&AdditionalField) -> T,
{
    for field in additional {
        if field.prepend {
            row.insert(0, value(field));
        } else {
            row.push(value(field));
        }
    }
}
