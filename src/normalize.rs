//! Conversion of vendor response objects into plain nested values.
//!
//! Vendor objects are trees of "typed objects with keyed fields". Anything
//! that can list its keys and hand out the value behind each key implements
//! [`SoapObject`]; [`normalize`] walks such a tree into a [`Normalized`]
//! value without knowing any object shape up front.

use serde_json::{Map, Value};

/// Capability of a composite vendor object.
pub trait SoapObject {
    /// Field names in declaration order.
    fn keylist(&self) -> Vec<&str>;

    /// Value stored under `key`.
    fn field(&self, key: &str) -> Option<SoapValue<'_>>;
}

/// A field value as seen through [`SoapObject::field`].
pub enum SoapValue<'a> {
    Composite(&'a dyn SoapObject),
    List(Vec<SoapValue<'a>>),
    Text(&'a str),
    Scalar(Value),
}

impl std::fmt::Debug for SoapValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoapValue::Composite(object) => f
                .debug_tuple("Composite")
                .field(&object.keylist())
                .finish(),
            SoapValue::List(items) => f.debug_tuple("List").field(items).finish(),
            SoapValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            SoapValue::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
        }
    }
}

impl SoapObject for Map<String, Value> {
    fn keylist(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn field(&self, key: &str) -> Option<SoapValue<'_>> {
        self.get(key).map(classify)
    }
}

/// Whether a JSON-shaped vendor value is a composite object.
pub fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

/// View a JSON-shaped vendor value through the [`SoapValue`] lens.
pub fn classify(value: &Value) -> SoapValue<'_> {
    match value {
        Value::Object(map) => SoapValue::Composite(map),
        Value::Array(items) => SoapValue::List(items.iter().map(classify).collect()),
        Value::String(text) => SoapValue::Text(text),
        other => SoapValue::Scalar(other.clone()),
    }
}

/// Result of normalizing a vendor object.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Scalar(Value),
    Composite(Vec<(String, Normalized)>),
    List(Vec<Normalized>),
}

impl Normalized {
    /// Look up a field of a composite.
    pub fn get(&self, key: &str) -> Option<&Normalized> {
        match self {
            Normalized::Composite(fields) => fields
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Normalized::Scalar(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Normalized]> {
        match self {
            Normalized::List(items) => Some(items),
            _ => None,
        }
    }

    /// Scalar rendered as text: strings as is, numbers and booleans formatted.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Normalized::Scalar(Value::String(text)) => Some(text.clone()),
            Normalized::Scalar(Value::Number(number)) => Some(number.to_string()),
            Normalized::Scalar(Value::Bool(flag)) => Some(flag.to_string()),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Normalized::Scalar(value) => value,
            Normalized::Composite(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, value.into_value()))
                    .collect(),
            ),
            Normalized::List(items) => {
                Value::Array(items.into_iter().map(Normalized::into_value).collect())
            }
        }
    }
}

impl From<Normalized> for Value {
    fn from(normalized: Normalized) -> Self {
        normalized.into_value()
    }
}

/// Normalize one composite vendor object.
pub fn normalize(object: &dyn SoapObject) -> Normalized {
    let fields = object
        .keylist()
        .into_iter()
        .filter_map(|key| {
            let value = object.field(key)?;
            Some((key.to_string(), normalize_field(value)))
        })
        .collect();
    Normalized::Composite(fields)
}

/// Normalize a JSON-shaped vendor value, which may be a composite, a list of
/// composites, or a bare scalar.
pub fn normalize_value(value: &Value) -> Normalized {
    normalize_field(classify(value))
}

fn normalize_field(value: SoapValue<'_>) -> Normalized {
    match value {
        SoapValue::Composite(object) => normalize(object),
        SoapValue::List(items) => Normalized::List(
            items
                .into_iter()
                .map(|item| match item {
                    SoapValue::Composite(object) => normalize(object),
                    other => Normalized::Scalar(passthrough(other)),
                })
                .collect(),
        ),
        SoapValue::Text(text) => Normalized::Scalar(Value::String(text.to_string())),
        SoapValue::Scalar(value) => Normalized::Scalar(value),
    }
}

/// List members that are not composites are kept as they came.
fn passthrough(value: SoapValue<'_>) -> Value {
    match value {
        SoapValue::Composite(object) => normalize(object).into_value(),
        SoapValue::List(items) => Value::Array(items.into_iter().map(passthrough).collect()),
        SoapValue::Text(text) => Value::String(text.to_string()),
        SoapValue::Scalar(value) => value,
    }
}
