//! Record helpers: a schemaless `JsonRecord` and the `lenient` field adapter
//! for typed records.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::traits::Record;
use crate::types::SortValue;

/// Display fallback for absent fields.
pub const UNKNOWN: &str = "Unknown";

/// Field adapter for typed records: a wrongly-typed value becomes `None`
/// instead of failing the whole object.
///
/// ```ignore
/// #[derive(Deserialize, Default)]
/// struct Recall {
///     #[serde(default, deserialize_with = "lenient")]
///     recall_number: Option<String>,
/// }
/// ```
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decodes a typed record, falling back to `T::default()` when the value is
/// not an object at all. Pair with `lenient` fields for per-field tolerance.
pub fn from_json_or_default<T: DeserializeOwned + Default>(value: Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

/// A result object kept as raw JSON, addressed by dotted paths such as
/// `registration.us_agent.name`. Arrays met along a path resolve to their
/// first element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonRecord {
    fields: Map<String, Value>,
}

impl JsonRecord {
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = first_scalar(current).as_object()?.get(part)?;
        }
        Some(first_scalar(current))
    }

    pub fn text(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() { None } else { Some(s.to_string()) }
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Text for `path`, or [`UNKNOWN`].
    pub fn display(&self, path: &str) -> String {
        self.text(path).unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn fields(&self) -> &Map<String, Value> { &self.fields }
}

static NULL: Value = Value::Null;

fn first_scalar(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(&NULL),
        other => other,
    }
}

impl Record for JsonRecord {
    fn from_json(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64().map(SortValue::Number),
            Value::String(s) => SortValue::text(s),
            Value::Bool(b) => Some(SortValue::Text(b.to_string())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_paths_walk_objects_and_first_array_elements() {
        let record = JsonRecord::from_json(json!({
            "registration": { "name": "Acme Corp", "us_agent": { "state_code": "CA" } },
            "products": [ { "created_date": "2019-04-02" }, { "created_date": "2021-01-01" } ],
            "proprietary_name": ["Widget", "Gadget"],
        }));
        assert_eq!(record.display("registration.us_agent.state_code"), "CA");
        assert_eq!(record.display("products.created_date"), "2019-04-02");
        assert_eq!(record.display("proprietary_name"), "Widget");
        assert_eq!(record.display("registration.fei_number"), UNKNOWN);
    }

    #[test]
    fn non_object_results_degrade_to_empty_records() {
        let record = JsonRecord::from_json(json!("oops"));
        assert!(record.fields().is_empty());
        assert!(record.sort_value("anything").is_none());
    }
}
