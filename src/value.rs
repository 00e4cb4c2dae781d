//! Persistent form values
//!
//! JSON-shaped value whose containers are `Arc`-shared. Every write replaces
//! the containers along the root-to-node path and keeps every other subtree
//! shared, so snapshots taken mid-validation are never torn and unchanged
//! subtrees keep their identity.
//!
//! "undefined" is not a variant: it is `Option<Value>::None`, and an absent
//! object key reads as `None`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;

use crate::path::Key;

pub type Map = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Object(Arc<Map>),
}

impl Value {
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Arc::new(items.into_iter().collect()))
    }

    pub fn empty_object() -> Self {
        Value::Object(Arc::new(Map::new()))
    }

    /// Identity comparison: containers by pointer, scalars by value
    ///
    /// This is what `dirty` uses. Two structurally equal objects built
    /// separately are not the same.
    pub fn same(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Array(x), Value::Array(y)) => Arc::ptr_eq(x, y),
            (Value::Object(x), Value::Object(y)) => Arc::ptr_eq(x, y),
            (Value::Array(_), _) | (Value::Object(_), _) => false,
            (_, Value::Array(_)) | (_, Value::Object(_)) => false,
            (x, y) => x == y,
        }
    }

    /// [`Value::same`] lifted over undefined
    pub fn same_opt(a: Option<&Value>, b: Option<&Value>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(x), Some(y)) => Value::same(x, y),
            _ => false,
        }
    }

    /// Child lookup by key; type mismatches read as undefined
    pub fn get(&self, key: &Key) -> Option<&Value> {
        match (self, key) {
            (Value::Object(map), Key::Field(name)) => map.get(name),
            (Value::Array(items), Key::Index(idx)) => items.get(*idx),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type label used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// True when a `Required` check would reject the value
    ///
    /// Undefined, null, empty strings, non-finite numbers and empty arrays
    /// count as empty. Booleans and objects never do.
    pub fn is_blank(value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(Value::Number(n)) => !n.as_f64().map(f64::is_finite).unwrap_or(false),
            Some(Value::Bool(_)) | Some(Value::Object(_)) => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from))
            }
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_uses_identity_for_containers() {
        let a = Value::object([("x", Value::from(1))]);
        let b = Value::object([("x", Value::from(1))]);
        assert_eq!(a, b);
        assert!(!Value::same(&a, &b));
        assert!(Value::same(&a, &a.clone()));
    }

    #[test]
    fn same_uses_equality_for_scalars() {
        assert!(Value::same(&Value::from("a"), &Value::from("a")));
        assert!(!Value::same(&Value::from(1), &Value::from("1")));
        assert!(Value::same_opt(None, None));
        assert!(!Value::same_opt(Some(&Value::Null), None));
    }

    #[test]
    fn json_conversion_round_trips() {
        let json = json!({"name": "Ada", "tags": ["a", "b"], "age": 36, "ok": true, "n": null});
        let value = Value::from(json.clone());
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn get_by_key() {
        let value = Value::from(json!({"items": [10, 20]}));
        let items = value.get(&Key::Field("items".into())).unwrap();
        assert_eq!(items.get(&Key::Index(1)), Some(&Value::from(20)));
        assert_eq!(items.get(&Key::Field("x".into())), None);
    }

    #[test]
    fn blank_values() {
        assert!(Value::is_blank(None));
        assert!(Value::is_blank(Some(&Value::Null)));
        assert!(Value::is_blank(Some(&Value::from(""))));
        assert!(Value::is_blank(Some(&Value::array([]))));
        assert!(!Value::is_blank(Some(&Value::from(false))));
        assert!(!Value::is_blank(Some(&Value::from(0))));
        assert!(!Value::is_blank(Some(&Value::empty_object())));
    }

    #[test]
    fn serde_goes_through_json() {
        let value: Value = serde_json::from_str(r#"{"a": [1, 2]}"#).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":[1,2]}"#);
    }
}
