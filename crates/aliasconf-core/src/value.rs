//! Configuration value types
//!
//! Represents merged configuration data before it is expanded into a tree.
//! Values can be scalars (string, int, float, bool, null),
//! sequences (arrays), or mappings (objects).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A configuration value as handed over by the layer merger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[derive(Default)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value (may contain `{name}` placeholders)
    String(String),
    /// Sequence of values
    Sequence(Vec<Value>),
    /// Mapping of string keys to values, in insertion order
    Mapping(IndexMap<String, Value>),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if this value is a sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    /// Check if this value is a mapping
    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    /// Scalars terminate tree expansion
    pub fn is_scalar(&self) -> bool {
        !self.is_sequence() && !self.is_mapping()
    }

    /// Get as boolean if this is a Bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float or Integer
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as str if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as slice if this is a Sequence
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Get as mapping if this is a Mapping
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Get a mutable mapping if this is a Mapping
    pub fn as_mapping_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Render a scalar the way it is substituted into templates.
    ///
    /// Returns `None` for null, sequences and mappings.
    pub fn to_template_string(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }

    /// Collect the string elements of a sequence, or `None` if this is not a
    /// sequence made only of strings
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        self.as_sequence()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Returns the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Sequence(seq) => {
                write!(f, "[")?;
                for (i, v) in seq.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Mapping(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_yaml_preserves_order() {
        let value: Value = serde_yaml::from_str("b: 1\na: two\nc: [x, y]\n").unwrap();
        let map = value.as_mapping().unwrap();

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(map["b"], Value::Integer(1));
        assert_eq!(map["a"], Value::String("two".into()));
        assert_eq!(map["c"], Value::from(vec!["x", "y"]));
    }

    #[test]
    fn test_deserialize_json_scalars() {
        let value: Value =
            serde_json::from_str(r#"{"n": null, "f": 2.5, "t": true, "i": -3}"#).unwrap();
        let map = value.as_mapping().unwrap();

        assert!(map["n"].is_null());
        assert_eq!(map["f"].as_f64(), Some(2.5));
        assert_eq!(map["t"].as_bool(), Some(true));
        assert_eq!(map["i"].as_i64(), Some(-3));
    }

    #[test]
    fn test_value_type_checks() {
        assert!(Value::Null.is_null());
        assert!(Value::Null.is_scalar());
        assert!(Value::String("hello".into()).is_string());
        assert!(Value::Sequence(vec![]).is_sequence());
        assert!(!Value::Sequence(vec![]).is_scalar());
        assert!(Value::Mapping(IndexMap::new()).is_mapping());
        assert!(!Value::Mapping(IndexMap::new()).is_scalar());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_i64(), Some(42));
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Integer(42).as_f64(), Some(42.0));
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));
    }

    #[test]
    fn test_to_template_string() {
        assert_eq!(Value::Integer(30).to_template_string(), Some("30".into()));
        assert_eq!(Value::Bool(false).to_template_string(), Some("false".into()));
        assert_eq!(Value::from("abc").to_template_string(), Some("abc".into()));
        assert_eq!(Value::Null.to_template_string(), None);
        assert_eq!(Value::from(vec!["a"]).to_template_string(), None);
    }

    #[test]
    fn test_as_string_list() {
        assert_eq!(
            Value::from(vec!["py", "python3"]).as_string_list(),
            Some(vec!["py".to_string(), "python3".to_string()])
        );
        assert_eq!(
            Value::Sequence(vec![Value::from("py"), Value::Integer(3)]).as_string_list(),
            None
        );
        assert_eq!(Value::from("py").as_string_list(), None);
    }

    #[test]
    fn test_display_nested() {
        let mut map = IndexMap::new();
        map.insert("run".into(), Value::from("python3"));
        map.insert("ext".into(), Value::from(vec!["py", "pyw"]));

        assert_eq!(Value::Mapping(map).to_string(), "{run: python3, ext: [py, pyw]}");
    }
}
