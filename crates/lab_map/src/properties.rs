//! Typed custom properties.
//!
//! Tiled stores custom properties as `[{name, type?, value}]` with loosely typed
//! values; content in this project often writes booleans as the strings
//! `"true"`/`"false"`. Values are classified once here so lookups never
//! re-parse strings.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    String(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: HashMap<String, PropertyValue>,
}

/// Property record as it appears in map and tileset documents.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    value: JsonValue,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_json(props: Vec<JsonProperty>) -> Self {
        let mut out = Self::new();
        for prop in props {
            match classify(prop.kind.as_deref(), prop.value) {
                Some(value) => out.insert(prop.name, value),
                None => log::debug!("Dropping property '{}' with unusable value", prop.name),
            }
        }
        out
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name)? {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Boolean flag lookup that treats anything other than a true boolean as false.
    pub fn flag(&self, name: &str) -> bool {
        self.get_bool(name).unwrap_or(false)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            PropertyValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.values.get(name)? {
            PropertyValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.values.get(name)? {
            PropertyValue::Float(n) => Some(*n),
            PropertyValue::Int(n) => Some(*n as f32),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn bool_from_str(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn classify(kind: Option<&str>, value: JsonValue) -> Option<PropertyValue> {
    match kind {
        Some("bool") => Some(PropertyValue::Bool(match &value {
            JsonValue::Bool(b) => *b,
            JsonValue::String(s) => bool_from_str(s).unwrap_or(false),
            _ => false,
        })),
        Some("int") | Some("object") => value.as_i64().map(PropertyValue::Int),
        Some("float") => value.as_f64().map(|n| PropertyValue::Float(n as f32)),
        _ => match value {
            JsonValue::Bool(b) => Some(PropertyValue::Bool(b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Some(PropertyValue::Int(i)),
                None => n.as_f64().map(|f| PropertyValue::Float(f as f32)),
            },
            JsonValue::String(s) => Some(match bool_from_str(&s) {
                Some(b) => PropertyValue::Bool(b),
                None => PropertyValue::String(s),
            }),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Properties {
        let raw: Vec<JsonProperty> = serde_json::from_str(json).expect("valid property list");
        Properties::from_json(raw)
    }

    #[test]
    fn string_booleans_become_typed() {
        let props = parse(
            r#"[
              {"name":"collidable","type":"string","value":"true"},
              {"name":"slippery","value":"FALSE"}
            ]"#,
        );
        assert_eq!(props.get_bool("collidable"), Some(true));
        assert_eq!(props.get_bool("slippery"), Some(false));
        assert!(props.flag("collidable"));
    }

    #[test]
    fn unrecognised_bool_values_fail_soft() {
        let props = parse(
            r#"[
              {"name":"collidable","type":"bool","value":"yes"},
              {"name":"label","value":"maybe"}
            ]"#,
        );
        assert_eq!(props.get_bool("collidable"), Some(false));
        assert!(!props.flag("label"));
        assert!(!props.flag("absent"));
        assert_eq!(props.get_str("label"), Some("maybe"));
    }

    #[test]
    fn numeric_values_keep_their_type() {
        let props = parse(
            r#"[
              {"name":"damage","type":"int","value":10},
              {"name":"gravity","type":"float","value":9.5},
              {"name":"big","value":5000000000}
            ]"#,
        );
        assert_eq!(props.get_i64("damage"), Some(10));
        assert_eq!(props.get_f32("gravity"), Some(9.5));
        assert_eq!(props.get_i64("big"), Some(5_000_000_000));
        assert_eq!(props.get_f32("damage"), Some(10.0));
    }

    #[test]
    fn direction_strings_stay_strings() {
        let props = parse(r#"[{"name":"direction","value":"down"},{"name":"state","value":"idle"}]"#);
        assert_eq!(props.get_str("direction"), Some("down"));
        assert_eq!(props.get_str("state"), Some("idle"));
        assert_eq!(props.len(), 2);
    }
}
