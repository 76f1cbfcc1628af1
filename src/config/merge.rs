//! Overlay merge for decoded configuration trees.
//!
//! Mappings merge recursively with the overlay winning on key conflicts.
//! Sequences and scalars are replaced entirely, never concatenated.

use super::key_path::KeyPath;
use serde_json::{Map, Value};
use std::fmt;

/// A mapping met a non-mapping value at the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub key: KeyPath,
    pub existing: &'static str,
    pub incoming: &'static str,
}

impl fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot merge {} into {} at key \"{}\"",
            self.incoming, self.existing, self.key
        )
    }
}

impl std::error::Error for MergeConflict {}

/// Short name of a value's shape, used in conflict messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Overlay-merge `overlay` into `base` in place.
///
/// - Mappings are merged recursively: keys in overlay override keys in base
/// - Sequences, strings, numbers, booleans are replaced entirely
/// - A null overlay onto a mapping keeps the mapping
/// - A mapping meeting a non-null scalar or sequence is a [`MergeConflict`]
///
/// `at` is the path of `base` within the whole tree and is only used for
/// error reporting.
pub fn overlay_merge(
    base: &mut Map<String, Value>,
    overlay: Map<String, Value>,
    at: &KeyPath,
) -> Result<(), MergeConflict> {
    for (key, incoming) in overlay {
        let path = at.child(&key);
        match base.get_mut(&key) {
            None => {
                base.insert(key, incoming);
            }
            Some(Value::Object(existing)) => match incoming {
                Value::Object(incoming) => overlay_merge(existing, incoming, &path)?,
                Value::Null => {}
                other => {
                    return Err(MergeConflict {
                        key: path,
                        existing: "mapping",
                        incoming: value_kind(&other),
                    });
                }
            },
            Some(existing) => {
                if incoming.is_object() && !existing.is_null() {
                    return Err(MergeConflict {
                        key: path,
                        existing: value_kind(existing),
                        incoming: "mapping",
                    });
                }
                *existing = incoming;
            }
        }
    }
    Ok(())
}

/// Lower-case every mapping key, recursively. Mappings inside sequences are
/// left as they are.
pub fn lowercase_keys(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in map {
        let value = match value {
            Value::Object(inner) => Value::Object(lowercase_keys(inner)),
            other => other,
        };
        let key = key.to_lowercase();
        match (out.get_mut(&key), value) {
            // `Foo` and `foo` in one document: fold them together.
            (Some(Value::Object(existing)), Value::Object(inner)) => {
                for (k, v) in inner {
                    existing.insert(k, v);
                }
            }
            (_, value) => {
                out.insert(key, value);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn merged(base: Value, overlay: Value) -> Value {
        let mut base = obj(base);
        overlay_merge(&mut base, obj(overlay), &KeyPath::root()).unwrap();
        Value::Object(base)
    }

    #[test]
    fn test_merge_simple_objects() {
        let result = merged(json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4}));
        assert_eq!(result, json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_merge_nested_objects() {
        let result = merged(
            json!({"params": {"author": "me", "color": "red"}, "paginate": 10}),
            json!({"params": {"color": "blue"}}),
        );
        assert_eq!(
            result,
            json!({"params": {"author": "me", "color": "blue"}, "paginate": 10})
        );
    }

    #[test]
    fn test_sequences_replaced_not_concatenated() {
        let result = merged(json!({"ignorefiles": ["a", "b"]}), json!({"ignorefiles": ["c"]}));
        assert_eq!(result, json!({"ignorefiles": ["c"]}));
    }

    #[test]
    fn test_null_keeps_mapping() {
        let result = merged(json!({"params": {"a": 1}}), json!({"params": null}));
        assert_eq!(result, json!({"params": {"a": 1}}));
    }

    #[test]
    fn test_mapping_onto_null_replaces() {
        let result = merged(json!({"params": null}), json!({"params": {"a": 1}}));
        assert_eq!(result, json!({"params": {"a": 1}}));
    }

    #[test]
    fn test_scalar_into_mapping_conflicts() {
        let mut base = obj(json!({"params": {"a": 1}}));
        let err = overlay_merge(&mut base, obj(json!({"params": "x"})), &KeyPath::root())
            .unwrap_err();
        assert_eq!(err.key, KeyPath::parse("params"));
        assert_eq!(err.existing, "mapping");
        assert_eq!(err.incoming, "string");
    }

    #[test]
    fn test_mapping_into_scalar_conflicts_with_nested_path() {
        let mut base = obj(json!({"languages": {"en": {"params": 3}}}));
        let err = overlay_merge(
            &mut base,
            obj(json!({"languages": {"en": {"params": {"a": 1}}}})),
            &KeyPath::root(),
        )
        .unwrap_err();
        assert_eq!(err.key.to_string(), "languages.en.params");
    }

    #[test]
    fn test_lowercase_keys_recurses_into_mappings_only() {
        let map = obj(json!({
            "BaseURL": "http://x",
            "Params": {"MyKey": 1},
            "Menu": [{"Name": "Home"}]
        }));
        let result = Value::Object(lowercase_keys(map));
        assert_eq!(
            result,
            json!({
                "baseurl": "http://x",
                "params": {"mykey": 1},
                "menu": [{"Name": "Home"}]
            })
        );
    }
}
