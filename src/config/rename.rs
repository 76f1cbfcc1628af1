//! Legacy key migration, e.g. singular `menu` to plural `menus`.

use serde_json::{Map, Value};

/// Renames keys whose slash-separated path matches a pattern. A `*` segment
/// matches any single key.
#[derive(Debug, Clone)]
pub struct KeyRenamer {
    rules: Vec<(Vec<String>, String)>,
}

impl KeyRenamer {
    /// Build from `(pattern, new_key)` pairs. Patterns are lower-case paths
    /// such as `languages/*/menu`; the last segment is the key renamed.
    pub fn new(rules: &[(&str, &str)]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|(pattern, to)| {
                    (
                        pattern.split('/').map(|s| s.to_lowercase()).collect(),
                        to.to_lowercase(),
                    )
                })
                .collect(),
        }
    }

    /// The renames applied to every decoded config tree.
    pub fn legacy() -> Self {
        Self::new(&[("menu", "menus"), ("languages/*/menu", "menus")])
    }

    fn target_for(&self, path: &[&str]) -> Option<&str> {
        self.rules.iter().find_map(|(pattern, to)| {
            let matches = pattern.len() == path.len()
                && pattern
                    .iter()
                    .zip(path)
                    .all(|(p, segment)| p == "*" || p == segment);
            matches.then_some(to.as_str())
        })
    }

    /// Rename matching keys in place.
    pub fn rename(&self, map: &mut Map<String, Value>) {
        let mut path = Vec::new();
        self.rename_at(map, &mut path);
    }

    fn rename_at(&self, map: &mut Map<String, Value>, path: &mut Vec<String>) {
        let keys: Vec<String> = map.keys().cloned().collect();
        for key in keys {
            path.push(key.clone());
            let segments: Vec<&str> = path.iter().map(String::as_str).collect();
            let target = self.target_for(&segments).map(str::to_string);
            path.pop();

            let key = match target {
                Some(to) if to != key => {
                    if let Some(value) = map.remove(&key) {
                        map.insert(to.clone(), value);
                    }
                    to
                }
                _ => key,
            };

            if let Some(Value::Object(child)) = map.get_mut(&key) {
                path.push(key);
                self.rename_at(child, path);
                path.pop();
            }
        }
    }
}

impl Default for KeyRenamer {
    fn default() -> Self {
        Self::legacy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renamed(value: Value) -> Value {
        let Value::Object(mut map) = value else {
            panic!("not an object")
        };
        KeyRenamer::legacy().rename(&mut map);
        Value::Object(map)
    }

    #[test]
    fn test_top_level_menu_renamed() {
        assert_eq!(
            renamed(json!({"menu": {"main": [{"name": "Home"}]}})),
            json!({"menus": {"main": [{"name": "Home"}]}})
        );
    }

    #[test]
    fn test_language_menu_renamed() {
        assert_eq!(
            renamed(json!({"languages": {"fr": {"menu": {"main": []}, "weight": 2}}})),
            json!({"languages": {"fr": {"menus": {"main": []}, "weight": 2}}})
        );
    }

    #[test]
    fn test_nested_unrelated_menu_untouched() {
        assert_eq!(
            renamed(json!({"params": {"menu": "x"}})),
            json!({"params": {"menu": "x"}})
        );
    }

    #[test]
    fn test_plural_left_alone() {
        assert_eq!(
            renamed(json!({"menus": {"main": []}})),
            json!({"menus": {"main": []}})
        );
    }
}
