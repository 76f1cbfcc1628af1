//! The configuration store: explicit values over a default tier.
//!
//! Explicit values live in one JSON object tree and are written either by
//! overlay merges of decoded files or by direct `set` calls. Defaults are
//! recorded at the exact key path they were set at and only show through
//! where the explicit tree has nothing at that path.

use super::key_path::KeyPath;
use super::languages::Languages;
use super::merge::{MergeConflict, lowercase_keys, overlay_merge};
use super::modules::{Module, ModulesClient};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Environment variables consulted before any stored value.
///
/// A key path `params.color` with prefix `SITE` maps to `SITE_PARAMS_COLOR`.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    prefix: String,
    vars: BTreeMap<String, String>,
}

impl EnvOverrides {
    pub fn new<I, K, V>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            prefix: prefix.to_uppercase(),
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_uppercase(), v.into()))
                .collect(),
        }
    }

    /// The variable name a key path maps to, if a prefix is configured.
    pub fn var_name(&self, path: &KeyPath) -> Option<String> {
        if self.prefix.is_empty() || path.is_root() {
            return None;
        }
        Some(format!(
            "{}_{}",
            self.prefix,
            path.segments().join("_").to_uppercase()
        ))
    }

    fn lookup(&self, path: &KeyPath) -> Option<&str> {
        if self.vars.is_empty() {
            return None;
        }
        let name = self.var_name(path)?;
        self.vars.get(&name).map(String::as_str)
    }
}

/// Nested key-value configuration with an explicit and a default tier.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    explicit: Map<String, Value>,
    defaults: BTreeMap<KeyPath, Value>,
    aliases: BTreeMap<String, String>,
    env: EnvOverrides,

    // Published by module collection and language derivation. Not merged.
    all_modules: Vec<Module>,
    modules_client: Option<Arc<ModulesClient>>,
    languages: Option<Languages>,
}

fn lookup<'a>(map: &'a Map<String, Value>, path: &KeyPath) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let mut current = map.get(first)?;
    for segment in rest {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Insert `value` at `rest` below `target` unless something is already there
/// or a non-mapping blocks the way.
fn insert_missing(target: &mut Value, rest: &[String], value: &Value) {
    let Some((head, tail)) = rest.split_first() else {
        return;
    };
    let Value::Object(map) = target else {
        return;
    };
    if tail.is_empty() {
        map.entry(head.clone()).or_insert_with(|| value.clone());
        return;
    }
    let next = map
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    insert_missing(next, tail, value);
}

fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(lowercase_keys(map)),
        other => other,
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, env: EnvOverrides) -> Self {
        self.env = env;
        self
    }

    /// Make `alias` an alternative name for the top-level key `key`.
    ///
    /// Values already stored under the alias move to the key.
    pub fn register_alias(&mut self, alias: &str, key: &str) {
        let alias = alias.to_lowercase();
        let key = key.to_lowercase();
        if alias == key {
            return;
        }
        if let Some(value) = self.explicit.remove(&alias) {
            self.explicit.entry(key.clone()).or_insert(value);
        }
        self.aliases.insert(alias, key);
    }

    fn resolve(&self, path: &KeyPath) -> KeyPath {
        match path.first().and_then(|first| self.aliases.get(first)) {
            Some(target) => path.with_first(target),
            None => path.clone(),
        }
    }

    /// A default at `key` is shadowed by an explicit value at `key` or by an
    /// explicit non-mapping at any ancestor.
    fn default_active(&self, key: &KeyPath) -> bool {
        if lookup(&self.explicit, key).is_some() {
            return false;
        }
        key.ancestors().all(|ancestor| {
            matches!(
                lookup(&self.explicit, &ancestor),
                None | Some(Value::Object(_))
            )
        })
    }

    /// The most specific active default at `path` or above it, navigated
    /// down to `path`.
    fn covering_default(&self, path: &KeyPath) -> Option<Value> {
        let mut candidates: Vec<KeyPath> = path.ancestors().collect();
        candidates.push(path.clone());
        for candidate in candidates.into_iter().rev() {
            let Some(value) = self.defaults.get(&candidate) else {
                continue;
            };
            if !self.default_active(&candidate) {
                continue;
            }
            let rest = path.strip_prefix(&candidate).unwrap_or_default();
            let mut current = value;
            let mut found = true;
            for segment in rest.segments() {
                match current.as_object().and_then(|m| m.get(segment)) {
                    Some(next) => current = next,
                    None => {
                        found = false;
                        break;
                    }
                }
            }
            if found {
                return Some(current.clone());
            }
        }
        None
    }

    /// Active defaults strictly below `path`, with their relative paths.
    fn defaults_below<'a>(
        &'a self,
        path: &'a KeyPath,
    ) -> impl Iterator<Item = (KeyPath, &'a Value)> + 'a {
        self.defaults
            .range(path.clone()..)
            .take_while(move |(key, _)| key.starts_with(path))
            .filter(move |(key, _)| key.len() > path.len() && self.default_active(key))
            .filter_map(move |(key, value)| key.strip_prefix(path).map(|rest| (rest, value)))
    }

    /// Effective value at `path`: environment, then explicit, then defaults.
    ///
    /// Mappings are returned with active defaults filled in underneath.
    pub fn get(&self, path: &KeyPath) -> Option<Value> {
        let path = self.resolve(path);
        if let Some(value) = self.env.lookup(&path) {
            return Some(Value::String(value.to_string()));
        }

        let mut result = if path.is_root() {
            Some(Value::Object(self.explicit.clone()))
        } else {
            lookup(&self.explicit, &path).cloned()
        };
        if let Some(value) = &result
            && !value.is_object()
        {
            return result;
        }
        if result.is_none() && !path.is_root() {
            result = self.covering_default(&path);
        }
        for (rest, value) in self.defaults_below(&path) {
            let target = result.get_or_insert_with(|| Value::Object(Map::new()));
            insert_missing(target, rest.segments(), value);
        }
        result
    }

    /// Whether `path` has any value, explicit or default. A key explicitly
    /// set to null is set.
    pub fn is_set(&self, path: &KeyPath) -> bool {
        let path = self.resolve(path);
        if path.is_root() {
            return true;
        }
        self.env.lookup(&path).is_some()
            || lookup(&self.explicit, &path).is_some()
            || self.covering_default(&path).is_some()
            || self.defaults_below(&path).next().is_some()
    }

    /// Whether `path` holds an explicit (non-default) value.
    pub fn is_explicit(&self, path: &KeyPath) -> bool {
        lookup(&self.explicit, &self.resolve(path)).is_some()
    }

    pub fn get_str(&self, path: &KeyPath) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn get_string(&self, path: &KeyPath) -> String {
        self.get_str(path).unwrap_or_default()
    }

    pub fn get_bool(&self, path: &KeyPath) -> bool {
        match self.get(path) {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true") || s.trim() == "1",
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        }
    }

    pub fn get_i64(&self, path: &KeyPath) -> Option<i64> {
        match self.get(path)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The mapping at `path`, or an empty map when unset or not a mapping.
    pub fn get_string_map(&self, path: &KeyPath) -> Map<String, Value> {
        match self.get(path) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// A list of strings at `path`. A single string becomes a one-element list.
    pub fn get_string_slice(&self, path: &KeyPath) -> Vec<String> {
        match self.get(path) {
            Some(Value::String(s)) => vec![s],
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Explicitly set `path` to `value`, creating intermediate mappings and
    /// replacing any non-mapping that is in the way.
    pub fn set(&mut self, path: &KeyPath, value: Value) {
        let path = self.resolve(path);
        let value = normalize(value);
        let Some((last, parents)) = path.segments().split_last() else {
            if let Value::Object(map) = value {
                self.explicit = map;
            }
            return;
        };
        let mut current = &mut self.explicit;
        for segment in parents {
            let slot = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(next) = slot else {
                unreachable!("slot was just made a mapping");
            };
            current = next;
        }
        current.insert(last.clone(), value);
    }

    /// Record a default for `path`. Defaults never override explicit values.
    pub fn set_default(&mut self, path: &KeyPath, value: Value) {
        let path = self.resolve(path);
        if path.is_root() {
            return;
        }
        self.defaults.insert(path, normalize(value));
    }

    /// Overlay-merge a decoded tree into the explicit tier.
    pub fn merge_config_map(&mut self, map: Map<String, Value>) -> Result<(), MergeConflict> {
        let mut map = lowercase_keys(map);
        for (alias, key) in &self.aliases {
            if let Some(value) = map.remove(alias) {
                map.entry(key.clone()).or_insert(value);
            }
        }
        overlay_merge(&mut self.explicit, map, &KeyPath::root())
    }

    /// The whole effective tree, defaults filled in. Environment overrides
    /// are not included.
    pub fn all_settings(&self) -> Value {
        let mut root = Value::Object(self.explicit.clone());
        let everything = KeyPath::root();
        for (rest, value) in self.defaults_below(&everything) {
            insert_missing(&mut root, rest.segments(), value);
        }
        root
    }

    pub fn env(&self) -> &EnvOverrides {
        &self.env
    }

    pub fn all_modules(&self) -> &[Module] {
        &self.all_modules
    }

    pub(crate) fn all_modules_mut(&mut self) -> &mut Vec<Module> {
        &mut self.all_modules
    }

    pub fn set_all_modules(&mut self, modules: Vec<Module>) {
        self.all_modules = modules;
    }

    pub fn modules_client(&self) -> Option<&Arc<ModulesClient>> {
        self.modules_client.as_ref()
    }

    pub fn set_modules_client(&mut self, client: Arc<ModulesClient>) {
        self.modules_client = Some(client);
    }

    pub fn languages(&self) -> Option<&Languages> {
        self.languages.as_ref()
    }

    pub fn set_languages(&mut self, languages: Languages) {
        self.languages = Some(languages);
    }
}
