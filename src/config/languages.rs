//! Language settings derived from the resolved configuration.

use super::key_path::KeyPath;
use super::store::ConfigStore;
use crate::error::ConfigError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use tracing::info;

/// One configured content language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Language {
    pub lang: String,
    /// Sort weight. Zero sorts after every positive weight.
    pub weight: i64,
    pub title: String,
    /// Content directory for this language. Empty means the site's.
    pub content_dir: String,
    pub params: Map<String, Value>,
}

impl Language {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            weight: 0,
            title: String::new(),
            content_dir: String::new(),
            params: Map::new(),
        }
    }
}

/// Languages in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Languages(Vec<Language>);

impl Languages {
    pub fn new(mut languages: Vec<Language>) -> Self {
        languages.sort_by(compare_languages);
        Self(languages)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Language> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, lang: &str) -> Option<&Language> {
        self.0.iter().find(|l| l.lang == lang)
    }

    pub fn is_multilingual(&self) -> bool {
        self.0.len() > 1
    }
}

impl<'a> IntoIterator for &'a Languages {
    type Item = &'a Language;
    type IntoIter = std::slice::Iter<'a, Language>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn compare_languages(a: &Language, b: &Language) -> Ordering {
    match (a.weight, b.weight) {
        (0, 0) => a.lang.cmp(&b.lang),
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        (x, y) => x.cmp(&y).then_with(|| a.lang.cmp(&b.lang)),
    }
}

/// Builds the language list from a resolved store.
pub trait LanguageSettingsBuilder: Send + Sync + fmt::Debug {
    /// `previous` is the list from an earlier resolution, if any.
    fn build(
        &self,
        store: &ConfigStore,
        previous: Option<&Languages>,
    ) -> Result<Languages, ConfigError>;
}

/// Reads `languages`, `disableLanguages` and `defaultContentLanguage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLanguagesBuilder;

fn language_from(lang: &str, value: &Value) -> Result<Language, ConfigError> {
    let Value::Object(settings) = value else {
        return Err(ConfigError::Languages(format!(
            "language \"{lang}\" must be a table, got {}",
            super::merge::value_kind(value)
        )));
    };

    let string = |key: &str| {
        settings
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let weight = match settings.get("weight") {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| {
            ConfigError::Languages(format!("language \"{lang}\" has invalid weight \"{s}\""))
        })?,
        Some(other) => {
            return Err(ConfigError::Languages(format!(
                "language \"{lang}\" has invalid weight of type {}",
                super::merge::value_kind(other)
            )));
        }
    };

    let title = match string("title") {
        t if t.is_empty() => string("languagename"),
        t => t,
    };

    Ok(Language {
        lang: lang.to_string(),
        weight,
        title,
        content_dir: string("contentdir"),
        params: settings
            .get("params")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    })
}

impl LanguageSettingsBuilder for DefaultLanguagesBuilder {
    fn build(
        &self,
        store: &ConfigStore,
        previous: Option<&Languages>,
    ) -> Result<Languages, ConfigError> {
        let mut default_lang = store
            .get_string(&KeyPath::new(["defaultcontentlanguage"]))
            .to_lowercase();
        if default_lang.is_empty() {
            default_lang = "en".to_string();
        }

        let disabled: Vec<String> = store
            .get_string_slice(&KeyPath::new(["disablelanguages"]))
            .into_iter()
            .map(|lang| lang.to_lowercase())
            .collect();
        if disabled.contains(&default_lang) {
            return Err(ConfigError::Languages(format!(
                "cannot disable default language \"{default_lang}\""
            )));
        }

        let declared = store.get_string_map(&KeyPath::new(["languages"]));

        let languages = if declared.is_empty() {
            let mut language = Language::new(default_lang.as_str());
            language.title = store.get_string(&KeyPath::new(["title"]));
            language.params = store.get_string_map(&KeyPath::new(["params"]));
            Languages::new(vec![language])
        } else {
            let mut list = Vec::new();
            for (lang, value) in &declared {
                if disabled.contains(lang) {
                    info!("Language \"{}\" is disabled", lang);
                    continue;
                }
                list.push(language_from(lang, value)?);
            }
            if !list.iter().any(|l| l.lang == default_lang) {
                return Err(ConfigError::Languages(format!(
                    "defaultContentLanguage \"{default_lang}\" does not match any language definition"
                )));
            }
            Languages::new(list)
        };

        if let Some(previous) = previous {
            for old in previous {
                if languages.get(&old.lang).is_none() {
                    info!("Language \"{}\" was removed", old.lang);
                }
            }
        }

        Ok(languages)
    }
}
