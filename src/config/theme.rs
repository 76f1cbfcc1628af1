//! Folding a module's configuration into the project's.
//!
//! Everything here is keep-left: the project and modules applied earlier
//! always win, a module only fills gaps. Applying modules in resolver order
//! therefore makes the first applicant win.

use super::key_path::KeyPath;
use super::modules::Module;
use super::store::ConfigStore;
use serde_json::Value;
use tracing::debug;

const PARAMS_KEY: &str = "params";
const LANGUAGES_KEY: &str = "languages";
const MENUS_KEY: &str = "menus";

/// Top-level keys propagated from a module into the project.
pub const PROPAGATED_KEYS: [&str; 3] = [PARAMS_KEY, "outputformats", "mediatypes"];

/// Merge one module's configuration into `store`.
pub fn apply_theme_config(store: &mut ConfigStore, module: &Module) {
    let theme = &module.config;
    debug!("Applying config from module {}", module.path);

    for key in PROPAGATED_KEYS {
        merge_string_map_keep_left(store, theme, None, &KeyPath::new([key]));
    }

    let languages = KeyPath::new([LANGUAGES_KEY]);
    if store.is_set(&languages) && theme.is_set(&languages) {
        // A module may add params and menus to languages the project has,
        // never new languages.
        let project_langs: Vec<String> = store
            .get_string_map(&languages)
            .keys()
            .filter(|lang| !lang.is_empty())
            .cloned()
            .collect();

        let params_root = KeyPath::new([PARAMS_KEY]);
        for lang in &project_langs {
            let lang_params = languages.child(lang).child(PARAMS_KEY);
            merge_string_map_keep_left(store, theme, Some(&params_root), &lang_params);
        }

        for lang in &project_langs {
            let lang_menus = languages.child(lang).child(MENUS_KEY);
            if !theme.is_set(&lang_menus) {
                continue;
            }
            for (name, entry) in theme.get_string_map(&lang_menus) {
                let menu_entry = KeyPath::new([MENUS_KEY, name.as_str()]);
                let menu_lang_entry = lang_menus.child(&name);
                if !store.is_set(&menu_entry) && !store.is_set(&menu_lang_entry) {
                    store.set(&menu_lang_entry, entry);
                }
            }
        }
    }

    // Menus the project does not define become low-priority defaults.
    let menus = KeyPath::new([MENUS_KEY]);
    if theme.is_set(&menus) {
        for (name, entry) in theme.get_string_map(&menus) {
            let menu_entry = menus.child(&name);
            if !store.is_set(&menu_entry) {
                store.set_default(&menu_entry, entry);
            }
        }
    }
}

/// Keep-left merge of the mapping at `key` from `theme` into `store`.
///
/// If `store` has nothing at `key` the theme's value is adopted whole,
/// unless `root_key` (a different, broader key such as `params` for
/// `languages.fr.params`) is set in `store`. Otherwise only sub-keys missing
/// from `store` are added; with a `root_key`, sub-keys already set under it
/// are skipped too.
pub fn merge_string_map_keep_left(
    store: &mut ConfigStore,
    theme: &ConfigStore,
    root_key: Option<&KeyPath>,
    key: &KeyPath,
) {
    if !theme.is_set(key) {
        return;
    }

    let root_key = root_key.filter(|root| *root != key);
    let root_set = root_key.is_some_and(|root| store.is_set(root));

    if !store.is_set(key) && !root_set {
        if let Some(value) = theme.get(key) {
            store.set(key, value);
        }
        return;
    }

    if matches!(store.get(key), Some(ref value) if !value.is_object()) {
        return;
    }
    let existing = store.get_string_map(key);

    let Some(Value::Object(incoming)) = theme.get(key) else {
        return;
    };
    for (sub_key, value) in incoming {
        if existing.contains_key(&sub_key) {
            continue;
        }
        if let Some(root) = root_key
            && store.is_set(&root.child(&sub_key))
        {
            continue;
        }
        store.set(&key.child(&sub_key), value);
    }
}
