//! Integration tests for folding module configuration into the project.
//!
//! Runs whole resolutions against an in-memory filesystem:
//! - the keep-left rule for params, output formats and media types
//! - first-applicant-wins across modules
//! - language params and menus from modules
//! - a custom module resolver deciding the order

use serde_json::{Value, json};
use site_config::config::{
    ClientConfig, ConfigResolver, ConfigSourceDescriptor, ConfigStore, KeyPath, Module,
    ModuleResolver, ModulesCollection, ResolvedConfig,
};
use site_config::error::ResolverError;
use site_config::fs::MemFs;
use std::sync::Arc;

fn key(path: &str) -> KeyPath {
    KeyPath::parse(path)
}

fn resolve(fs: MemFs) -> ResolvedConfig {
    let d = ConfigSourceDescriptor::new(Arc::new(fs), "/site").with_config_dir("/site/config");
    ConfigResolver::default()
        .resolve(&d, &[])
        .expect("Failed to resolve config")
}

mod keep_left_tests {
    use super::*;

    #[test]
    fn module_params_adopted_when_project_has_none() {
        let fs = MemFs::new()
            .with_file("/site/config.toml", "paginate = 10\ntheme = \"a\"\n")
            .with_file("/site/themes/a/config.toml", "[params]\nfoo = 1\n");

        let store = resolve(fs).store;

        assert_eq!(store.get_i64(&key("params.foo")), Some(1));
        assert_eq!(store.get_i64(&key("paginate")), Some(10));
    }

    #[test]
    fn project_values_unchanged_by_any_number_of_modules() {
        let project = json!({"color": "red", "nested": {"x": 1}});
        let fs = MemFs::new()
            .with_file(
                "/site/config.json",
                json!({"theme": ["a", "b", "c"], "params": project}).to_string(),
            )
            .with_file(
                "/site/themes/a/config.toml",
                "[params]\ncolor = \"a\"\n[params.nested]\nx = 2\ny = 2\n",
            )
            .with_file("/site/themes/b/config.yaml", "params:\n  color: b\n  extra: b\n")
            .with_file("/site/themes/c/config.json", r#"{"params": {"nested": "flat"}}"#);

        let store = resolve(fs).store;

        assert_eq!(store.get_string(&key("params.color")), "red");
        assert_eq!(store.get(&key("params.nested")), Some(json!({"x": 1})));
        assert_eq!(store.get_string(&key("params.extra")), "b");
    }

    #[test]
    fn output_formats_and_media_types_merge_one_level() {
        let fs = MemFs::new()
            .with_file(
                "/site/config.toml",
                "theme = \"a\"\n[outputFormats.rss]\nbaseName = \"feed\"\n",
            )
            .with_file(
                "/site/themes/a/config.toml",
                "[outputFormats.rss]\nbaseName = \"index\"\nmediaType = \"application/rss+xml\"\n\
                 [outputFormats.search]\nbaseName = \"search\"\n\
                 [mediaTypes.\"text/x-search\"]\nsuffixes = [\"idx\"]\n",
            );

        let store = resolve(fs).store;

        assert_eq!(
            store.get(&key("outputformats.rss")),
            Some(json!({"basename": "feed"}))
        );
        assert_eq!(store.get_string(&key("outputformats.search.basename")), "search");
        assert!(store.is_set(&key("mediatypes")));
    }

    #[test]
    fn non_propagated_keys_stay_with_the_module() {
        let fs = MemFs::new()
            .with_file("/site/config.toml", "theme = \"a\"\n")
            .with_file(
                "/site/themes/a/config.toml",
                "title = \"Theme title\"\npaginate = 3\n[taxonomies]\nseries = \"series\"\n",
            );

        let store = resolve(fs).store;

        assert!(!store.is_set(&key("title")));
        assert_eq!(store.get_i64(&key("paginate")), Some(10));
        assert_eq!(store.get_string(&key("taxonomies.tag")), "tags");
        assert!(!store.is_set(&key("taxonomies.series")));
    }
}

mod ordering_tests {
    use super::*;

    fn two_themes(order: &str) -> MemFs {
        MemFs::new()
            .with_file("/site/config.toml", format!("theme = {order}\n"))
            .with_file("/site/themes/a/config.toml", "[params]\nshared = \"a\"\n")
            .with_file("/site/themes/b/config.toml", "[params]\nshared = \"b\"\nonly_b = true\n")
    }

    #[test]
    fn earlier_module_wins() {
        let store = resolve(two_themes("[\"a\", \"b\"]")).store;
        assert_eq!(store.get_string(&key("params.shared")), "a");
        assert!(store.get_bool(&key("params.only_b")));
    }

    #[test]
    fn reversing_order_changes_winner() {
        let store = resolve(two_themes("[\"b\", \"a\"]")).store;
        assert_eq!(store.get_string(&key("params.shared")), "b");
    }

    #[test]
    fn nested_import_applies_after_its_parent() {
        let fs = MemFs::new()
            .with_file("/site/config.toml", "theme = [\"child\", \"other\"]\n")
            .with_file(
                "/site/themes/child/config.toml",
                "theme = \"base\"\n[params]\nlevel = \"child\"\n",
            )
            .with_file(
                "/site/themes/base/config.toml",
                "[params]\nlevel = \"base\"\nbase_only = 1\n",
            )
            .with_file("/site/themes/other/config.toml", "[params]\nbase_only = 2\n");

        let resolved = resolve(fs);
        let paths: Vec<&str> = resolved
            .store
            .all_modules()
            .iter()
            .map(|m| m.path.as_str())
            .collect();

        assert_eq!(paths, vec!["child", "base", "other", "project"]);
        assert_eq!(resolved.store.get_string(&key("params.level")), "child");
        assert_eq!(resolved.store.get_i64(&key("params.base_only")), Some(1));
    }
}

mod menu_tests {
    use super::*;

    #[test]
    fn project_menu_entry_kept() {
        let fs = MemFs::new()
            .with_file(
                "/site/config.toml",
                "theme = \"b\"\n[menus.main]\nhome = \"/\"\n",
            )
            .with_file("/site/themes/b/config.toml", "[menus.main]\nhome = \"/x\"\n");

        let store = resolve(fs).store;

        assert_eq!(store.get_string(&key("menus.main.home")), "/");
    }

    #[test]
    fn module_menus_are_defaults_beside_project_menus() {
        let fs = MemFs::new()
            .with_file(
                "/site/config.toml",
                "theme = [\"a\", \"b\"]\n[[menus.footer]]\nname = \"Imprint\"\n",
            )
            .with_file("/site/themes/a/config.toml", "[[menus.main]]\nname = \"From A\"\n")
            .with_file(
                "/site/themes/b/config.toml",
                "[[menus.main]]\nname = \"From B\"\n[[menus.side]]\nname = \"Side\"\n",
            );

        let store = resolve(fs).store;
        let menus = store.get_string_map(&key("menus"));

        assert_eq!(menus.get("footer"), Some(&json!([{"name": "Imprint"}])));
        assert_eq!(menus.get("main"), Some(&json!([{"name": "From A"}])));
        assert_eq!(menus.get("side"), Some(&json!([{"name": "Side"}])));
        assert!(!store.is_explicit(&key("menus.main")));
    }

    #[test]
    fn legacy_menu_key_in_theme_is_migrated() {
        let fs = MemFs::new()
            .with_file("/site/config.toml", "theme = \"a\"\n")
            .with_file("/site/themes/a/config.toml", "[[menu.main]]\nname = \"Home\"\n");

        let store = resolve(fs).store;

        assert!(store.is_set(&key("menus.main")));
        assert!(!store.is_set(&key("menu")));
    }
}

mod language_tests {
    use super::*;

    fn multilingual_site(theme_config: &str) -> MemFs {
        MemFs::new()
            .with_file(
                "/site/config.toml",
                "theme = \"a\"\n[languages.en]\nweight = 1\n[languages.fr]\nweight = 2\n",
            )
            .with_file("/site/themes/a/config.toml", theme_config)
    }

    #[test]
    fn module_cannot_add_languages() {
        let store = resolve(multilingual_site(
            "[languages.de]\nweight = 3\n[languages.de.params]\nx = 1\n",
        ))
        .store;

        assert!(!store.is_set(&key("languages.de")));
        assert_eq!(store.languages().unwrap().len(), 2);
    }

    #[test]
    fn module_language_params_fill_gaps() {
        let fs = multilingual_site(
            "[languages.fr.params]\ngreeting = \"Salut\"\ntagline = \"Thème\"\n",
        )
        .with_file("/site/config/_default/params.fr.toml", "greeting = \"Bonjour\"\n");

        let store = resolve(fs).store;

        assert_eq!(store.get_string(&key("languages.fr.params.greeting")), "Bonjour");
        assert_eq!(store.get_string(&key("languages.fr.params.tagline")), "Thème");
        assert!(!store.is_set(&key("languages.en.params")));
    }

    #[test]
    fn module_language_menus_respect_global_menus() {
        let fs = multilingual_site(
            "[[languages.fr.menus.main]]\nname = \"Accueil\"\n\
             [[languages.fr.menus.footer]]\nname = \"Pied\"\n",
        )
        .with_file("/site/config/_default/menus.toml", "[[footer]]\nname = \"Footer\"\n");

        let store = resolve(fs).store;

        assert_eq!(
            store.get(&key("languages.fr.menus.main")),
            Some(json!([{"name": "Accueil"}]))
        );
        assert!(!store.is_set(&key("languages.fr.menus.footer")));
    }
}

mod custom_resolver_tests {
    use super::*;

    /// Hands back a fixed chain regardless of declarations.
    #[derive(Debug)]
    struct FixedChain(Vec<(&'static str, Value)>);

    fn store_from(value: &Value) -> ConfigStore {
        let mut store = ConfigStore::new();
        if let Value::Object(map) = value {
            store.merge_config_map(map.clone()).unwrap();
        }
        store
    }

    impl ModuleResolver for FixedChain {
        fn collect(&self, config: &ClientConfig) -> Result<ModulesCollection, ResolverError> {
            let mut modules: Vec<Module> = self
                .0
                .iter()
                .enumerate()
                .map(|(i, (path, value))| {
                    Module::new(*path, config.themes_dir.join(path))
                        .with_config_filename(config.themes_dir.join(path).join("config.toml"))
                        .with_config(store_from(value))
                        .with_weight(i as u32)
                })
                .collect();
            modules.push(Module::project(config.working_dir.clone()));
            Ok(ModulesCollection {
                modules,
                manifest: None,
            })
        }

        fn apply_project_config_defaults(
            &self,
            _store: &ConfigStore,
            project: &mut Module,
        ) -> Result<(), ResolverError> {
            project.mounts = vec![site_config::config::Mount::new("src", "content")];
            Ok(())
        }
    }

    #[test]
    fn resolver_order_is_authoritative() {
        let resolver = FixedChain(vec![
            ("second", json!({"params": {"who": "second"}})),
            ("first", json!({"params": {"who": "first"}})),
        ]);
        let fs = MemFs::new().with_file("/site/config.toml", "theme = [\"first\", \"second\"]\n");
        let d = ConfigSourceDescriptor::new(Arc::new(fs), "/site");

        let resolved = ConfigResolver::new(Arc::new(resolver))
            .resolve(&d, &[])
            .unwrap();

        assert_eq!(resolved.store.get_string(&key("params.who")), "second");
        assert_eq!(
            resolved.store.all_modules().last().unwrap().mounts[0].source,
            "src"
        );
        assert!(
            resolved
                .files
                .contains(&std::path::PathBuf::from("/site/themes/second/config.toml"))
        );
    }
}
