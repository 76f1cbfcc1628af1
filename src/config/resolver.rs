//! The resolution pipeline.
//!
//! Order matters and is fixed:
//! 1. primary config files
//! 2. the config directory (`_default/`, then the environment)
//! 3. built-in defaults, as a lower tier
//! 4. caller hooks
//! 5. module collection
//! 6. module config, keep-left, in resolver order
//! 7. language settings
//! 8. project mount defaults on the last module

use super::decode::{ConfigDecoder, DefaultDecoder};
use super::defaults::load_default_settings;
use super::key_path::KeyPath;
use super::languages::{DefaultLanguagesBuilder, LanguageSettingsBuilder, Languages};
use super::loader::{ConfigLoader, ConfigSourceDescriptor};
use super::modules::{ModuleResolver, decode_modules_config};
use super::store::ConfigStore;
use super::theme::apply_theme_config;
use super::themes_dir::ThemesDirResolver;
use crate::error::{ConfigError, NO_CONFIG_FILE_MESSAGE};
use crate::fs::SourceFs;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A post-load customization, run after defaults and before modules.
/// Writes made here are explicit and outrank defaults and modules.
pub type ConfigHook = dyn Fn(&mut ConfigStore) -> anyhow::Result<()>;

/// The outcome of a resolution.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub store: ConfigStore,
    /// Every file and directory that took part, de-duplicated, in discovery
    /// order. Register these for change watching.
    pub files: Vec<PathBuf>,
    /// False when no primary file, config directory file or module config
    /// file was found.
    pub project_config_found: bool,
}

impl ResolvedConfig {
    /// Turn the "no project config" outcome into [`ConfigError::NoConfigFile`].
    pub fn require_project_config(self) -> Result<Self, ConfigError> {
        if self.project_config_found {
            Ok(self)
        } else {
            Err(ConfigError::NoConfigFile)
        }
    }
}

/// Resolves a [`ConfigSourceDescriptor`] into a [`ResolvedConfig`].
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    decoder: Arc<dyn ConfigDecoder>,
    module_resolver: Arc<dyn ModuleResolver>,
    language_builder: Arc<dyn LanguageSettingsBuilder>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new(Arc::new(ThemesDirResolver::default()))
    }
}

impl ConfigResolver {
    pub fn new(module_resolver: Arc<dyn ModuleResolver>) -> Self {
        Self {
            decoder: Arc::new(DefaultDecoder),
            module_resolver,
            language_builder: Arc::new(DefaultLanguagesBuilder),
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn ConfigDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_language_builder(mut self, builder: Arc<dyn LanguageSettingsBuilder>) -> Self {
        self.language_builder = builder;
        self
    }

    /// Run the whole pipeline. Any failure aborts it.
    pub fn resolve(
        &self,
        descriptor: &ConfigSourceDescriptor,
        hooks: &[&ConfigHook],
    ) -> Result<ResolvedConfig, ConfigError> {
        self.resolve_with_previous(descriptor, hooks, None)
    }

    /// Resolve again, e.g. after a config file changed. The previous
    /// languages are handed to the language builder.
    pub fn reload(
        &self,
        descriptor: &ConfigSourceDescriptor,
        hooks: &[&ConfigHook],
        previous: &ResolvedConfig,
    ) -> Result<ResolvedConfig, ConfigError> {
        self.resolve_with_previous(descriptor, hooks, previous.store.languages())
    }

    fn resolve_with_previous(
        &self,
        descriptor: &ConfigSourceDescriptor,
        hooks: &[&ConfigHook],
        previous: Option<&Languages>,
    ) -> Result<ResolvedConfig, ConfigError> {
        let loader = ConfigLoader::new(descriptor, self.decoder.as_ref());
        let mut store = ConfigStore::new().with_env(descriptor.env_overrides());
        let mut files = Vec::new();

        let primary = loader.load_config_files(&mut store)?;
        let mut found = !primary.is_empty();
        files.extend(primary);

        let config_dir = loader.load_config_from_config_dir(&mut store)?;
        found |= !config_dir.files.is_empty();
        files.extend(config_dir.visited);

        load_default_settings(&mut store);
        store.set_default(
            &KeyPath::new(["environment"]),
            Value::String(descriptor.environment.clone()),
        );
        if !descriptor.working_dir.as_os_str().is_empty() {
            store.set_default(
                &KeyPath::new(["workingdir"]),
                Value::String(descriptor.working_dir.to_string_lossy().into_owned()),
            );
        }

        // Languages are created from the settings, so everything must be in
        // place before that.
        for hook in hooks {
            hook(&mut store)?;
        }

        let modules_config = decode_modules_config(&store)?;
        let collected =
            loader.collect_modules(modules_config, &mut store, self.module_resolver.clone())?;

        for module in collected
            .modules
            .iter()
            .filter(|module| module.config_filename.is_some())
        {
            apply_theme_config(&mut store, module);
            found = true;
        }
        files.extend(collected.config_files);

        let languages = self.language_builder.build(&store, previous)?;
        store.set(
            &KeyPath::new(["multilingual"]),
            Value::Bool(languages.is_multilingual()),
        );
        debug!("Languages: {}", languages.len());
        store.set_languages(languages);

        let mut modules = std::mem::take(store.all_modules_mut());
        if let Some(project) = modules.last_mut() {
            self.module_resolver
                .apply_project_config_defaults(&store, project)?;
        }
        store.set_all_modules(modules);

        if found {
            info!("Resolved configuration from {} source(s)", files.len());
        } else {
            warn!("{}", NO_CONFIG_FILE_MESSAGE.trim_end());
        }

        Ok(ResolvedConfig {
            store,
            files: dedup_in_order(files),
            project_config_found: found,
        })
    }
}

fn dedup_in_order(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

/// Resolve `config.toml` from the current directory with the default
/// collaborators.
pub fn load_config_default(fs: Arc<dyn SourceFs>) -> Result<ConfigStore, ConfigError> {
    let descriptor = ConfigSourceDescriptor::new(fs, "").with_filename("config.toml");
    let resolved = ConfigResolver::default().resolve(&descriptor, &[])?;
    Ok(resolved.store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;
    use serde_json::json;

    fn key(path: &str) -> KeyPath {
        KeyPath::parse(path)
    }

    fn descriptor(fs: MemFs) -> ConfigSourceDescriptor {
        ConfigSourceDescriptor::new(Arc::new(fs), "/site").with_config_dir("/site/config")
    }

    #[test]
    fn test_minimal_site() {
        let fs = MemFs::new().with_file("/site/config.toml", "paginate = 3\n");
        let resolved = ConfigResolver::default()
            .resolve(&descriptor(fs), &[])
            .unwrap();
        assert!(resolved.project_config_found);
        assert_eq!(resolved.files, vec![PathBuf::from("/site/config.toml")]);
        assert_eq!(resolved.store.get_i64(&key("paginate")), Some(3));
        assert_eq!(resolved.store.get_string(&key("publishDir")), "public");
        assert!(!resolved.store.get_bool(&key("multilingual")));
        assert_eq!(resolved.store.all_modules().len(), 1);
        assert_eq!(resolved.store.all_modules()[0].mounts.len(), 7);
    }

    #[test]
    fn test_nothing_found_is_signaled() {
        let resolved = ConfigResolver::default()
            .resolve(&descriptor(MemFs::new()), &[])
            .unwrap();
        assert!(!resolved.project_config_found);
        assert!(resolved.files.is_empty());
        assert_eq!(resolved.store.get_i64(&key("paginate")), Some(10));
        assert!(
            resolved
                .require_project_config()
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_config_dir_alone_counts_as_project_config() {
        let fs = MemFs::new().with_file("/site/config/_default/config.toml", "title = \"T\"\n");
        let resolved = ConfigResolver::default()
            .resolve(&descriptor(fs), &[])
            .unwrap();
        assert!(resolved.project_config_found);
        assert_eq!(resolved.store.get_string(&key("title")), "T");
    }

    #[test]
    fn test_hook_outranks_defaults_and_modules() {
        let fs = MemFs::new()
            .with_file("/site/config.toml", "theme = \"a\"\n")
            .with_file("/site/themes/a/config.toml", "[params]\ncolor = \"blue\"\n");
        let hook = |store: &mut ConfigStore| -> anyhow::Result<()> {
            store.set(&KeyPath::parse("params.color"), json!("green"));
            store.set(&KeyPath::parse("paginate"), json!(7));
            Ok(())
        };
        let resolved = ConfigResolver::default()
            .resolve(&descriptor(fs), &[&hook])
            .unwrap();
        assert_eq!(resolved.store.get_string(&key("params.color")), "green");
        assert_eq!(resolved.store.get_i64(&key("paginate")), Some(7));
    }

    #[test]
    fn test_hook_error_aborts() {
        let fs = MemFs::new().with_file("/site/config.toml", "");
        let hook = |_: &mut ConfigStore| -> anyhow::Result<()> { anyhow::bail!("boom") };
        let err = ConfigResolver::default()
            .resolve(&descriptor(fs), &[&hook])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Hook(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_environment_recorded() {
        let fs = MemFs::new().with_file("/site/config.toml", "");
        let d = descriptor(fs).with_environment("development");
        let resolved = ConfigResolver::default().resolve(&d, &[]).unwrap();
        assert_eq!(resolved.store.get_string(&key("environment")), "development");
    }

    #[test]
    fn test_reload_matches_first_resolution() {
        let fs = MemFs::new().with_file(
            "/site/config.toml",
            "defaultContentLanguage = \"fr\"\n[languages.fr]\nweight = 1\n[languages.en]\nweight = 2\n",
        );
        let resolver = ConfigResolver::default();
        let d = descriptor(fs);
        let first = resolver.resolve(&d, &[]).unwrap();
        let second = resolver.reload(&d, &[], &first).unwrap();
        assert_eq!(first.store.all_settings(), second.store.all_settings());
        assert!(second.store.get_bool(&key("multilingual")));
        assert_eq!(first.store.languages(), second.store.languages());
    }

    #[test]
    fn test_load_config_default() {
        let fs = MemFs::new().with_file("config.toml", "title = \"Default\"\n");
        let store = load_config_default(Arc::new(fs)).unwrap();
        assert_eq!(store.get_string(&key("title")), "Default");
    }
}
