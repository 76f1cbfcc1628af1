//! Module/theme declarations and collection of the module chain.

use super::key_path::KeyPath;
use super::loader::ConfigLoader;
use super::store::ConfigStore;
use crate::error::{ConfigError, ResolverError};
use crate::fs::SourceFs;
use crate::paths::abs_pathify;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Maps a directory in a module onto a component of the unified site tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Relative to the module's directory.
    pub source: String,
    /// Component path, e.g. `content` or `static/images`.
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Mount {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            lang: None,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }
}

/// One declared module import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub path: String,
    #[serde(default)]
    pub disable: bool,
    /// Do not load the module's own config file.
    #[serde(default, rename = "ignoreconfig")]
    pub ignore_config: bool,
}

impl Import {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Module declarations of the project (or of a module).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulesConfig {
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub mounts: Vec<Mount>,
}

/// Decode the `module` section and the legacy `theme` key.
///
/// Themes named by `theme` (a string or a list) are appended as imports.
pub fn decode_modules_config(store: &ConfigStore) -> Result<ModulesConfig, ConfigError> {
    let mut config: ModulesConfig = match store.get(&KeyPath::new(["module"])) {
        Some(value) if !value.is_null() => serde_json::from_value(value)
            .map_err(|e| ConfigError::ModuleConfig(e.to_string()))?,
        _ => ModulesConfig::default(),
    };

    for theme in store.get_string_slice(&KeyPath::new(["theme"])) {
        let theme = theme.trim();
        if theme.is_empty() || config.imports.iter().any(|import| import.path == theme) {
            continue;
        }
        config.imports.push(Import::new(theme));
    }

    Ok(config)
}

/// A resolved module: a theme, a component, or the project itself.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    /// Import path, e.g. `ananke` or `github.com/org/theme`.
    pub path: String,
    pub dir: PathBuf,
    /// The module's own config file, when it has one.
    pub config_filename: Option<PathBuf>,
    #[serde(skip)]
    pub config: ConfigStore,
    /// Position assigned by the resolver; lower applies first.
    pub weight: u32,
    pub mounts: Vec<Mount>,
    pub is_project: bool,
}

impl Module {
    pub fn new(path: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dir: dir.into(),
            config_filename: None,
            config: ConfigStore::new(),
            weight: 0,
            mounts: Vec::new(),
            is_project: false,
        }
    }

    /// The project placeholder, always last in the chain.
    pub fn project(dir: impl Into<PathBuf>) -> Self {
        Self {
            is_project: true,
            ..Self::new("project", dir)
        }
    }

    pub fn with_config(mut self, config: ConfigStore) -> Self {
        self.config = config;
        self
    }

    pub fn with_config_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.config_filename = Some(filename.into());
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_mounts(mut self, mounts: Vec<Mount>) -> Self {
        self.mounts = mounts;
        self
    }
}

/// Settings handed to a [`ModuleResolver`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub fs: Arc<dyn SourceFs>,
    pub working_dir: PathBuf,
    /// Absolute themes directory.
    pub themes_dir: PathBuf,
    pub module_config: ModulesConfig,
    pub ignore_vendor: bool,
    pub mod_proxy: String,
}

/// What a [`ModuleResolver`] found.
#[derive(Debug, Clone, Default)]
pub struct ModulesCollection {
    /// Modules in application order, project last.
    pub modules: Vec<Module>,
    /// Lock or manifest file pinning module versions, if any.
    pub manifest: Option<PathBuf>,
}

/// Resolves declared imports into an ordered module chain.
pub trait ModuleResolver: Send + Sync + fmt::Debug {
    fn collect(&self, config: &ClientConfig) -> Result<ModulesCollection, ResolverError>;

    /// Give the project module its default mounts.
    fn apply_project_config_defaults(
        &self,
        store: &ConfigStore,
        project: &mut Module,
    ) -> Result<(), ResolverError>;
}

/// Resolver handle plus the settings it was used with, kept in the store so
/// later stages can reuse the resolved module set.
#[derive(Debug, Clone)]
pub struct ModulesClient {
    pub resolver: Arc<dyn ModuleResolver>,
    pub config: ClientConfig,
}

impl ModulesClient {
    pub fn new(resolver: Arc<dyn ModuleResolver>, config: ClientConfig) -> Self {
        Self { resolver, config }
    }

    pub fn collect(&self) -> Result<ModulesCollection, ResolverError> {
        self.resolver.collect(&self.config)
    }
}

/// Module chain and the files that should be watched for it.
#[derive(Debug, Clone, Default)]
pub struct CollectedModules {
    pub modules: Vec<Module>,
    /// Module config files followed by the manifest, if any.
    pub config_files: Vec<PathBuf>,
}

impl ConfigLoader<'_> {
    /// Resolve the module chain and publish it, and the client used, in
    /// `store`.
    ///
    /// With no modules at all a project placeholder is published so project
    /// mount defaults can still be applied.
    pub fn collect_modules(
        &self,
        modules_config: ModulesConfig,
        store: &mut ConfigStore,
        resolver: Arc<dyn ModuleResolver>,
    ) -> Result<CollectedModules, ConfigError> {
        let working_dir = if self.descriptor.working_dir.as_os_str().is_empty() {
            PathBuf::from(store.get_string(&KeyPath::new(["workingdir"])))
        } else {
            self.descriptor.working_dir.clone()
        };
        let themes_dir = abs_pathify(
            &working_dir,
            store.get_string(&KeyPath::new(["themesdir"])),
        );

        let client = ModulesClient::new(
            resolver,
            ClientConfig {
                fs: self.descriptor.fs.clone(),
                working_dir: working_dir.clone(),
                themes_dir,
                module_config: modules_config,
                ignore_vendor: store.get_bool(&KeyPath::new(["ignorevendor"])),
                mod_proxy: store.get_string(&KeyPath::new(["modproxy"])),
            },
        );

        let collection = client.collect()?;

        // Avoid recreating these later.
        store.set_modules_client(Arc::new(client));

        if collection.modules.is_empty() {
            debug!("No modules resolved; using a project placeholder");
            store.set_all_modules(vec![Module::project(working_dir)]);
            return Ok(CollectedModules::default());
        }

        let mut config_files: Vec<PathBuf> = collection
            .modules
            .iter()
            .filter_map(|module| module.config_filename.clone())
            .collect();

        // Watched for version changes.
        if let Some(manifest) = collection.manifest {
            config_files.push(manifest);
        }

        info!("Resolved {} module(s)", collection.modules.len());
        store.set_all_modules(collection.modules.clone());

        Ok(CollectedModules {
            modules: collection.modules,
            config_files,
        })
    }
}

/// Default mounts for a module rooted at `dir`, from the `*Dir` settings.
pub(crate) fn component_mounts(store: &ConfigStore) -> Vec<Mount> {
    [
        ("contentdir", "content"),
        ("datadir", "data"),
        ("layoutdir", "layouts"),
        ("i18ndir", "i18n"),
        ("archetypedir", "archetypes"),
        ("assetdir", "assets"),
        ("staticdir", "static"),
    ]
    .into_iter()
    .filter_map(|(setting, component)| {
        let source = store.get_string(&KeyPath::new([setting]));
        (!source.is_empty()).then(|| Mount::new(source, component))
    })
    .collect()
}

/// Whether `dir` exists as a directory on `fs`.
pub(crate) fn module_dir_exists(fs: &dyn SourceFs, dir: &Path) -> bool {
    fs.exists(dir) && fs.is_dir(dir)
}
