//! Module resolution from the vendor and themes directories.

use super::decode::{ConfigDecoder, DefaultDecoder, decode_file_to_map};
use super::key_path::KeyPath;
use super::locator::locate_config_file;
use super::merge::lowercase_keys;
use super::modules::{
    ClientConfig, Import, Module, ModuleResolver, ModulesCollection, Mount, component_mounts,
    decode_modules_config, module_dir_exists,
};
use super::rename::KeyRenamer;
use super::store::ConfigStore;
use crate::error::{ConfigError, ResolverError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Directory, relative to the working dir, holding vendored modules.
pub const VENDOR_DIR: &str = "_vendor";

/// File in the working dir pinning module versions.
pub const MODULES_MANIFEST: &str = "modules.lock";

/// Resolves imports to directories under `_vendor/` or the themes directory.
///
/// Imports are visited depth-first: a module is followed by its own imports,
/// and the first occurrence of a path wins. The project comes last.
#[derive(Debug, Clone)]
pub struct ThemesDirResolver {
    decoder: Arc<dyn ConfigDecoder>,
}

impl Default for ThemesDirResolver {
    fn default() -> Self {
        Self::new(Arc::new(DefaultDecoder))
    }
}

struct Collector<'a> {
    config: &'a ClientConfig,
    modules: Vec<Module>,
    seen: HashSet<String>,
}

impl ThemesDirResolver {
    pub fn new(decoder: Arc<dyn ConfigDecoder>) -> Self {
        Self { decoder }
    }

    fn module_dir(&self, config: &ClientConfig, path: &str) -> Option<PathBuf> {
        let fs = config.fs.as_ref();
        let import = Path::new(path);
        if import.is_absolute() {
            return module_dir_exists(fs, import).then(|| import.to_path_buf());
        }

        if !config.ignore_vendor {
            let vendored = config.working_dir.join(VENDOR_DIR).join(import);
            if module_dir_exists(fs, &vendored) {
                return Some(vendored);
            }
        }

        let themed = config.themes_dir.join(import);
        module_dir_exists(fs, &themed).then_some(themed)
    }

    fn load_module_config(
        &self,
        config: &ClientConfig,
        path: &str,
        dir: &Path,
    ) -> Result<Option<(PathBuf, ConfigStore)>, ResolverError> {
        let fs = config.fs.as_ref();
        let wrap = |err: ConfigError| ResolverError::ModuleConfig {
            module: path.to_string(),
            source: Box::new(err),
        };

        let filename = match locate_config_file(fs, "config", dir) {
            Ok(filename) => filename,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(wrap(err)),
        };

        let map = decode_file_to_map(fs, self.decoder.as_ref(), &filename).map_err(wrap)?;
        let mut map = lowercase_keys(map);
        KeyRenamer::legacy().rename(&mut map);

        let mut store = ConfigStore::new();
        store.merge_config_map(map).map_err(|conflict| {
            wrap(ConfigError::Merge {
                path: Some(filename.clone()),
                line: None,
                message: conflict.to_string(),
                key: conflict.key,
            })
        })?;
        Ok(Some((filename, store)))
    }

    fn collect_import(
        &self,
        collector: &mut Collector<'_>,
        import: &Import,
    ) -> Result<(), ResolverError> {
        if import.disable {
            debug!("Module {} is disabled", import.path);
            return Ok(());
        }
        if !collector.seen.insert(import.path.clone()) {
            return Ok(());
        }

        let config = collector.config;
        let dir = self.module_dir(config, &import.path).ok_or_else(|| {
            ResolverError::ModuleNotFound {
                path: import.path.clone(),
                themes_dir: config.themes_dir.clone(),
            }
        })?;

        let mut module = Module::new(import.path.as_str(), dir.as_path());
        let mut nested = Vec::new();

        if !import.ignore_config
            && let Some((filename, store)) = self.load_module_config(config, &import.path, &dir)?
        {
            let modules_config =
                decode_modules_config(&store).map_err(|err| ResolverError::ModuleConfig {
                    module: import.path.clone(),
                    source: Box::new(err),
                })?;
            nested = modules_config.imports;
            module = module
                .with_config_filename(filename)
                .with_config(store)
                .with_mounts(modules_config.mounts);
        }

        debug!("Resolved module {} in {}", import.path, dir.display());
        let weight = collector.modules.len() as u32;
        collector.modules.push(module.with_weight(weight));

        for import in &nested {
            self.collect_import(collector, import)?;
        }
        Ok(())
    }
}

impl ModuleResolver for ThemesDirResolver {
    fn collect(&self, config: &ClientConfig) -> Result<ModulesCollection, ResolverError> {
        let mut collector = Collector {
            config,
            modules: Vec::new(),
            seen: HashSet::new(),
        };
        for import in &config.module_config.imports {
            self.collect_import(&mut collector, import)?;
        }

        let weight = collector.modules.len() as u32;
        let project = Module::project(config.working_dir.as_path())
            .with_mounts(config.module_config.mounts.clone())
            .with_weight(weight);
        let mut modules = collector.modules;
        modules.push(project);

        let manifest = config.working_dir.join(MODULES_MANIFEST);
        let manifest = if config.fs.exists(&manifest) {
            config
                .fs
                .read(&manifest)
                .map_err(|e| ResolverError::Manifest {
                    path: manifest.clone(),
                    message: e.to_string(),
                })?;
            Some(manifest)
        } else {
            None
        };

        info!(
            "Collected {} module(s) from {}",
            modules.len() - 1,
            config.themes_dir.display()
        );
        Ok(ModulesCollection { modules, manifest })
    }

    fn apply_project_config_defaults(
        &self,
        store: &ConfigStore,
        project: &mut Module,
    ) -> Result<(), ResolverError> {
        if !project.mounts.is_empty() {
            return Ok(());
        }

        let mut mounts = component_mounts(store);

        let global_content = store.get_string(&KeyPath::new(["contentdir"]));
        if let Some(languages) = store.languages() {
            for language in languages.iter() {
                if !language.content_dir.is_empty() && language.content_dir != global_content {
                    mounts.push(
                        Mount::new(language.content_dir.as_str(), "content")
                            .with_lang(language.lang.as_str()),
                    );
                }
            }
        }

        project.mounts = mounts;
        Ok(())
    }
}
