//! Layered site configuration.
//!
//! Sources are folded into one [`ConfigStore`] in a fixed order:
//! 1. **Primary files** - `config.toml` (or a comma-separated list), overlay merged
//! 2. **Config directory** - `config/_default/`, then `config/<environment>/`
//! 3. **Defaults** - built-in values in a lower tier that never clobbers
//! 4. **Hooks** - caller-supplied explicit writes
//! 5. **Modules** - theme config merged keep-left, first applicant wins
//!
//! ## Merge Strategy
//! - Files and directories: overlay, later wins, nested tables merge
//! - Modules: only `params`, `outputFormats`, `mediaTypes`, language params and
//!   menus propagate, and never over an existing value
//!
//! ## Environment Variables
//! - `SITE_<KEY_PATH>` - overrides any key on read, e.g. `SITE_PARAMS_COLOR`

mod config_dir;
pub mod decode;
pub mod defaults;
mod key_path;
pub mod languages;
mod loader;
mod locator;
mod merge;
pub mod modules;
mod rename;
mod resolver;
pub mod site;
mod store;
mod theme;
mod themes_dir;

pub use config_dir::{ConfigDirMerge, DEFAULT_CONFIG_SUBDIR, derive_key_path};
pub use decode::{ConfigDecoder, DefaultDecoder, Format, VALID_CONFIG_EXTENSIONS};
pub use defaults::{ENVIRONMENT_DEVELOPMENT, ENVIRONMENT_PRODUCTION, load_default_settings};
pub use key_path::KeyPath;
pub use languages::{DefaultLanguagesBuilder, Language, LanguageSettingsBuilder, Languages};
pub use loader::{ConfigLoader, ConfigSourceDescriptor, DEFAULT_CONFIG_NAME, DEFAULT_ENV_PREFIX};
pub use locator::locate_config_file;
pub use merge::MergeConflict;
pub use modules::{
    ClientConfig, Import, Module, ModuleResolver, ModulesClient, ModulesCollection, ModulesConfig,
    Mount, decode_modules_config,
};
pub use rename::KeyRenamer;
pub use resolver::{ConfigHook, ConfigResolver, ResolvedConfig, load_config_default};
pub use site::{Privacy, Services, SiteConfig};
pub use store::{ConfigStore, EnvOverrides};
pub use theme::{PROPAGATED_KEYS, apply_theme_config, merge_string_map_keep_left};
pub use themes_dir::{MODULES_MANIFEST, ThemesDirResolver, VENDOR_DIR};
