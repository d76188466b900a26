//! Dispatch configuration.
//!
//! Configuration is layered: built-in defaults, then the optional user
//! settings file, then the environment (`PATH`, `CHARM_CACHE_FILE`).

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Prefix shared by all plugin executables.
pub const DEFAULT_PLUGIN_PREFIX: &str = "charm-";

/// Reserved plugin whose output extends the whitelist.
pub const DEFAULT_TOOLS_COMMAND: &str = "tools-commands";

/// File name of the description cache inside the user cache directory.
const CACHE_FILE_NAME: &str = "charm-command-cache";

/// Environment variable overriding the cache file location.
const CACHE_FILE_ENV: &str = "CHARM_CACHE_FILE";

/// Environment variable overriding the settings file location.
const CONFIG_FILE_ENV: &str = "CHARM_CONFIG";

/// Configuration for plugin discovery and dispatch.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct DispatchConfig {
    /// Prefix identifying plugin executables.
    #[builder(default = "DEFAULT_PLUGIN_PREFIX.to_string()")]
    pub prefix: String,

    /// Directories searched for plugins, in priority order.
    #[builder(default)]
    pub search_path: Vec<PathBuf>,

    /// Description cache file (None = caching disabled).
    #[builder(default)]
    pub cache_file: Option<PathBuf>,

    /// Plugin name invoked to extend the whitelist.
    #[builder(default = "DEFAULT_TOOLS_COMMAND.to_string()")]
    pub tools_command: String,

    /// Extra whitelisted plugin names on top of the defaults.
    #[builder(default)]
    pub whitelist: Vec<String>,

    /// Environment variables injected into dispatched plugins.
    #[builder(default)]
    pub env: Vec<(String, String)>,
}

impl DispatchConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref prefix) = self.prefix {
            if prefix.is_empty() {
                return Err("Plugin prefix cannot be empty".to_string());
            }
        }
        if let Some(ref tools) = self.tools_command {
            if tools.is_empty() {
                return Err("Tools command name cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl DispatchConfig {
    /// Create a new config builder.
    pub fn builder() -> DispatchConfigBuilder {
        DispatchConfigBuilder::default()
    }

    /// Create a config searching the given directories, without a cache file.
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self {
            prefix: DEFAULT_PLUGIN_PREFIX.to_string(),
            search_path,
            cache_file: None,
            tools_command: DEFAULT_TOOLS_COMMAND.to_string(),
            whitelist: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Build the configuration from the user settings file and the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = Settings::load()?;
        Self::from_parts(settings, env::var_os("PATH"), env::var_os(CACHE_FILE_ENV))
    }

    /// Build the configuration from already-loaded settings and the raw
    /// values of `PATH` and `CHARM_CACHE_FILE`.
    pub fn from_parts(
        settings: Settings,
        path_var: Option<OsString>,
        cache_override: Option<OsString>,
    ) -> Result<Self, ConfigError> {
        let search_path: Vec<PathBuf> = path_var
            .map(|p| env::split_paths(&p).collect())
            .unwrap_or_default();

        let cache_file = if !settings.cache {
            None
        } else if let Some(path) = cache_override.filter(|p| !p.is_empty()) {
            Some(PathBuf::from(path))
        } else if let Some(path) = settings.cache_file {
            Some(path)
        } else {
            default_cache_file()
        };

        Self::builder()
            .search_path(search_path)
            .cache_file(cache_file)
            .whitelist(settings.whitelist)
            .env(settings.env.into_iter().collect::<Vec<_>>())
            .build()
            .map_err(|e| ConfigError::invalid(e.to_string()))
    }
}

/// Default location of the description cache file.
fn default_cache_file() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(CACHE_FILE_NAME))
}

/// User settings read from `config.toml`.
///
/// ```toml
/// whitelist = ["danger"]
/// cache = true
/// cache_file = "/tmp/charm-cache"
///
/// [env]
/// CHARM_CHANNEL = "edge"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Additional whitelisted plugin names.
    pub whitelist: Vec<String>,
    /// Whether descriptions are cached between runs.
    pub cache: bool,
    /// Cache file location override.
    pub cache_file: Option<PathBuf>,
    /// Variables injected into the environment of dispatched plugins.
    pub env: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            whitelist: Vec::new(),
            cache: true,
            cache_file: None,
            env: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from `$CHARM_CONFIG` or `<config dir>/charm/config.toml`.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match env::var_os(CONFIG_FILE_ENV).filter(|p| !p.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => match dirs::config_dir() {
                Some(dir) => dir.join("charm").join("config.toml"),
                None => return Ok(Self::default()),
            },
        };
        Self::load_from(&path)
    }

    /// Load settings from a specific file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
