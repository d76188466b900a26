//! Listing of whitelisted plugins with their descriptions.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use charm_core::{DispatchConfig, PluginDescription, PluginDescriptor, PluginName, Whitelist};
use charm_scan::PathScanner;
use futures::future::join_all;

use crate::cache::DescriptionCache;
use crate::fetcher::{DescriptionFetcher, ProcessFetcher};

/// Where the descriptions of the last listing came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Plugins answered from the cache.
    pub cached: Vec<PluginName>,
    /// Plugins that were run with `--description`.
    pub fetched: Vec<PluginName>,
    /// Subset of `fetched` that failed to describe themselves.
    pub failed: Vec<PluginName>,
}

impl FetchStats {
    /// Whether every description came from the cache.
    pub fn all_cached(&self) -> bool {
        self.fetched.is_empty()
    }
}

/// Result of [`PluginRegistry::descriptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptions {
    /// One entry per whitelisted plugin name, sorted by name.
    pub entries: Vec<PluginDescription>,
    pub stats: FetchStats,
}

impl Descriptions {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Finds whitelisted plugins and describes them.
pub struct PluginRegistry {
    scanner: PathScanner,
    whitelist: Whitelist,
    fetcher: Arc<dyn DescriptionFetcher>,
    /// Cache file to load on first use (None = in-memory only).
    cache_file: Option<PathBuf>,
    /// Loaded lazily so a listing without plugins never reads the file.
    cache: Option<DescriptionCache>,
}

impl PluginRegistry {
    /// Create a registry that describes plugins by running them and keeps
    /// descriptions in memory only.
    pub fn new(scanner: PathScanner, whitelist: Whitelist) -> Self {
        Self {
            scanner,
            whitelist,
            fetcher: Arc::new(ProcessFetcher::new()),
            cache_file: None,
            cache: None,
        }
    }

    /// Create a registry from dispatch configuration and a prepared whitelist.
    pub fn from_config(config: &DispatchConfig, whitelist: Whitelist) -> Self {
        let mut registry = Self::new(PathScanner::from_config(config), whitelist);
        registry.cache_file = config.cache_file.clone();
        registry
    }

    /// Persist descriptions to `file` between runs.
    pub fn with_cache_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(file.into());
        self.cache = None;
        self
    }

    /// Use a different description source.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn DescriptionFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn scanner(&self) -> &PathScanner {
        &self.scanner
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Whitelisted plugins on the search path, one per name.
    ///
    /// When a name is installed in several directories the first one in
    /// search path order is kept.
    pub fn candidates(&self) -> Vec<PluginDescriptor> {
        let mut seen = HashSet::new();
        self.scanner
            .scan()
            .into_iter()
            .filter(|plugin| self.whitelist.is_allowed(plugin.name.as_str()))
            .filter(|plugin| seen.insert(plugin.name.clone()))
            .collect()
    }

    /// Describe every whitelisted plugin, sorted by name.
    ///
    /// Unchanged plugins are answered from the cache. All other plugins are
    /// run concurrently, and their results (failures included) are written
    /// back to the cache. Nothing here fails: plugins that cannot describe
    /// themselves get a synthesized description, and cache problems are
    /// only logged.
    pub async fn descriptions(&mut self) -> Descriptions {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Descriptions::default();
        }

        let cache_file = self.cache_file.as_deref();
        let cache = self.cache.get_or_insert_with(|| match cache_file {
            Some(file) => DescriptionCache::load(file),
            None => DescriptionCache::disabled(),
        });

        let mut entries = Vec::with_capacity(candidates.len());
        let mut stats = FetchStats::default();
        let mut misses = Vec::new();

        for plugin in candidates {
            match cache.get(&plugin.path, plugin.modified) {
                Some(entry) => {
                    tracing::debug!(plugin = %plugin.name, "description cache hit");
                    stats.cached.push(plugin.name.clone());
                    entries.push(PluginDescription::new(plugin.name, entry.description.clone()));
                }
                None => misses.push(plugin),
            }
        }

        // Every fetch is polled together; plugins may wait on each other.
        let fetcher = &self.fetcher;
        let results = join_all(misses.iter().map(|plugin| fetcher.fetch(plugin))).await;

        for (plugin, fetched) in misses.into_iter().zip(results) {
            if !fetched.ok {
                stats.failed.push(plugin.name.clone());
            }
            stats.fetched.push(plugin.name.clone());
            cache.put(
                plugin.path,
                plugin.modified,
                fetched.description.clone(),
                fetched.ok,
            );
            entries.push(PluginDescription::new(plugin.name, fetched.description));
        }

        cache.prune_missing();
        if cache.is_dirty() {
            if let Err(err) = cache.save() {
                tracing::warn!(error = %err, "cannot save description cache");
            }
        }

        tracing::debug!(
            cached = stats.cached.len(),
            fetched = stats.fetched.len(),
            failed = stats.failed.len(),
            "plugin descriptions ready"
        );

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Descriptions { entries, stats }
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("scanner", &self.scanner)
            .field("whitelist", &self.whitelist)
            .field("cache_file", &self.cache_file)
            .finish_non_exhaustive()
    }
}
