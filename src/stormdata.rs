//! The main entry point for fetching storm events, census estimates, and
//! the county-zone mapping through a shared cache directory and download
//! client.

use crate::cache::policy::{CachePolicy, FileExists};
use crate::census::loader::CensusLoader;
use crate::clients::census_client::CensusClient;
use crate::clients::storm_events_client::StormEventsClient;
use crate::clients::zone_county_client::ZoneCountyClient;
use crate::error::StormDataError;
use crate::events::loader::StormEventsLoader;
use crate::utils::{
    ensure_cache_dir_exists, resolve_cache_dir, CACHE_DIR_ENV_VAR, DEFAULT_CACHE_SUBDIR,
};
use crate::zone_county::loader::ZoneCountyLoader;
use reqwest::Client;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable overriding the worker count in [`StormData::new`].
pub const MAX_WORKERS_ENV_VAR: &str = "STORMDATA_WORKERS";

/// Concurrent fetches per batch unless configured otherwise.
pub const DEFAULT_MAX_WORKERS: usize = 12;

/// Configuration for a [`StormData`] client.
///
/// Everything the loaders consult lives here explicitly: the cache root,
/// the worker bound for batch fetches, and the cache policy. Environment
/// variables are read only by [`StormData::new`]; a config built by hand is
/// used exactly as given.
#[derive(Clone)]
pub struct StormDataConfig {
    /// Root directory; each dataset keeps its own subdirectory beneath it.
    pub cache_folder: PathBuf,
    /// Upper bound on concurrent fetches within one batch, minimum 1.
    pub max_workers: usize,
    /// Decides cache hits; [`FileExists`] unless overridden.
    pub cache_policy: Arc<dyn CachePolicy>,
}

impl StormDataConfig {
    /// A config with the given cache root, the default worker count, and
    /// the default cache policy.
    pub fn new(cache_folder: impl Into<PathBuf>) -> Self {
        Self {
            cache_folder: cache_folder.into(),
            max_workers: DEFAULT_MAX_WORKERS,
            cache_policy: Arc::new(FileExists),
        }
    }

    /// Sets the worker bound, clamping zero to one.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Replaces the cache policy.
    pub fn with_cache_policy(mut self, cache_policy: Arc<dyn CachePolicy>) -> Self {
        self.cache_policy = cache_policy;
        self
    }
}

impl fmt::Debug for StormDataConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StormDataConfig")
            .field("cache_folder", &self.cache_folder)
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

/// The client for all three datasets.
///
/// Construction resolves and creates the cache directories up front so that
/// later fetches only deal with their own files. All datasets share one
/// download client.
///
/// # Example
///
/// ```no_run
/// use stormdata::{StormData, StormDataError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), StormDataError> {
///     let client = StormData::new().await?;
///     let tornado_season = client.storm_events().year(2011).await?;
///     println!("{}", tornado_season.head(Some(5)));
///     Ok(())
/// }
/// ```
pub struct StormData {
    pub(crate) config: StormDataConfig,
    pub(crate) events: StormEventsLoader,
    pub(crate) census: CensusLoader,
    pub(crate) zone_county: ZoneCountyLoader,
}

impl StormData {
    /// Creates a client configured from the environment: `STORMDATA_CACHE_DIR`
    /// (falling back to the platform cache directory) for the cache root and
    /// `STORMDATA_WORKERS` for the worker count.
    ///
    /// # Errors
    ///
    /// Fails when no cache root can be determined or created, or when
    /// `STORMDATA_WORKERS` is set to something that is not a number.
    pub async fn new() -> Result<Self, StormDataError> {
        let cache_folder = resolve_cache_dir(CACHE_DIR_ENV_VAR, DEFAULT_CACHE_SUBDIR)
            .map_err(StormDataError::CacheDirResolution)?;

        let mut config = StormDataConfig::new(cache_folder);
        if let Ok(raw) = env::var(MAX_WORKERS_ENV_VAR) {
            let workers = raw
                .parse::<usize>()
                .map_err(|_| StormDataError::InvalidWorkerCount(raw))?;
            config = config.with_max_workers(workers);
        }
        Self::with_config(config).await
    }

    /// Creates a client with an explicit cache root and defaults otherwise.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, StormDataError> {
        Self::with_config(StormDataConfig::new(cache_folder)).await
    }

    /// Creates a client from a fully explicit configuration, creating the
    /// cache root and the per-dataset subdirectories as needed.
    pub async fn with_config(config: StormDataConfig) -> Result<Self, StormDataError> {
        ensure_cache_dir_exists(&config.cache_folder)
            .await
            .map_err(|e| StormDataError::CacheDirCreation(config.cache_folder.clone(), e))?;

        let client = Client::new();
        let events = StormEventsLoader::new(&config.cache_folder, client.clone());
        let census = CensusLoader::new(&config.cache_folder, client.clone(), config.max_workers);
        let zone_county = ZoneCountyLoader::new(&config.cache_folder, client);

        for dir in [events.cache_dir(), census.cache_dir(), zone_county.cache_dir()] {
            ensure_cache_dir_exists(dir)
                .await
                .map_err(|e| StormDataError::CacheDirCreation(dir.to_path_buf(), e))?;
        }

        Ok(Self {
            config,
            events,
            census,
            zone_county,
        })
    }

    /// Storm event details, cached per year.
    pub fn storm_events(&self) -> StormEventsClient<'_> {
        StormEventsClient::new(self)
    }

    /// ACS census estimates, cached as one combined file.
    pub fn census(&self) -> CensusClient<'_> {
        CensusClient::new(self)
    }

    /// The county-zone correlation table.
    pub fn zone_county(&self) -> ZoneCountyClient<'_> {
        ZoneCountyClient::new(self)
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &StormDataConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn with_config_creates_dataset_subdirectories() -> Result<(), StormDataError> {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache_root");

        let client = StormData::with_cache_folder(root.clone()).await?;

        assert!(root.join("NOAA_STORM_DATA").is_dir());
        assert!(root.join("CENSUS_DATA").is_dir());
        assert!(root.join("COUNTY_ZONE").is_dir());
        assert_eq!(client.config().max_workers, DEFAULT_MAX_WORKERS);
        Ok(())
    }

    #[tokio::test]
    async fn worker_count_can_be_configured() -> Result<(), StormDataError> {
        let dir = tempfile::tempdir().unwrap();
        let config = StormDataConfig::new(dir.path()).with_max_workers(3);

        let client = StormData::with_config(config).await?;

        assert_eq!(client.config().max_workers, 3);
        Ok(())
    }

    #[tokio::test]
    async fn zero_workers_clamp_to_one() -> Result<(), StormDataError> {
        let dir = tempfile::tempdir().unwrap();
        let config = StormDataConfig::new(dir.path()).with_max_workers(0);

        let client = StormData::with_config(config).await?;

        assert_eq!(client.config().max_workers, 1);
        Ok(())
    }

    #[tokio::test]
    async fn unparsable_worker_override_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        env::set_var(CACHE_DIR_ENV_VAR, dir.path());
        env::set_var(MAX_WORKERS_ENV_VAR, "a dozen");

        let result = StormData::new().await;

        env::remove_var(MAX_WORKERS_ENV_VAR);
        env::remove_var(CACHE_DIR_ENV_VAR);

        match result {
            Err(StormDataError::InvalidWorkerCount(raw)) => assert_eq!(raw, "a dozen"),
            Err(other) => panic!("expected InvalidWorkerCount, got {other:?}"),
            Ok(_) => panic!("expected InvalidWorkerCount, got a client"),
        }
    }

    #[test]
    fn config_debug_omits_the_policy() {
        let config = StormDataConfig::new("/tmp/somewhere");
        let printed = format!("{config:?}");
        assert!(printed.contains("max_workers"));
        assert!(printed.contains(".."));
    }
}
