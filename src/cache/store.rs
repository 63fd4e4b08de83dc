use crate::cache::error::FetchError;
use crate::cache::policy::CachePolicy;
use futures_util::{stream, StreamExt, TryStreamExt};
use log::{info, warn};
use polars::prelude::*;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A remote dataset addressed by a key, with one cache file per key.
///
/// Implementors supply the dataset-specific pieces of the fetch flow: the
/// key-to-path mapping, the remote fetch (download plus decode), and the
/// cache serialization in both directions. [`fetch_or_load`] and
/// [`fetch_all`] drive these uniformly for every dataset.
#[allow(async_fn_in_trait)]
pub trait KeyedSource {
    /// Parameter identifying one unit of fetchable data.
    type Key: fmt::Display + Clone + Send + Sync;
    /// Loader-specific error type; shared fetch errors convert into it.
    type Error: From<FetchError> + Send;

    /// Maps a key to its cache file path. The same key must always map to
    /// the same path.
    fn cache_path(&self, key: &Self::Key) -> PathBuf;

    /// Fetches and decodes the remote data for `key`.
    async fn fetch_remote(&self, key: &Self::Key) -> Result<DataFrame, Self::Error>;

    /// Decodes a previously written cache file.
    async fn read_cache(&self, key: &Self::Key, path: &Path) -> Result<DataFrame, Self::Error>;

    /// Persists a freshly decoded table to its cache file.
    async fn write_cache(
        &self,
        key: &Self::Key,
        frame: DataFrame,
        path: &Path,
    ) -> Result<(), Self::Error>;
}

/// Returns the table for `key`, fetching and caching it on a miss.
///
/// On a hit (as judged by `policy`) the cache file is decoded and returned
/// without any network activity. On a miss the remote data is fetched and
/// decoded first; only a fully decoded table is written back, so a failed
/// download or decode leaves no cache file behind.
pub async fn fetch_or_load<S: KeyedSource>(
    source: &S,
    policy: &dyn CachePolicy,
    key: &S::Key,
) -> Result<DataFrame, S::Error> {
    let path = source.cache_path(key);

    if policy.is_hit(&path) {
        info!("Cache hit for key {} at {:?}", key, path);
        return source.read_cache(key, &path).await;
    }

    warn!("Cache miss for key {}. Fetching and decoding.", key);
    let frame = source.fetch_remote(key).await?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| S::Error::from(FetchError::CacheDirCreation(parent.to_path_buf(), e)))?;
    }
    source.write_cache(key, frame.clone(), &path).await?;
    info!("Cached data for key {} to {:?}", key, path);

    Ok(frame)
}

/// Runs `fetch` over `keys` with at most `max_workers` futures in flight,
/// yielding the resulting tables in input order regardless of completion
/// order. The first failure aborts the batch: frames already produced are
/// discarded and in-flight siblings are dropped.
pub async fn gather_frames<K, E, F, Fut>(
    keys: Vec<K>,
    max_workers: usize,
    fetch: F,
) -> Result<Vec<DataFrame>, E>
where
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<DataFrame, E>>,
{
    stream::iter(keys)
        .map(fetch)
        .buffered(max_workers.max(1))
        .try_collect()
        .await
}

/// Applies [`fetch_or_load`] across `keys` with a bounded worker pool and
/// concatenates the per-key tables in key order.
pub async fn fetch_all<S>(
    source: &S,
    policy: &dyn CachePolicy,
    keys: Vec<S::Key>,
    max_workers: usize,
) -> Result<DataFrame, S::Error>
where
    S: KeyedSource + Sync,
{
    let frames = gather_frames(keys, max_workers, move |key| async move {
        fetch_or_load(source, policy, &key).await
    })
    .await?;
    combine_frames(frames).map_err(S::Error::from)
}

/// Concatenates tables vertically in input order. Column types are unified
/// to supertypes so that per-file inference differences (a column empty in
/// one file, numeric in the next) do not fail the whole batch. An empty
/// input yields an empty table.
pub fn combine_frames(frames: Vec<DataFrame>) -> Result<DataFrame, FetchError> {
    if frames.is_empty() {
        return Ok(DataFrame::empty());
    }
    let inputs: Vec<LazyFrame> = frames.into_iter().map(IntoLazy::lazy).collect();
    let args = UnionArgs {
        to_supertypes: true,
        ..Default::default()
    };
    concat(inputs, args)
        .and_then(LazyFrame::collect)
        .map_err(FetchError::Combine)
}
