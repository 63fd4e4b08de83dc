use polars::error::PolarsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors shared by the cache core and by every dataset loader built on it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    Network(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download or decompression failed for {0}")]
    DownloadIo(String, #[source] io::Error),

    #[error("Failed to read cache file '{0}'")]
    CacheRead(PathBuf, #[source] io::Error),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] io::Error),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] io::Error),

    #[error("Failed to decode data for key '{key}'")]
    Decode {
        key: String,
        #[source]
        source: PolarsError,
    },

    #[error("I/O error while decoding data for key '{key}'")]
    DecodeIo {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize table for key '{key}'")]
    Encode {
        key: String,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to combine per-key tables")]
    Combine(#[source] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
