use crate::cache::error::FetchError;
use polars::error::PolarsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Census API key file not found at '{path}'")]
    MissingApiKey {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read Census API key file '{path}'")]
    ApiKeyRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse Census API response from {url}")]
    ResponseParse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Census API returned no rows for state {state}")]
    EmptyResponse { state: String },

    #[error("Failed to build a table from Census API rows")]
    FrameBuild(#[source] PolarsError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
