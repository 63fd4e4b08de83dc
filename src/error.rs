use crate::cache::error::FetchError;
use crate::census::error::CensusError;
use crate::zone_county::error::ZoneCountyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StormDataError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Census(#[from] CensusError),

    #[error(transparent)]
    ZoneCounty(#[from] ZoneCountyError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("Invalid worker count '{0}' in STORMDATA_WORKERS")]
    InvalidWorkerCount(String),
}
