use crate::cache::error::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZoneCountyError {
    #[error("County-zone file has {found} columns, expected {expected}")]
    SchemaMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
