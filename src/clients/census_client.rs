//! Provides the `CensusClient` for fetching ACS census estimates.
//!
//! Obtained via [`StormData::census()`]. The estimates for all states are
//! downloaded in one concurrent batch and cached as a single combined CSV;
//! the `variables.json` schema document is fetched fresh on every call.

use crate::cache::store::fetch_or_load;
use crate::census::loader::{CensusQuery, DEFAULT_ACS_DATASET, DEFAULT_ACS_YEAR};
use crate::census::variables::CensusVariable;
use crate::error::StormDataError;
use crate::stormdata::StormData;
use bon::bon;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::path::PathBuf;

/// A client builder for ACS census data.
///
/// Instances are created by calling [`StormData::census()`].
pub struct CensusClient<'a> {
    client: &'a StormData,
}

#[bon]
impl<'a> CensusClient<'a> {
    pub(crate) fn new(client: &'a StormData) -> Self {
        Self { client }
    }

    /// Initiates a builder that loads tract-level ACS estimates for the 50
    /// states plus the District of Columbia as one combined table.
    ///
    /// The per-state downloads run concurrently, bounded by the configured
    /// worker count, and are concatenated in FIPS order. The combined table
    /// is cached as a single file: once any query has been materialized,
    /// later calls return the cached table regardless of their own
    /// parameters. Delete the cache file to materialize a different query.
    /// A warm cache needs neither the API key nor network access.
    ///
    /// # Optional Builder Methods
    ///
    /// * `.year(i32)`: Dataset vintage. Defaults to `2020`.
    /// * `.dataset(String)`: Dataset slug under `acs/`. Defaults to `"acs5"`.
    /// * `.fields(Vec<String>)`: Variable codes for the API's `get` clause.
    ///   Defaults to the nineteen population and household income variables
    ///   in [`ACS_VARIABLES`](crate::ACS_VARIABLES).
    /// * `.county(String)` / `.tract(String)`: Geography filters. Default to
    ///   `"*"` (all counties, all tracts).
    /// * `.api_key_file(PathBuf)`: Plaintext file holding the API key, read
    ///   only on a cache miss. Defaults to `../census_api_key.txt`.
    ///
    /// # Errors
    ///
    /// A missing key file is reported as a configuration error naming the
    /// expected path before any request is made. Download and decode
    /// failures carry the offending URL or state code; the key itself never
    /// appears in errors or logs.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use stormdata::{StormData, StormDataError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), StormDataError> {
    /// let client = StormData::new().await?;
    /// let census = client
    ///     .census()
    ///     .data()
    ///     .year(2020)
    ///     .call()
    ///     .await?;
    /// println!("{} tracts", census.height());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn data(
        &self,
        year: Option<i32>,
        dataset: Option<String>,
        fields: Option<Vec<String>>,
        county: Option<String>,
        tract: Option<String>,
        api_key_file: Option<PathBuf>,
    ) -> Result<DataFrame, StormDataError> {
        let defaults = CensusQuery::default();
        let query = CensusQuery {
            year: year.unwrap_or(defaults.year),
            dataset: dataset.unwrap_or(defaults.dataset),
            fields: fields.unwrap_or(defaults.fields),
            county: county.unwrap_or(defaults.county),
            tract: tract.unwrap_or(defaults.tract),
            api_key_file: api_key_file.unwrap_or(defaults.api_key_file),
        };
        fetch_or_load(
            &self.client.census,
            self.client.config.cache_policy.as_ref(),
            &query,
        )
        .await
        .map_err(StormDataError::from)
    }

    /// Initiates a builder that fetches the `variables.json` schema for a
    /// dataset year: a map from variable code (e.g. `"B19013_001E"`) to its
    /// description. Served fresh on every call, never cached.
    ///
    /// # Optional Builder Methods
    ///
    /// * `.year(i32)`: Dataset vintage. Defaults to `2020`.
    /// * `.dataset(String)`: Dataset slug under `acs/`. Defaults to `"acs5"`.
    #[builder]
    pub async fn variables(
        &self,
        year: Option<i32>,
        dataset: Option<String>,
    ) -> Result<HashMap<String, CensusVariable>, StormDataError> {
        self.client
            .census
            .variables(
                year.unwrap_or(DEFAULT_ACS_YEAR),
                dataset.as_deref().unwrap_or(DEFAULT_ACS_DATASET),
            )
            .await
            .map_err(StormDataError::from)
    }
}
