//! Provides the `ZoneCountyClient` for fetching the NWS county-zone
//! correlation table, obtained via [`StormData::zone_county()`].

use crate::cache::store::fetch_or_load;
use crate::error::StormDataError;
use crate::stormdata::StormData;
use crate::zone_county::loader::ZoneCountyKey;
use polars::prelude::DataFrame;

/// A client for the county-zone correlation table.
///
/// Instances are created by calling [`StormData::zone_county()`].
pub struct ZoneCountyClient<'a> {
    client: &'a StormData,
}

impl<'a> ZoneCountyClient<'a> {
    pub(crate) fn new(client: &'a StormData) -> Self {
        Self { client }
    }

    /// Loads the mapping of forecast zones to counties, downloading it on
    /// first use. The raw pipe-delimited file is kept next to the normalized
    /// CSV; warm calls read only the normalized copy. All eleven columns
    /// stay textual, so FIPS codes keep their leading zeros.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use stormdata::{StormData, StormDataError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), StormDataError> {
    /// let client = StormData::new().await?;
    /// let zones = client.zone_county().mapping().await?;
    /// println!("{} zone-county rows", zones.height());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn mapping(&self) -> Result<DataFrame, StormDataError> {
        fetch_or_load(
            &self.client.zone_county,
            self.client.config.cache_policy.as_ref(),
            &ZoneCountyKey,
        )
        .await
        .map_err(StormDataError::from)
    }
}
