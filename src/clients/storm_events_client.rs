//! Provides the `StormEventsClient` for fetching NOAA storm event details.
//!
//! Obtained via [`StormData::storm_events()`]. One gzipped CSV is cached per
//! year; spans of years are fetched concurrently (bounded by the configured
//! worker count) and concatenated in year order.

use crate::cache::store::{fetch_all, fetch_or_load};
use crate::error::StormDataError;
use crate::events::loader::DEFAULT_YEAR_RANGE;
use crate::stormdata::StormData;
use polars::prelude::DataFrame;
use std::ops::RangeInclusive;

/// A client for the per-year storm event detail tables.
///
/// Instances are created by calling [`StormData::storm_events()`].
pub struct StormEventsClient<'a> {
    client: &'a StormData,
}

impl<'a> StormEventsClient<'a> {
    pub(crate) fn new(client: &'a StormData) -> Self {
        Self { client }
    }

    /// Loads one year of storm events, downloading and caching the year's
    /// file when it is not cached yet.
    ///
    /// # Arguments
    ///
    /// * `year` - The event year, e.g. `2011`. Years outside the published
    ///   range fail with an HTTP status error.
    ///
    /// # Returns
    ///
    /// The full detail table for that year, one row per recorded event.
    ///
    /// # Errors
    ///
    /// Returns a download error carrying the URL (and status, when the
    /// server answered) if the file cannot be retrieved, or a decode error
    /// if its contents cannot be parsed. Nothing is cached in either case.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use stormdata::{StormData, StormDataError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), StormDataError> {
    /// let client = StormData::new().await?;
    /// let events_2011 = client.storm_events().year(2011).await?;
    /// println!("{} events recorded in 2011", events_2011.height());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn year(&self, year: i32) -> Result<DataFrame, StormDataError> {
        fetch_or_load(
            &self.client.events,
            self.client.config.cache_policy.as_ref(),
            &year,
        )
        .await
        .map_err(StormDataError::from)
    }

    /// Loads an inclusive span of years as one combined table, in year
    /// order. Missing years are fetched concurrently; the whole span fails
    /// on the first year that cannot be fetched or decoded.
    pub async fn years(&self, years: RangeInclusive<i32>) -> Result<DataFrame, StormDataError> {
        fetch_all(
            &self.client.events,
            self.client.config.cache_policy.as_ref(),
            years.collect(),
            self.client.config.max_workers,
        )
        .await
        .map_err(StormDataError::from)
    }

    /// Loads every published year, 1950 through 2024. Expect a long first
    /// run and tens of gigabytes of cache.
    pub async fn all(&self) -> Result<DataFrame, StormDataError> {
        self.years(DEFAULT_YEAR_RANGE).await
    }
}
