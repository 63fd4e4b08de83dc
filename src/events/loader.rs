use crate::cache::download::fetch_gzipped_bytes;
use crate::cache::error::FetchError;
use crate::cache::store::KeyedSource;
use async_compression::tokio::bufread::GzipDecoder;
use async_compression::tokio::write::GzipEncoder;
use log::info;
use polars::prelude::*;
use reqwest::Client;
use std::io::Write;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::{fs, task};

pub(crate) const STORM_EVENTS_SUBDIR: &str = "NOAA_STORM_DATA";

/// Directory listing holding the per-year storm event detail files.
pub const STORM_EVENTS_BASE_URL: &str =
    "https://www.ncei.noaa.gov/pub/data/swdi/stormevents/csvfiles/";

/// Years with a published details file.
pub const DEFAULT_YEAR_RANGE: RangeInclusive<i32> = 1950..=2024;

/// Published filename for one year of storm event details.
///
/// Every year is available under the April 2025 batch timestamp except 2020,
/// whose newest file still carries the June 2024 timestamp, so that one is
/// pinned.
pub(crate) fn storm_events_filename(year: i32) -> String {
    if year == 2020 {
        return "StormEvents_details-ftp_v1.0_d2020_c20240620.csv.gz".to_string();
    }
    format!("StormEvents_details-ftp_v1.0_d{year}_c20250401.csv.gz")
}

/// Downloads and caches the NOAA storm event detail files, one gzipped CSV
/// per year under `NOAA_STORM_DATA/`.
pub struct StormEventsLoader {
    cache_dir: PathBuf,
    client: Client,
}

impl StormEventsLoader {
    pub fn new(cache_root: &Path, client: Client) -> StormEventsLoader {
        StormEventsLoader {
            cache_dir: cache_root.join(STORM_EVENTS_SUBDIR),
            client,
        }
    }

    pub(crate) fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Parses decompressed CSV bytes in a blocking task. The files carry a
    /// header row, and the schema is inferred from the whole file because
    /// several columns stay empty for entire early decades.
    async fn parse_csv(bytes: Vec<u8>, year: i32) -> Result<DataFrame, FetchError> {
        task::spawn_blocking(move || {
            let key = year.to_string();
            let mut temp_file = NamedTempFile::new().map_err(|e| FetchError::DecodeIo {
                key: key.clone(),
                source: e,
            })?;
            temp_file.write_all(&bytes).map_err(|e| FetchError::DecodeIo {
                key: key.clone(),
                source: e,
            })?;
            temp_file.flush().map_err(|e| FetchError::DecodeIo {
                key: key.clone(),
                source: e,
            })?;

            CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(None)
                .try_into_reader_with_file_path(Some(temp_file.path().to_path_buf()))
                .map_err(|e| FetchError::Decode {
                    key: key.clone(),
                    source: e,
                })?
                .finish()
                .map_err(|e| FetchError::Decode { key, source: e })
        })
        .await?
    }

    /// Serializes a table to gzipped CSV at `path`. Encoding runs in a
    /// blocking task; the compressed bytes are then streamed to disk.
    async fn write_gzipped_csv(
        mut frame: DataFrame,
        year: i32,
        path: &Path,
    ) -> Result<(), FetchError> {
        let key = year.to_string();
        let csv_bytes = task::spawn_blocking(move || {
            let mut buffer = Vec::new();
            CsvWriter::new(&mut buffer)
                .include_header(true)
                .finish(&mut frame)?;
            Ok::<Vec<u8>, PolarsError>(buffer)
        })
        .await?
        .map_err(|e| FetchError::Encode { key, source: e })?;

        let file = fs::File::create(path)
            .await
            .map_err(|e| FetchError::CacheWrite(path.to_path_buf(), e))?;
        let mut encoder = GzipEncoder::new(file);
        encoder
            .write_all(&csv_bytes)
            .await
            .map_err(|e| FetchError::CacheWrite(path.to_path_buf(), e))?;
        encoder
            .shutdown()
            .await
            .map_err(|e| FetchError::CacheWrite(path.to_path_buf(), e))?;
        Ok(())
    }
}

impl KeyedSource for StormEventsLoader {
    type Key = i32;
    type Error = FetchError;

    fn cache_path(&self, year: &i32) -> PathBuf {
        self.cache_dir.join(storm_events_filename(*year))
    }

    async fn fetch_remote(&self, year: &i32) -> Result<DataFrame, FetchError> {
        let url = format!("{}{}", STORM_EVENTS_BASE_URL, storm_events_filename(*year));
        info!("Downloading storm events for {} from {}", year, url);
        let bytes = fetch_gzipped_bytes(&self.client, &url).await?;
        Self::parse_csv(bytes, *year).await
    }

    async fn read_cache(&self, year: &i32, path: &Path) -> Result<DataFrame, FetchError> {
        let file = fs::File::open(path)
            .await
            .map_err(|e| FetchError::CacheRead(path.to_path_buf(), e))?;
        let mut decoder = GzipDecoder::new(BufReader::new(file));
        let mut bytes = Vec::new();
        decoder
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| FetchError::CacheRead(path.to_path_buf(), e))?;
        Self::parse_csv(bytes, *year).await
    }

    async fn write_cache(
        &self,
        year: &i32,
        frame: DataFrame,
        path: &Path,
    ) -> Result<(), FetchError> {
        Self::write_gzipped_csv(frame, *year, path).await
    }
}
