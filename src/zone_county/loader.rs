use crate::cache::download::fetch_bytes;
use crate::cache::error::FetchError;
use crate::cache::store::KeyedSource;
use crate::zone_county::error::ZoneCountyError;
use log::{info, warn};
use polars::prelude::*;
use reqwest::Client;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

pub(crate) const COUNTY_ZONE_SUBDIR: &str = "COUNTY_ZONE";

/// NWS county-zone correlation file, pipe-delimited with no header row.
pub const COUNTY_ZONE_URL: &str =
    "https://www.weather.gov/source/gis/Shapefiles/County/bp05mr24.dbx";

pub(crate) const RAW_FILENAME: &str = "bp05mr24.dbx";
pub(crate) const NORMALIZED_FILENAME: &str = "bp05mr24.csv";

/// Column names assigned after parsing; the source file carries none.
pub const COUNTY_ZONE_COLUMNS: [&str; 11] = [
    "STATE",
    "ZONE",
    "CWA",
    "NAME",
    "STATE_ZONE",
    "COUNTY",
    "FIPS",
    "TIME_ZONE",
    "FE_AREA",
    "LAT",
    "LON",
];

/// Cache key for the single county-zone correlation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneCountyKey;

impl fmt::Display for ZoneCountyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("county-zone")
    }
}

/// Downloads and caches the county-zone correlation file. The raw download
/// is kept verbatim next to a normalized comma-separated copy; warm reads
/// touch only the normalized copy.
pub struct ZoneCountyLoader {
    cache_dir: PathBuf,
    client: Client,
}

impl ZoneCountyLoader {
    pub fn new(cache_root: &Path, client: Client) -> ZoneCountyLoader {
        ZoneCountyLoader {
            cache_dir: cache_root.join(COUNTY_ZONE_SUBDIR),
            client,
        }
    }

    pub(crate) fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn raw_path(&self) -> PathBuf {
        self.cache_dir.join(RAW_FILENAME)
    }

    /// Parses headerless delimited bytes with every column kept textual
    /// (FIPS codes and zone numbers carry leading zeros) and assigns the
    /// fixed column names.
    async fn parse_delimited(bytes: Vec<u8>, separator: u8) -> Result<DataFrame, ZoneCountyError> {
        let mut frame = task::spawn_blocking(move || {
            let to_decode_io = |e| FetchError::DecodeIo {
                key: ZoneCountyKey.to_string(),
                source: e,
            };
            let mut temp_file = NamedTempFile::new().map_err(to_decode_io)?;
            temp_file.write_all(&bytes).map_err(to_decode_io)?;
            temp_file.flush().map_err(to_decode_io)?;

            CsvReadOptions::default()
                .with_has_header(false)
                .with_infer_schema_length(Some(0))
                .map_parse_options(|options| options.with_separator(separator))
                .try_into_reader_with_file_path(Some(temp_file.path().to_path_buf()))
                .map_err(|e| FetchError::Decode {
                    key: ZoneCountyKey.to_string(),
                    source: e,
                })?
                .finish()
                .map_err(|e| FetchError::Decode {
                    key: ZoneCountyKey.to_string(),
                    source: e,
                })
        })
        .await
        .map_err(FetchError::from)??;

        if frame.width() != COUNTY_ZONE_COLUMNS.len() {
            warn!(
                "County-zone file has {} columns, expected {}",
                frame.width(),
                COUNTY_ZONE_COLUMNS.len()
            );
            return Err(ZoneCountyError::SchemaMismatch {
                expected: COUNTY_ZONE_COLUMNS.len(),
                found: frame.width(),
            });
        }
        frame
            .set_column_names(COUNTY_ZONE_COLUMNS.iter().copied())
            .map_err(|e| FetchError::Decode {
                key: ZoneCountyKey.to_string(),
                source: e,
            })?;
        Ok(frame)
    }
}

impl KeyedSource for ZoneCountyLoader {
    type Key = ZoneCountyKey;
    type Error = ZoneCountyError;

    fn cache_path(&self, _key: &ZoneCountyKey) -> PathBuf {
        self.cache_dir.join(NORMALIZED_FILENAME)
    }

    async fn fetch_remote(&self, _key: &ZoneCountyKey) -> Result<DataFrame, ZoneCountyError> {
        info!("Downloading county-zone mapping from {}", COUNTY_ZONE_URL);
        let bytes = fetch_bytes(&self.client, COUNTY_ZONE_URL).await?;

        // Keep the raw download verbatim next to the normalized copy.
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| FetchError::CacheDirCreation(self.cache_dir.clone(), e))?;
        let raw_path = self.raw_path();
        fs::write(&raw_path, &bytes)
            .await
            .map_err(|e| FetchError::CacheWrite(raw_path.clone(), e))?;
        info!("Saved raw county-zone file to {:?}", raw_path);

        Self::parse_delimited(bytes, b'|').await
    }

    async fn read_cache(
        &self,
        _key: &ZoneCountyKey,
        path: &Path,
    ) -> Result<DataFrame, ZoneCountyError> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| FetchError::CacheRead(path.to_path_buf(), e))?;
        Self::parse_delimited(bytes, b',').await
    }

    async fn write_cache(
        &self,
        _key: &ZoneCountyKey,
        mut frame: DataFrame,
        path: &Path,
    ) -> Result<(), ZoneCountyError> {
        let path_buf = path.to_path_buf();
        // Written without a header so a warm read decodes exactly what the
        // cold fetch produced.
        task::spawn_blocking(move || {
            let file = std::fs::File::create(&path_buf)
                .map_err(|e| FetchError::CacheWrite(path_buf.clone(), e))?;
            CsvWriter::new(file)
                .include_header(false)
                .finish(&mut frame)
                .map_err(|e| FetchError::Encode {
                    key: ZoneCountyKey.to_string(),
                    source: e,
                })?;
            Ok::<(), FetchError>(())
        })
        .await
        .map_err(FetchError::from)??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::policy::FileExists;
    use crate::cache::store::fetch_or_load;

    const SAMPLE_PIPE: &str = "\
AK|101|AFG|Arctic Coast|AK101|North Slope|02185|A|er|70.0655|-153.9561\n\
AK|125|AFC|Kodiak Island|AK125|Kodiak Island|02150|A|sw|57.5185|-153.3998\n";

    #[tokio::test]
    async fn pipe_file_parses_with_fixed_columns() -> Result<(), ZoneCountyError> {
        let frame =
            ZoneCountyLoader::parse_delimited(SAMPLE_PIPE.as_bytes().to_vec(), b'|').await?;

        assert_eq!(frame.shape(), (2, 11));
        assert_eq!(frame.get_column_names_str(), COUNTY_ZONE_COLUMNS);
        // Everything stays textual, coordinates and zero-padded codes alike.
        assert!(frame
            .dtypes()
            .iter()
            .all(|dtype| dtype == &DataType::String));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_width_is_a_schema_mismatch() {
        let result = ZoneCountyLoader::parse_delimited(b"a|b|c\n".to_vec(), b'|').await;

        match result {
            Err(ZoneCountyError::SchemaMismatch { expected, found }) => {
                assert_eq!(expected, 11);
                assert_eq!(found, 3);
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn normalized_cache_round_trips_identically() -> Result<(), ZoneCountyError> {
        let dir = tempfile::tempdir().unwrap();
        let loader = ZoneCountyLoader::new(dir.path(), Client::new());
        let frame =
            ZoneCountyLoader::parse_delimited(SAMPLE_PIPE.as_bytes().to_vec(), b'|').await?;

        fs::create_dir_all(loader.cache_dir()).await.unwrap();
        let path = loader.cache_path(&ZoneCountyKey);
        loader.write_cache(&ZoneCountyKey, frame.clone(), &path).await?;

        let first = fetch_or_load(&loader, &FileExists, &ZoneCountyKey).await?;
        let second = fetch_or_load(&loader, &FileExists, &ZoneCountyKey).await?;

        assert!(frame.equals_missing(&first));
        assert!(first.equals_missing(&second));
        let fips: Vec<Option<&str>> = first
            .column("FIPS")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(fips, vec![Some("02185"), Some("02150")]);
        Ok(())
    }
}
