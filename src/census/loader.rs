use crate::cache::download::send_checked;
use crate::cache::error::FetchError;
use crate::cache::store::{combine_frames, gather_frames, KeyedSource};
use crate::census::error::CensusError;
use crate::census::variables::{fetch_variables, CensusVariable};
use log::{debug, info};
use polars::prelude::*;
use reqwest::Client;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

pub(crate) const CENSUS_SUBDIR: &str = "CENSUS_DATA";
pub(crate) const CENSUS_CACHE_FILENAME: &str = "census_data.csv";

/// Root of the Census Bureau data API.
pub const CENSUS_API_BASE_URL: &str = "https://api.census.gov/data";

/// Dataset vintage used when a query does not specify one.
pub const DEFAULT_ACS_YEAR: i32 = 2020;

/// ACS 5-year estimates.
pub const DEFAULT_ACS_DATASET: &str = "acs5";

/// Where the API key is looked for when a query does not name a file.
pub const DEFAULT_API_KEY_PATH: &str = "../census_api_key.txt";

/// FIPS codes of the 50 states plus the District of Columbia.
pub const STATE_FIPS: [&str; 51] = [
    "01", "02", "04", "05", "06", "08", "09", "10", "11", "12", "13", "15", "16", "17", "18",
    "19", "20", "21", "22", "23", "24", "25", "26", "27", "28", "29", "30", "31", "32", "33",
    "34", "35", "36", "37", "38", "39", "40", "41", "42", "44", "45", "46", "47", "48", "49",
    "50", "51", "53", "54", "55", "56",
];

/// Default ACS variables: total population, household counts, median
/// household income, and the sixteen household income brackets.
pub const ACS_VARIABLES: [(&str, &str); 19] = [
    ("B01001_001E", "TOTAL POPULATION"),
    ("B19001_001E", "TOTAL NUMBER OF HOUSEHOLDS"),
    ("B19013_001E", "MEDIAN HOUSEHOLD INCOME"),
    ("B19001_002E", "Households: Less than $10,000"),
    ("B19001_003E", "Households: $10,000 to $14,999"),
    ("B19001_004E", "Households: $15,000 to $19,999"),
    ("B19001_005E", "Households: $20,000 to $24,999"),
    ("B19001_006E", "Households: $25,000 to $29,999"),
    ("B19001_007E", "Households: $30,000 to $34,999"),
    ("B19001_008E", "Households: $35,000 to $39,999"),
    ("B19001_009E", "Households: $40,000 to $44,999"),
    ("B19001_010E", "Households: $45,000 to $49,999"),
    ("B19001_011E", "Households: $50,000 to $59,999"),
    ("B19001_012E", "Households: $60,000 to $74,999"),
    ("B19001_013E", "Households: $75,000 to $99,999"),
    ("B19001_014E", "Households: $100,000 to $124,999"),
    ("B19001_015E", "Households: $125,000 to $149,999"),
    ("B19001_016E", "Households: $150,000 to $199,999"),
    ("B19001_017E", "Households: $200,000 or more"),
];

/// Returns the default variable codes for a data query.
pub fn default_variable_codes() -> Vec<String> {
    ACS_VARIABLES
        .iter()
        .map(|(code, _)| (*code).to_string())
        .collect()
}

/// Parameters of one ACS data request.
///
/// The combined dataset is cached as a single file, so the cache lookup
/// deliberately ignores these parameters: any warm cache satisfies any
/// query. Delete the cache file to materialize a different query.
#[derive(Debug, Clone)]
pub struct CensusQuery {
    pub year: i32,
    pub dataset: String,
    /// Variable codes passed to the API's `get` clause.
    pub fields: Vec<String>,
    pub county: String,
    pub tract: String,
    /// Plaintext file holding the API key, read only on a cache miss.
    pub api_key_file: PathBuf,
}

impl Default for CensusQuery {
    fn default() -> Self {
        CensusQuery {
            year: DEFAULT_ACS_YEAR,
            dataset: DEFAULT_ACS_DATASET.to_string(),
            fields: default_variable_codes(),
            county: "*".to_string(),
            tract: "*".to_string(),
            api_key_file: PathBuf::from(DEFAULT_API_KEY_PATH),
        }
    }
}

impl fmt::Display for CensusQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset, self.year)
    }
}

/// Reads and trims the API key. A missing file is a configuration error
/// naming the expected path; no request is attempted without a key.
pub async fn read_api_key(path: &Path) -> Result<String, CensusError> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(contents.trim().to_string()),
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            Err(CensusError::MissingApiKey {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(CensusError::ApiKeyRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Builds an all-string table from the API's array-of-arrays payload, where
/// the first row holds the column names and cells may be null.
pub(crate) fn rows_to_dataframe(
    state: &str,
    rows: Vec<Vec<Option<String>>>,
) -> Result<DataFrame, CensusError> {
    let Some((header, data)) = rows.split_first() else {
        return Err(CensusError::EmptyResponse {
            state: state.to_string(),
        });
    };

    let columns: Vec<Column> = header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let values: Vec<Option<String>> = data
                .iter()
                .map(|row| row.get(index).cloned().flatten())
                .collect();
            Column::new(name.as_deref().unwrap_or_default().into(), values)
        })
        .collect();

    DataFrame::new(columns).map_err(CensusError::FrameBuild)
}

/// Downloads tract-level ACS estimates per state and caches the combined
/// result as a single CSV under `CENSUS_DATA/`.
pub struct CensusLoader {
    cache_dir: PathBuf,
    client: Client,
    max_workers: usize,
}

impl CensusLoader {
    pub fn new(cache_root: &Path, client: Client, max_workers: usize) -> CensusLoader {
        CensusLoader {
            cache_dir: cache_root.join(CENSUS_SUBDIR),
            client,
            max_workers,
        }
    }

    pub(crate) fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Variable descriptions for one dataset year, never cached.
    pub async fn variables(
        &self,
        year: i32,
        dataset: &str,
    ) -> Result<HashMap<String, CensusVariable>, CensusError> {
        fetch_variables(&self.client, year, dataset).await
    }

    /// Fetches one state's rows and decodes them into an all-string table.
    async fn fetch_state(
        &self,
        query: &CensusQuery,
        api_key: &str,
        state_fips: &str,
    ) -> Result<DataFrame, CensusError> {
        let url = format!(
            "{}/{}/acs/{}",
            CENSUS_API_BASE_URL, query.year, query.dataset
        );
        // The key travels only in the query string; errors and logs carry
        // the bare URL.
        let request = self.client.get(&url).query(&[
            ("get", query.fields.join(",")),
            ("for", format!("tract:{}", query.tract)),
            ("in", format!("state:{} county:{}", state_fips, query.county)),
            ("key", api_key.to_string()),
        ]);

        let response = send_checked(request, &url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(url.clone(), e.without_url()))?;
        let rows: Vec<Vec<Option<String>>> = serde_json::from_slice(&body)
            .map_err(|e| CensusError::ResponseParse { url, source: e })?;

        let frame = rows_to_dataframe(state_fips, rows)?;
        debug!(
            "Fetched {} census rows for state {}",
            frame.height(),
            state_fips
        );
        Ok(frame)
    }
}

impl KeyedSource for CensusLoader {
    type Key = CensusQuery;
    type Error = CensusError;

    fn cache_path(&self, _query: &CensusQuery) -> PathBuf {
        // One aggregate file regardless of the query parameters.
        self.cache_dir.join(CENSUS_CACHE_FILENAME)
    }

    async fn fetch_remote(&self, query: &CensusQuery) -> Result<DataFrame, CensusError> {
        let api_key = read_api_key(&query.api_key_file).await?;
        info!(
            "Downloading {} census data for {} states with {} workers",
            query,
            STATE_FIPS.len(),
            self.max_workers
        );

        let api_key = api_key.as_str();
        let frames = gather_frames(STATE_FIPS.to_vec(), self.max_workers, move |state| {
            async move { self.fetch_state(query, api_key, state).await }
        })
        .await?;
        combine_frames(frames).map_err(CensusError::from)
    }

    async fn read_cache(&self, query: &CensusQuery, path: &Path) -> Result<DataFrame, CensusError> {
        let key = query.to_string();
        let path_buf = path.to_path_buf();
        let frame = task::spawn_blocking(move || {
            CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(None)
                .try_into_reader_with_file_path(Some(path_buf))
                .map_err(|e| FetchError::Decode {
                    key: key.clone(),
                    source: e,
                })?
                .finish()
                .map_err(|e| FetchError::Decode { key, source: e })
        })
        .await
        .map_err(FetchError::from)??;
        Ok(frame)
    }

    async fn write_cache(
        &self,
        query: &CensusQuery,
        mut frame: DataFrame,
        path: &Path,
    ) -> Result<(), CensusError> {
        let key = query.to_string();
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let file = std::fs::File::create(&path_buf)
                .map_err(|e| FetchError::CacheWrite(path_buf.clone(), e))?;
            CsvWriter::new(file)
                .include_header(true)
                .finish(&mut frame)
                .map_err(|e| FetchError::Encode { key, source: e })?;
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

    #[test]
    fn rows_become_an_all_string_frame() {
        let rows = vec![
            vec![
                Some("B01001_001E".to_string()),
                Some("state".to_string()),
                Some("county".to_string()),
            ],
            vec![
                Some("5029".to_string()),
                Some("01".to_string()),
                Some("001".to_string()),
            ],
            vec![None, Some("01".to_string()), Some("003".to_string())],
        ];

        let frame = rows_to_dataframe("01", rows).unwrap();

        assert_eq!(frame.shape(), (2, 3));
        assert_eq!(
            frame.get_column_names_str(),
            ["B01001_001E", "state", "county"]
        );
        assert_eq!(frame.column("B01001_001E").unwrap().null_count(), 1);
    }

    #[test]
    fn empty_response_is_an_error() {
        let result = rows_to_dataframe("02", Vec::new());
        assert!(matches!(result, Err(CensusError::EmptyResponse { .. })));
    }

    #[test]
    fn default_query_covers_the_income_tables() {
        let query = CensusQuery::default();
        assert_eq!(query.year, 2020);
        assert_eq!(query.dataset, "acs5");
        assert_eq!(query.fields.len(), ACS_VARIABLES.len());
        assert_eq!(query.county, "*");
        assert_eq!(query.tract, "*");
        assert!(query.fields.contains(&"B19013_001E".to_string()));
    }

    #[test]
    fn cache_path_ignores_query_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let loader = CensusLoader::new(dir.path(), Client::new(), 4);
        let other = CensusQuery {
            year: 2019,
            ..CensusQuery::default()
        };
        assert_eq!(
            loader.cache_path(&CensusQuery::default()),
            loader.cache_path(&other)
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = CensusLoader::new(dir.path(), Client::new(), 4);
        let query = CensusQuery {
            api_key_file: dir.path().join("no_such_key.txt"),
            ..CensusQuery::default()
        };

        // The key file is read before any request is assembled, so the miss
        // path fails fast and names the expected path.
        let result = fetch_or_load(&loader, &FileExists, &query).await;

        match result {
            Err(CensusError::MissingApiKey { path, .. }) => {
                assert_eq!(path, dir.path().join("no_such_key.txt"));
            }
            other => panic!("expected MissingApiKey, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn api_key_is_trimmed() -> Result<(), CensusError> {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("census_api_key.txt");
        tokio::fs::write(&key_path, "abc123\n").await.unwrap();

        assert_eq!(read_api_key(&key_path).await?, "abc123");
        Ok(())
    }

    #[tokio::test]
    async fn warm_cache_is_served_without_key_or_network() -> Result<(), CensusError> {
        let dir = tempfile::tempdir().unwrap();
        let loader = CensusLoader::new(dir.path(), Client::new(), 4);
        let query = CensusQuery {
            api_key_file: dir.path().join("intentionally_absent.txt"),
            ..CensusQuery::default()
        };
        let frame = rows_to_dataframe(
            "01",
            vec![
                vec![Some("B01001_001E".into()), Some("state".into())],
                vec![Some("5029".into()), Some("01".into())],
            ],
        )?;
        fs::create_dir_all(loader.cache_dir()).await.unwrap();
        let path = loader.cache_path(&query);
        loader.write_cache(&query, frame, &path).await?;

        let restored = fetch_or_load(&loader, &FileExists, &query).await?;

        assert_eq!(restored.height(), 1);
        assert_eq!(restored.get_column_names_str(), ["B01001_001E", "state"]);
        Ok(())
    }
}
