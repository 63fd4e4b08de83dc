mod cache;
mod census;
mod clients;
mod error;
mod events;
mod stormdata;
mod utils;
mod zone_county;

pub use error::StormDataError;
pub use stormdata::*;

pub use clients::census_client::CensusClient;
pub use clients::storm_events_client::StormEventsClient;
pub use clients::zone_county_client::ZoneCountyClient;

pub use cache::error::FetchError;
pub use cache::policy::{CachePolicy, FileExists};
pub use cache::store::{combine_frames, fetch_all, fetch_or_load, gather_frames, KeyedSource};

pub use census::error::CensusError;
pub use census::loader::{
    default_variable_codes, read_api_key, CensusLoader, CensusQuery, ACS_VARIABLES,
    CENSUS_API_BASE_URL, DEFAULT_ACS_DATASET, DEFAULT_ACS_YEAR, DEFAULT_API_KEY_PATH, STATE_FIPS,
};
pub use census::variables::CensusVariable;

pub use events::damage::{decode_damage_series, decode_damage_value};
pub use events::loader::{StormEventsLoader, DEFAULT_YEAR_RANGE, STORM_EVENTS_BASE_URL};

pub use utils::{ensure_cache_dir_exists, resolve_cache_dir, CACHE_DIR_ENV_VAR};

pub use zone_county::error::ZoneCountyError;
pub use zone_county::loader::{
    ZoneCountyKey, ZoneCountyLoader, COUNTY_ZONE_COLUMNS, COUNTY_ZONE_URL,
};
