pub mod census_client;
pub mod storm_events_client;
pub mod zone_county_client;
