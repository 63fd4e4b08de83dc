use crate::cache::download::send_checked;
use crate::cache::error::FetchError;
use crate::census::error::CensusError;
use crate::census::loader::CENSUS_API_BASE_URL;
use log::info;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::task;

/// One entry from the ACS `variables.json` schema document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CensusVariable {
    /// Human-readable label, e.g. `"Estimate!!Total:"`.
    #[serde(default)]
    pub label: String,
    /// Table concept, e.g. `"Household Income in the Past 12 Months"`.
    #[serde(default)]
    pub concept: Option<String>,
    /// Value type advertised by the API (`"int"`, `"string"`, ...).
    #[serde(default)]
    pub predicate_type: Option<String>,
    /// Variable group / table id, e.g. `"B19001"`.
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VariablesDocument {
    variables: HashMap<String, CensusVariable>,
}

/// Fetches the variable descriptions for one dataset year, keyed by
/// variable code. The document is served fresh on every call and is never
/// cached locally.
pub(crate) async fn fetch_variables(
    client: &Client,
    year: i32,
    dataset: &str,
) -> Result<HashMap<String, CensusVariable>, CensusError> {
    let url = format!("{CENSUS_API_BASE_URL}/{year}/acs/{dataset}/variables.json");
    info!("Downloading census variable descriptions from {}", url);

    let response = send_checked(client.get(&url), &url).await?;
    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::Network(url.clone(), e))?;

    // The document lists tens of thousands of variables; decode it off the
    // async threads.
    task::spawn_blocking(move || {
        serde_json::from_slice::<VariablesDocument>(&body)
            .map(|document| document.variables)
            .map_err(|e| CensusError::ResponseParse { url, source: e })
    })
    .await
    .map_err(FetchError::from)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_document_decodes_the_published_shape() {
        let raw = r#"{
            "variables": {
                "B19013_001E": {
                    "label": "Estimate!!Median household income in the past 12 months",
                    "concept": "MEDIAN HOUSEHOLD INCOME",
                    "predicateType": "int",
                    "group": "B19013",
                    "limit": 0
                },
                "for": {
                    "label": "Census API FIPS 'for' clause",
                    "predicateType": "fips-for"
                }
            }
        }"#;

        let document: VariablesDocument = serde_json::from_str(raw).unwrap();

        assert_eq!(document.variables.len(), 2);
        let income = &document.variables["B19013_001E"];
        assert_eq!(income.group.as_deref(), Some("B19013"));
        assert_eq!(income.predicate_type.as_deref(), Some("int"));
        let for_clause = &document.variables["for"];
        assert_eq!(for_clause.concept, None);
    }
}
