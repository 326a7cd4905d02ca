//! openFDA client — drug label + adverse-event lookup by medication name.
//!
//! Issues the two queries concurrently with `limit=1` each, taking the first
//! match. openFDA is public (no key), occasionally slow, and frequently has
//! no data for a non-US brand name, so every failure path is a warn-and-skip.

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{AdverseEventReport, DrugInfo, DrugInfoClient, DrugLabel};
use super::DrugInfoError;

const REQUEST_TIMEOUT_SECS: u64 = 15;

pub struct OpenFdaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenFdaClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn fetch_label(&self, drug_name: &str) -> Result<Option<DrugLabel>, DrugInfoError> {
        let url = format!("{}/label.json", self.base_url);
        let search = format!("openfda.brand_name:{drug_name}");
        let envelope: FdaEnvelope<DrugLabel> = self.fetch(&url, &search).await?;
        Ok(envelope.results.into_iter().next())
    }

    async fn fetch_events(
        &self,
        drug_name: &str,
    ) -> Result<Option<AdverseEventReport>, DrugInfoError> {
        let url = format!("{}/event.json", self.base_url);
        let search = format!("patient.drug.medicinalproduct:{drug_name}");
        let envelope: FdaEnvelope<AdverseEventReport> = self.fetch(&url, &search).await?;
        Ok(envelope.results.into_iter().next())
    }

    async fn fetch<T: for<'de> Deserialize<'de> + Default>(
        &self,
        url: &str,
        search: &str,
    ) -> Result<FdaEnvelope<T>, DrugInfoError> {
        let response = self
            .client
            .get(url)
            .query(&[("search", search), ("limit", "1")])
            .send()
            .await
            .map_err(|e| DrugInfoError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DrugInfoError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| DrugInfoError::ResponseParsing(e.to_string()))
    }
}

#[async_trait]
impl DrugInfoClient for OpenFdaClient {
    async fn lookup(&self, drug_name: &str) -> DrugInfo {
        let (label, events) = tokio::join!(self.fetch_label(drug_name), self.fetch_events(drug_name));

        let label = label.unwrap_or_else(|e| {
            tracing::warn!(drug_name, error = %e, "FDA label lookup failed");
            None
        });
        let events = events.unwrap_or_else(|e| {
            tracing::warn!(drug_name, error = %e, "FDA adverse-event lookup failed");
            None
        });

        tracing::debug!(
            drug_name,
            has_label = label.is_some(),
            has_events = events.is_some(),
            "FDA lookup complete"
        );

        DrugInfo { label, events }
    }
}

#[derive(Deserialize)]
struct FdaEnvelope<T> {
    #[serde(default)]
    results: Vec<T>,
}
