//! Region catalog endpoint

use async_trait::async_trait;

use super::DoctolibClient;
use crate::models::{CatalogData, CatalogResponse};
use crate::utils::error::FetchError;

/// Source of the raw catalog records for the configured region
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch places, agendas and vaccination types in one request
    async fn fetch_catalog(&self) -> Result<CatalogData, FetchError>;
}

impl DoctolibClient {
    /// Path of the catalog document for a region slug
    pub fn catalog_path(region: &str) -> String {
        format!("booking/{region}.json")
    }
}

#[async_trait]
impl CatalogClient for DoctolibClient {
    async fn fetch_catalog(&self) -> Result<CatalogData, FetchError> {
        let url = self.endpoint(&Self::catalog_path(self.region()))?;
        let response: CatalogResponse = self.get_json(url).await?;

        tracing::debug!(
            places = response.data.places.len(),
            agendas = response.data.agendas.len(),
            visit_motives = response.data.visit_motives.len(),
            "Catalog fetched"
        );

        Ok(response.data)
    }
}
