//! Disease reference library
//!
//! The full reference list is fetched once per session and filtered in
//! memory by crop facet and a case-insensitive text query.

use crate::services::PersistenceService;
use cropai_common::models::DiseaseInfo;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Facet label that disables crop filtering
pub const ALL_CROPS: &str = "All";

/// Crop filter applied to the grid
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CropFacet {
    #[default]
    All,
    Crop(String),
}

impl CropFacet {
    /// `"All"` or an empty value means no crop filter
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some(ALL_CROPS) => CropFacet::All,
            Some(crop) => CropFacet::Crop(crop.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CropFacet::All => ALL_CROPS,
            CropFacet::Crop(crop) => crop,
        }
    }

    fn matches(&self, disease: &DiseaseInfo) -> bool {
        match self {
            CropFacet::All => true,
            CropFacet::Crop(crop) => disease.crop_type == *crop,
        }
    }
}

/// Current grid filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryQuery {
    pub crop: CropFacet,
    pub text: String,
}

impl LibraryQuery {
    pub fn new(crop: Option<&str>, text: Option<&str>) -> Self {
        Self {
            crop: CropFacet::parse(crop),
            text: text.map(str::trim).unwrap_or_default().to_string(),
        }
    }

    /// Crop facet AND substring match over name and symptoms
    pub fn matches(&self, disease: &DiseaseInfo) -> bool {
        if !self.crop.matches(disease) {
            return false;
        }
        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        disease.name.to_lowercase().contains(&needle)
            || disease.symptoms.to_lowercase().contains(&needle)
    }
}

/// Entries passing the query, in list order
pub fn filter_diseases<'a>(diseases: &'a [DiseaseInfo], query: &LibraryQuery) -> Vec<&'a DiseaseInfo> {
    diseases.iter().filter(|d| query.matches(d)).collect()
}

/// `All` followed by the distinct crop types in first-seen order
pub fn crop_facets(diseases: &[DiseaseInfo]) -> Vec<String> {
    let mut facets = vec![ALL_CROPS.to_string()];
    for disease in diseases {
        if !facets[1..].iter().any(|c| *c == disease.crop_type) {
            facets.push(disease.crop_type.clone());
        }
    }
    facets
}

/// Session-scoped cache of the reference list
#[derive(Default)]
pub struct LibraryCache {
    entries: RwLock<Option<Arc<Vec<DiseaseInfo>>>>,
}

impl LibraryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached list, fetching it on first use
    ///
    /// A failed fetch yields an empty list and is not cached, so the next
    /// visit retries.
    pub async fn get_or_load(&self, store: &dyn PersistenceService) -> Arc<Vec<DiseaseInfo>> {
        if let Some(entries) = self.entries.read().await.as_ref() {
            return entries.clone();
        }

        let mut slot = self.entries.write().await;
        if let Some(entries) = slot.as_ref() {
            return entries.clone();
        }

        match store.list_diseases().await {
            Ok(diseases) => {
                debug!("Cached {} reference entries", diseases.len());
                let entries = Arc::new(diseases);
                *slot = Some(entries.clone());
                entries
            }
            Err(e) => {
                warn!("Failed to load disease library: {}", e);
                Arc::new(Vec::new())
            }
        }
    }

    /// Entry by id from the cached list
    pub async fn find(&self, store: &dyn PersistenceService, id: &str) -> Option<DiseaseInfo> {
        self.get_or_load(store)
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }
}
