use crate::observability::AppMetrics;
use crate::services::CatalogService;
use std::sync::Arc;

/// Application state shared by the API handlers
#[derive(Clone)]
pub struct AppState {
    /// Catalog service that lists packages and images from Cloudsmith
    pub catalog_service: Arc<dyn CatalogService>,
    /// Prometheus metrics, also used by the access log middleware
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("catalog_service", &"Arc<dyn CatalogService>")
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(catalog_service: Box<dyn CatalogService>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            catalog_service: Arc::from(catalog_service),
            metrics,
        }
    }
}
