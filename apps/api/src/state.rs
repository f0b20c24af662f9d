use std::sync::Arc;

use crate::config::Config;
use crate::jobs::JobStore;
use crate::llm_client::GenerationService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Open job listings. Default: PgJobStore over the synced `job_listings` table.
    pub jobs: Arc<dyn JobStore>,
    /// Generation backend. Default: XaiClient.
    pub generator: Arc<dyn GenerationService>,
    pub config: Config,
}
