use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::jobs::{filter_options, FilterOptions};
use crate::state::AppState;

/// GET /api/v1/jobs/filters
///
/// Distinct locations and departments across open listings, for the filter UI.
pub async fn handle_filter_options(
    State(state): State<AppState>,
) -> Result<Json<FilterOptions>, AppError> {
    let jobs = state.jobs.list_open_jobs().await.map_err(|e| {
        AppError::ContextBuild(format!("Failed to load open jobs: {e:#}"))
    })?;
    Ok(Json(filter_options(&jobs)))
}
