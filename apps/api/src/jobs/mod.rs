//! Job Store: read access to the open listings kept fresh by the sync job.

pub mod handlers;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;

use crate::models::job::{JobListing, JobListingRow};

/// Source of open job listings. Carried in `AppState` as `Arc<dyn JobStore>`.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// All open listings, newest first.
    async fn list_open_jobs(&self) -> Result<Vec<JobListing>>;
}

/// `job_listings` table in PostgreSQL.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn list_open_jobs(&self) -> Result<Vec<JobListing>> {
        let rows = sqlx::query_as::<_, JobListingRow>(
            r#"
            SELECT id, title, location, department, description_md, posted_at
            FROM job_listings
            ORDER BY posted_at DESC NULLS LAST, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(JobListing::from).collect())
    }
}

/// Distinct filter values offered to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub locations: Vec<String>,
    pub departments: Vec<String>,
}

/// Distinct non-blank locations and departments, in listing order.
pub fn filter_options(jobs: &[JobListing]) -> FilterOptions {
    let mut locations: Vec<String> = Vec::new();
    let mut departments: Vec<String> = Vec::new();

    for job in jobs {
        let location = job.location.trim();
        if !location.is_empty() && !locations.iter().any(|l| l == location) {
            locations.push(location.to_string());
        }
        let department = job.department.trim();
        if !department.is_empty() && !departments.iter().any(|d| d == department) {
            departments.push(department.to_string());
        }
    }

    FilterOptions {
        locations,
        departments,
    }
}
