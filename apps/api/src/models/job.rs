use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An open role as stored by the listings sync. Descriptions are already
/// cleaned to plain text by the time they land here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobListingRow {
    pub id: String,
    pub title: String,
    pub location: Option<String>,
    pub department: Option<String>,
    pub description_md: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// The view of a listing the chat pipeline works with. Immutable for the
/// duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    pub id: String,
    pub title: String,
    pub location: String,
    pub department: String,
    pub cleaned_description: String,
}

impl From<JobListingRow> for JobListing {
    fn from(row: JobListingRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            location: row.location.unwrap_or_default(),
            department: row.department.unwrap_or_default(),
            cleaned_description: row.description_md.unwrap_or_default(),
        }
    }
}
