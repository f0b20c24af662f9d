use axum::{extract::Multipart, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::resume::extract_pdf_text;

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub text: String,
}

/// POST /api/v1/resume/extract
///
/// Multipart upload with a single `file` field holding a PDF. Returns the
/// extracted plain text for the client to send along with chat turns.
pub async fn handle_extract(mut multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        info!("Extracting resume text from {} byte upload", bytes.len());

        let text = extract_pdf_text(bytes).await?;
        return Ok(Json(ExtractResponse { text }));
    }

    Err(AppError::Validation("Missing 'file' field".to_string()))
}
