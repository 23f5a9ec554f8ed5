use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

/// GET /download/:token
pub async fn handle_download(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let retrieval = state.downloads.retrieve(&token).await?;
    let bytes = tokio::fs::read(&retrieval.path)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    info!(
        "Serving archive for order {} ({}/{})",
        retrieval.link.order_id,
        retrieval.link.downloads,
        crate::downloads::DOWNLOAD_LIMIT
    );

    let disposition = content_disposition(&retrieval.filename);
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(bytes),
    )
        .into_response())
}

fn content_disposition(filename: &str) -> HeaderValue {
    let safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && *c != '"' && *c != '\\' || *c == ' ')
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_quotes_filename() {
        let value = content_disposition("Jane_Doe_jane--o1.zip");
        assert_eq!(value, "attachment; filename=\"Jane_Doe_jane--o1.zip\"");
    }

    #[test]
    fn test_disposition_drops_unsafe_characters() {
        let value = content_disposition("Zoë \"x\".zip");
        assert_eq!(value, "attachment; filename=\"Zo x.zip\"");
    }
}
