use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::pdf::extract_text;
use crate::extraction::validation::{validate_text, ResumeValidation};
use crate::state::AppState;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

struct UploadedFile {
    original_name: String,
    content_type: String,
    data: Bytes,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_url: String,
    pub filename: String,
    pub photo_filename: Option<String>,
    pub message: &'static str,
    pub validation: ResumeValidation,
}

/// POST /api/upload
///
/// Files are checked and the résumé text validated in memory; nothing is
/// written to the uploads directory unless the upload is accepted.
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut resume = None;
    let mut photo = None;
    let mut total = 0_usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("File upload error: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("File upload error: {}", e.body_text())))?;

        total += data.len();
        if total > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation("File too large (max 10MB)".into()));
        }

        let file = UploadedFile {
            original_name,
            content_type,
            data,
        };
        match name.as_str() {
            "resume" => resume = Some(file),
            "photo" => photo = Some(file),
            _ => {}
        }
    }

    let resume = resume.ok_or_else(|| AppError::Validation("No file uploaded".into()))?;
    if !is_pdf(&resume) {
        return Err(AppError::Validation("Resume must be a PDF".into()));
    }
    if let Some(photo) = &photo {
        if !photo.content_type.starts_with("image/") {
            return Err(AppError::Validation("Headshot must be an image".into()));
        }
        if photo.data.len() > MAX_PHOTO_BYTES {
            return Err(AppError::Validation("Headshot too large (max 5MB)".into()));
        }
    }

    let text = extract_text(resume.data.to_vec()).await.map_err(|e| {
        warn!("Rejected upload {}: {e}", resume.original_name);
        AppError::Validation("Could not read text from this PDF".into())
    })?;
    let validation = validate_text(&text);
    if !validation.is_valid {
        let reason = validation
            .error
            .clone()
            .unwrap_or_else(|| "Invalid resume format".to_string());
        info!("Rejected upload {}: {reason}", resume.original_name);
        return Err(AppError::Validation(reason));
    }

    let uploads = &state.config.uploads_dir;
    tokio::fs::create_dir_all(uploads)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let filename = stored_name(&resume.original_name);
    tokio::fs::write(uploads.join(&filename), &resume.data)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let photo_filename = match photo {
        Some(photo) => {
            let name = stored_name(&photo.original_name);
            tokio::fs::write(uploads.join(&name), &photo.data)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            Some(name)
        }
        None => None,
    };

    info!(
        "Accepted upload {filename} ({} words, {} skills)",
        validation.word_count,
        validation.detected_skills.len()
    );
    Ok(Json(UploadResponse {
        success: true,
        file_url: format!("{}/uploads/{filename}", state.config.backend_url),
        filename,
        photo_filename,
        message: "Resume validated and uploaded successfully",
        validation,
    }))
}

fn is_pdf(file: &UploadedFile) -> bool {
    file.content_type == "application/pdf" || file.original_name.to_ascii_lowercase().ends_with(".pdf")
}

/// `<uuid>-<original>` with anything outside `[A-Za-z0-9._-]` replaced.
fn stored_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned = if cleaned.is_empty() { "upload" } else { cleaned };
    format!("{}-{cleaned}", Uuid::new_v4())
}
