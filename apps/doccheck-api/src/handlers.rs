//! HTTP handlers for the doccheck API

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use shared_types::FileId;

use crate::error::ApiError;
use crate::models::{ModifyResponse, StatusResponse, UploadResponse};
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Upload a document, run the compliance analysis, return the report.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::InvalidRequest("no file selected".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("could not read upload: {e}")))?;
        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::InvalidRequest("no file provided".to_string()))?;

    let (file_id, compliance_report) = state.pipeline.process(&filename, data).await?;

    Ok(Json(UploadResponse {
        file_id,
        filename,
        compliance_report,
        message: "Document processed successfully",
    }))
}

/// Produce the corrected document for an analyzed session.
pub async fn modify(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<ModifyResponse>, ApiError> {
    let file_id = FileId::from(file_id);
    let doc = state.pipeline.modify(&file_id).await?;
    Ok(Json(ModifyResponse::new(file_id, doc)))
}

/// Download the corrected document as a plain-text attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<(StatusCode, [(String, String); 2], Vec<u8>), ApiError> {
    let file_id = FileId::from(file_id);
    let (filename, bytes) = state.pipeline.download(&file_id).await?;

    Ok((
        StatusCode::OK,
        [
            (
                "Content-Type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            ),
            (
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}

/// Report the processing stage for one session.
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let file_id = FileId::from(file_id);
    let view = state.pipeline.status(&file_id).await?;
    Ok(Json(view.into()))
}
