//! Public file intake for the employee form: photos and personal
//! signatures are uploaded ahead of the batch submission and referenced
//! by key in the employee entries.

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    uploads,
};

const PHOTO_PREFIX: &str = "employee_photos";
const SIGNATURE_PREFIX: &str = "employee_signatures";

#[derive(Deserialize)]
pub struct UploadQuery {
    pub kind: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub reference: String,
}

pub async fn upload_file(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let prefix = match query.kind.as_str() {
        "photo" => PHOTO_PREFIX,
        "signature" => SIGNATURE_PREFIX,
        other => {
            return Err(AppError::bad_request(format!(
                "kind must be 'photo' or 'signature', got '{other}'"
            )))
        }
    };

    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart data: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(|n| n.to_string())
            .ok_or_else(|| AppError::bad_request("file name is required"))?;
        if !uploads::allowed_file(&file_name) {
            return Err(AppError::bad_request(
                "file must be a png, jpg, jpeg or pdf",
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("failed to read file bytes: {err}")))?
            .to_vec();
        if bytes.is_empty() {
            return Err(AppError::bad_request("file is empty"));
        }
        upload = Some((file_name, bytes));
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::bad_request("file field is required"))?;

    let reference = uploads::store_upload(state.storage.as_ref(), prefix, &file_name, bytes)
        .await
        .map_err(AppError::bad_gateway)?;

    info!(kind = %query.kind, reference, "file uploaded");

    Ok((StatusCode::CREATED, Json(UploadResponse { reference })))
}
