//! Standing signature management. Department signatures (HR's stamp used on
//! every HR approval) and HOD counter-signatures are uploaded once by an
//! admin and referenced by the workflow afterwards.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedReviewer,
    error::{AppError, AppResult},
    models::{HodSignature, NewDepartmentSignature, NewHodSignature},
    schema::{department_signatures, hod_signatures},
    state::AppState,
    uploads,
};

const DEPARTMENT_SIGNATURES_PREFIX: &str = "department_signatures";
const HOD_SIGNATURES_PREFIX: &str = "hod_signatures";

struct UploadedFile {
    file_name: String,
    bytes: Vec<u8>,
}

async fn read_signature_field(
    field: axum::extract::multipart::Field<'_>,
) -> AppResult<UploadedFile> {
    let file_name = field
        .file_name()
        .map(|n| n.to_string())
        .ok_or_else(|| AppError::bad_request("signature filename is required"))?;
    if !uploads::allowed_file(&file_name) {
        return Err(AppError::bad_request(
            "signature must be a png, jpg, jpeg or pdf file",
        ));
    }
    let bytes = field
        .bytes()
        .await
        .map_err(|err| AppError::bad_request(format!("failed to read signature bytes: {err}")))?
        .to_vec();
    if bytes.is_empty() {
        return Err(AppError::bad_request("signature file is empty"));
    }
    Ok(UploadedFile { file_name, bytes })
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid {name}: {err}")))
        .map(|v| v.trim().to_string())
}

#[derive(Serialize)]
pub struct SignatureUpserted {
    pub reference: String,
}

pub async fn put_department_signature(
    State(state): State<AppState>,
    reviewer: AuthenticatedReviewer,
    mut multipart: Multipart,
) -> AppResult<Json<SignatureUpserted>> {
    if !reviewer.is_admin() {
        return Err(AppError::forbidden(
            "only admins may manage standing signatures",
        ));
    }

    let mut role: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart data: {err}")))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("role") => {
                let value = read_text_field(field, "role").await?;
                if !value.is_empty() {
                    role = Some(value);
                }
            }
            Some("file") => file = Some(read_signature_field(field).await?),
            _ => {}
        }
    }

    let role = role.ok_or_else(|| AppError::bad_request("role field is required"))?;
    let file = file.ok_or_else(|| AppError::bad_request("file field is required"))?;

    let file_key = uploads::store_upload(
        state.storage.as_ref(),
        DEPARTMENT_SIGNATURES_PREFIX,
        &file.file_name,
        file.bytes,
    )
    .await
    .map_err(AppError::bad_gateway)?;

    let mut conn = state.db()?;
    let record = NewDepartmentSignature {
        id: Uuid::new_v4(),
        role: role.clone(),
        file_key: file_key.clone(),
        uploaded_by: reviewer.username.clone(),
    };
    diesel::insert_into(department_signatures::table)
        .values(&record)
        .on_conflict(department_signatures::role)
        .do_update()
        .set((
            department_signatures::file_key.eq(&file_key),
            department_signatures::uploaded_by.eq(&reviewer.username),
            department_signatures::uploaded_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    info!(role, uploaded_by = %reviewer.username, "department signature updated");

    Ok(Json(SignatureUpserted {
        reference: file_key,
    }))
}

pub async fn put_hod_signature(
    State(state): State<AppState>,
    reviewer: AuthenticatedReviewer,
    mut multipart: Multipart,
) -> AppResult<Json<SignatureUpserted>> {
    if !reviewer.is_admin() {
        return Err(AppError::forbidden(
            "only admins may manage standing signatures",
        ));
    }

    let mut department: Option<String> = None;
    let mut hod_name: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart data: {err}")))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("department") => {
                let value = read_text_field(field, "department").await?;
                if !value.is_empty() {
                    department = Some(value);
                }
            }
            Some("hod_name") => {
                let value = read_text_field(field, "hod_name").await?;
                if !value.is_empty() {
                    hod_name = Some(value);
                }
            }
            Some("file") => file = Some(read_signature_field(field).await?),
            _ => {}
        }
    }

    let department =
        department.ok_or_else(|| AppError::bad_request("department field is required"))?;
    let hod_name = hod_name.ok_or_else(|| AppError::bad_request("hod_name field is required"))?;
    let file = file.ok_or_else(|| AppError::bad_request("file field is required"))?;

    let file_key = uploads::store_upload(
        state.storage.as_ref(),
        HOD_SIGNATURES_PREFIX,
        &file.file_name,
        file.bytes,
    )
    .await
    .map_err(AppError::bad_gateway)?;

    let mut conn = state.db()?;
    let record = NewHodSignature {
        id: Uuid::new_v4(),
        department: department.clone(),
        hod_name: hod_name.clone(),
        file_key: file_key.clone(),
    };
    diesel::insert_into(hod_signatures::table)
        .values(&record)
        .on_conflict(hod_signatures::department)
        .do_update()
        .set((
            hod_signatures::hod_name.eq(&hod_name),
            hod_signatures::file_key.eq(&file_key),
            hod_signatures::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    info!(department, hod_name, "HOD signature updated");

    Ok(Json(SignatureUpserted {
        reference: file_key,
    }))
}

#[derive(Serialize)]
pub struct HodSignatureView {
    pub department: String,
    pub hod_name: String,
}

/// Public lookup used by the contractor form to show which HOD will
/// counter-sign a submission for the given department.
pub async fn get_hod_signature(
    State(state): State<AppState>,
    Path(department): Path<String>,
) -> AppResult<Json<HodSignatureView>> {
    let mut conn = state.db()?;

    let hod: HodSignature = hod_signatures::table
        .filter(hod_signatures::department.eq(department.trim()))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(HodSignatureView {
        department: hod.department,
        hod_name: hod.hod_name,
    }))
}
