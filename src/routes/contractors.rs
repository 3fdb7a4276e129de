use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    idcard,
    models::{Contractor, Employee, HodSignature, NewContractor, NewEmployee},
    notify,
    schema::{contractors, employees, hod_signatures},
    state::AppState,
    token,
    workflow::ApprovalStatus,
};

#[derive(Deserialize)]
pub struct SubmitContractorRequest {
    pub name: String,
    pub po_number: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub department: String,
    pub job_description: Option<String>,
}

#[derive(Serialize)]
pub struct SubmitContractorResponse {
    pub contractor_id: Uuid,
    pub access_token: String,
}

pub async fn submit_contractor(
    State(state): State<AppState>,
    Json(payload): Json<SubmitContractorRequest>,
) -> AppResult<(StatusCode, Json<SubmitContractorResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("contractor name is required"));
    }
    if payload.po_number.trim().is_empty() {
        return Err(AppError::bad_request("PO number is required"));
    }
    let department = payload.department.trim();
    if department.is_empty() {
        return Err(AppError::bad_request("department is required"));
    }

    let mut conn = state.db()?;

    // The contractor form is counter-signed with the department HOD's
    // standing signature; without one on file the submission cannot proceed.
    let hod: HodSignature = hod_signatures::table
        .filter(hod_signatures::department.eq(department))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| {
            AppError::bad_request(format!(
                "no HOD signature on file for department {department}"
            ))
        })?;

    let access_token =
        token::issue_unique_token(&mut conn).map_err(|err| AppError::internal(err))?;

    let new_contractor = NewContractor {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        po_number: payload.po_number.trim().to_string(),
        email: payload.email,
        mobile: payload.mobile,
        department: department.to_string(),
        job_description: payload.job_description,
        hod_name: hod.hod_name,
        hod_signature_key: hod.file_key,
        status: "pending".to_string(),
        access_token: access_token.clone(),
    };

    diesel::insert_into(contractors::table)
        .values(&new_contractor)
        .execute(&mut conn)?;

    info!(contractor_id = %new_contractor.id, department, "contractor submitted");

    Ok((
        StatusCode::CREATED,
        Json(SubmitContractorResponse {
            contractor_id: new_contractor.id,
            access_token,
        }),
    ))
}

#[derive(Deserialize)]
pub struct EmployeeEntry {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub surname: String,
    pub dob: Option<NaiveDate>,
    pub aadhar: Option<String>,
    pub mobile: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_mobile: Option<String>,
    pub address_present: Option<String>,
    pub address_permanent: Option<String>,
    pub photo_ref: Option<String>,
    pub signature_ref: Option<String>,
}

#[derive(Deserialize)]
pub struct SubmitEmployeesRequest {
    pub access_token: String,
    pub employees: Vec<EmployeeEntry>,
}

#[derive(Serialize)]
pub struct SubmitEmployeesResponse {
    pub employee_ids: Vec<Uuid>,
}

/// Batch creation is best-effort: entries are persisted one by one and a
/// mid-batch failure leaves the earlier employees in place. The error names
/// the failing entry so the caller can resubmit only the remainder.
pub async fn submit_employees(
    State(state): State<AppState>,
    Path(contractor_id): Path<Uuid>,
    Json(payload): Json<SubmitEmployeesRequest>,
) -> AppResult<(StatusCode, Json<SubmitEmployeesResponse>)> {
    if payload.employees.is_empty() {
        return Err(AppError::bad_request("at least one employee is required"));
    }

    let mut conn = state.db()?;

    let contractor: Contractor = contractors::table
        .find(contractor_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    if contractor.access_token != payload.access_token {
        return Err(AppError::unauthorized());
    }

    let mut employee_ids = Vec::with_capacity(payload.employees.len());
    for (index, entry) in payload.employees.into_iter().enumerate() {
        if entry.first_name.trim().is_empty() || entry.surname.trim().is_empty() {
            return Err(AppError::bad_request(format!(
                "employee {index}: first name and surname are required"
            )));
        }

        // Photo/signature references come from the public file intake and
        // must point at an object that was actually uploaded.
        for (kind, reference) in [
            ("photo", entry.photo_ref.as_deref()),
            ("signature", entry.signature_ref.as_deref()),
        ] {
            if let Some(reference) = reference {
                let known = state
                    .storage
                    .object_exists(reference)
                    .await
                    .map_err(AppError::bad_gateway)?;
                if !known {
                    return Err(AppError::bad_request(format!(
                        "employee {index}: unknown {kind} reference"
                    )));
                }
            }
        }

        let new_employee = NewEmployee {
            id: Uuid::new_v4(),
            contractor_id,
            first_name: entry.first_name.trim().to_string(),
            middle_name: entry.middle_name,
            surname: entry.surname.trim().to_string(),
            dob: entry.dob,
            aadhar: entry.aadhar,
            mobile: entry.mobile,
            emergency_contact: entry.emergency_contact,
            emergency_mobile: entry.emergency_mobile,
            address_present: entry.address_present,
            address_permanent: entry.address_permanent,
            photo_key: entry.photo_ref,
            signature_key: entry.signature_ref,
            final_status: ApprovalStatus::Pending.as_str().to_string(),
            hr_status: ApprovalStatus::Pending.as_str().to_string(),
            medical_status: ApprovalStatus::Pending.as_str().to_string(),
            safety_status: ApprovalStatus::Pending.as_str().to_string(),
        };

        diesel::insert_into(employees::table)
            .values(&new_employee)
            .execute(&mut conn)
            .map_err(|err| {
                AppError::internal(format!("employee {index}: could not be saved: {err}"))
            })?;

        employee_ids.push(new_employee.id);
    }

    info!(
        contractor_id = %contractor_id,
        count = employee_ids.len(),
        "employee batch submitted"
    );

    if let Some(email) = contractor.email.as_deref() {
        let message = notify::contractor_credentials_email(
            email,
            &contractor.name,
            &contractor.id.to_string(),
            &contractor.access_token,
            &state.config.status_page_url,
            &state.config.company_name,
        );
        notify::spawn_send(state.notifier.clone(), message);
    }

    Ok((
        StatusCode::CREATED,
        Json(SubmitEmployeesResponse { employee_ids }),
    ))
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub token: Option<String>,
    pub contractor_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct DepartmentStatusView {
    pub status: String,
    pub approved_by: Option<String>,
    pub decided_at: Option<NaiveDateTime>,
}

#[derive(Serialize)]
pub struct EmployeeStatusView {
    pub id: Uuid,
    pub name: String,
    pub hr: DepartmentStatusView,
    pub medical: DepartmentStatusView,
    pub safety: DepartmentStatusView,
    pub final_status: String,
    pub reject_reason: Option<String>,
    pub has_idcard: bool,
}

#[derive(Serialize)]
pub struct ContractorStatusResponse {
    pub contractor_id: Uuid,
    pub contractor_name: String,
    pub po_number: String,
    pub department: String,
    pub submitted_at: NaiveDateTime,
    pub employees: Vec<EmployeeStatusView>,
}

/// Unauthenticated status lookup, authorized by the opaque access token.
/// A token that does not resolve, or disagrees with the supplied
/// contractor id, is rejected without revealing which part was wrong.
pub async fn contractor_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<ContractorStatusResponse>> {
    let token = query
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(AppError::unauthorized)?;

    let mut conn = state.db()?;

    let contractor: Contractor = match query.contractor_id {
        Some(contractor_id) => contractors::table
            .find(contractor_id)
            .first(&mut conn)
            .optional()?
            .filter(|c: &Contractor| c.access_token == token)
            .ok_or_else(AppError::unauthorized)?,
        None => contractors::table
            .filter(contractors::access_token.eq(token))
            .first(&mut conn)
            .optional()?
            .ok_or_else(AppError::unauthorized)?,
    };

    let employee_rows: Vec<Employee> = employees::table
        .filter(employees::contractor_id.eq(contractor.id))
        .order(employees::submitted_at.asc())
        .load(&mut conn)?;

    let mut views = Vec::with_capacity(employee_rows.len());
    for employee in employee_rows {
        let has_idcard = idcard::find_card(&mut conn, employee.id)?.is_some();
        views.push(EmployeeStatusView {
            id: employee.id,
            name: employee.full_name(),
            hr: DepartmentStatusView {
                status: employee.hr_status.clone(),
                approved_by: employee.hr_approved_by.clone(),
                decided_at: employee.hr_decided_at,
            },
            medical: DepartmentStatusView {
                status: employee.medical_status.clone(),
                approved_by: employee.medical_approved_by.clone(),
                decided_at: employee.medical_decided_at,
            },
            safety: DepartmentStatusView {
                status: employee.safety_status.clone(),
                approved_by: employee.safety_approved_by.clone(),
                decided_at: employee.safety_decided_at,
            },
            final_status: employee.final_status.clone(),
            reject_reason: employee.reject_reason.clone(),
            has_idcard,
        });
    }

    Ok(Json(ContractorStatusResponse {
        contractor_id: contractor.id,
        contractor_name: contractor.name,
        po_number: contractor.po_number,
        department: contractor.department,
        submitted_at: contractor.submitted_at,
        employees: views,
    }))
}
