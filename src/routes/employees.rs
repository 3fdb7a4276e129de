use std::time::Duration;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedReviewer,
    error::{AppError, AppResult},
    idcard,
    models::{Contractor, DepartmentSignature, Employee},
    notify,
    schema::{contractors, department_signatures, employees},
    state::AppState,
    uploads,
    workflow::{self, Decision, Department, WorkflowError},
};

const HR_SIGNATURE_ROLE: &str = "HR";
const APPROVAL_SIGNATURES_PREFIX: &str = "approval_signatures";

fn parse_department(raw: &str) -> AppResult<Department> {
    raw.parse()
        .map_err(|_| AppError::bad_request(format!("unknown department: {raw}")))
}

#[derive(Serialize)]
pub struct PendingEmployee {
    pub id: Uuid,
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub photo_ref: Option<String>,
    pub submitted_at: NaiveDateTime,
    pub contractor_id: Uuid,
    pub contractor_name: String,
    pub contractor_department: String,
    pub po_number: String,
}

pub async fn pending_for_department(
    State(state): State<AppState>,
    reviewer: AuthenticatedReviewer,
    Path(department): Path<String>,
) -> AppResult<Json<Vec<PendingEmployee>>> {
    let department = parse_department(&department)?;
    if !reviewer.can_review(department) {
        return Err(AppError::forbidden(format!(
            "{} reviews are not available to role {}",
            department, reviewer.role
        )));
    }

    let mut conn = state.db()?;
    let pending = workflow::pending_for_department(&mut conn, department)?;

    let mut views = Vec::with_capacity(pending.len());
    for employee in pending {
        let contractor: Contractor = contractors::table
            .find(employee.contractor_id)
            .first(&mut conn)?;
        views.push(PendingEmployee {
            id: employee.id,
            name: employee.full_name(),
            dob: employee.dob,
            photo_ref: employee.photo_key.clone(),
            submitted_at: employee.submitted_at,
            contractor_id: contractor.id,
            contractor_name: contractor.name,
            contractor_department: contractor.department,
            po_number: contractor.po_number,
        });
    }

    Ok(Json(views))
}

#[derive(Serialize)]
pub struct DecisionResponse {
    pub employee_id: Uuid,
    pub department: String,
    pub final_status: String,
    pub idcard_issued: bool,
}

struct DecisionForm {
    decision: Decision,
    approved_by: String,
    reason: Option<String>,
    signature: Option<(String, Vec<u8>)>,
}

fn default_approver(department: Department) -> &'static str {
    match department {
        Department::Hr => "HR Department",
        Department::Medical => "Medical Officer",
        Department::Safety => "Safety Officer",
    }
}

fn default_reject_reason(department: Department) -> &'static str {
    match department {
        Department::Hr => "Documents incomplete",
        Department::Medical => "Medical fitness issues",
        Department::Safety => "PPE or safety requirements not met",
    }
}

async fn read_decision_form(
    department: Department,
    mut multipart: Multipart,
) -> AppResult<DecisionForm> {
    let mut decision: Option<Decision> = None;
    let mut approved_by: Option<String> = None;
    let mut reason: Option<String> = None;
    let mut signature: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        let msg = format!("invalid multipart data: {err}");
        error!(error = %err, "invalid multipart data");
        AppError::bad_request(msg)
    })? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("decision") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(format!("invalid decision: {err}")))?;
                decision = Some(value.trim().parse().map_err(|_| {
                    AppError::bad_request("decision must be 'approved' or 'rejected'")
                })?);
            }
            Some("approved_by") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(format!("invalid approved_by: {err}")))?;
                if !value.trim().is_empty() {
                    approved_by = Some(value.trim().to_string());
                }
            }
            Some("reason") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(format!("invalid reason: {err}")))?;
                // Stored verbatim; status lookup must return the reason
                // exactly as the reviewer wrote it.
                if !value.trim().is_empty() {
                    reason = Some(value);
                }
            }
            Some("signature") => {
                let file_name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| AppError::bad_request("signature filename is required"))?;
                if !uploads::allowed_file(&file_name) {
                    return Err(AppError::bad_request(
                        "signature must be a png, jpg, jpeg or pdf file",
                    ));
                }
                let data = field.bytes().await.map_err(|err| {
                    AppError::bad_request(format!("failed to read signature bytes: {err}"))
                })?;
                if !data.is_empty() {
                    signature = Some((file_name, data.to_vec()));
                }
            }
            _ => {}
        }
    }

    let decision = decision.ok_or_else(|| AppError::bad_request("decision field is required"))?;

    Ok(DecisionForm {
        decision,
        approved_by: approved_by.unwrap_or_else(|| default_approver(department).to_string()),
        reason,
        signature,
    })
}

/// Records one department's decision and evaluates the ID-card trigger.
/// The trigger runs after every decision, not only Safety's, because
/// departments may complete in any order.
pub async fn decide(
    State(state): State<AppState>,
    reviewer: AuthenticatedReviewer,
    Path((employee_id, department)): Path<(Uuid, String)>,
    multipart: Multipart,
) -> AppResult<Json<DecisionResponse>> {
    let department = parse_department(&department)?;
    if !reviewer.can_review(department) {
        return Err(AppError::forbidden(format!(
            "{} reviews are not available to role {}",
            department, reviewer.role
        )));
    }

    let form = read_decision_form(department, multipart).await?;

    // Resolve the signature reference before touching the employee record:
    // the blob write happens outside any row lock and a failure leaves the
    // decision unrecorded.
    let signature_key: Option<String> = match (&form.signature, department, form.decision) {
        (Some((file_name, bytes)), _, _) => Some(
            uploads::store_upload(
                state.storage.as_ref(),
                APPROVAL_SIGNATURES_PREFIX,
                file_name,
                bytes.clone(),
            )
            .await
            .map_err(AppError::bad_gateway)?,
        ),
        (None, Department::Hr, Decision::Approved) => {
            let mut conn = state.db()?;
            let standing: Option<DepartmentSignature> = department_signatures::table
                .filter(department_signatures::role.eq(HR_SIGNATURE_ROLE))
                .first(&mut conn)
                .optional()?;
            Some(
                standing
                    .ok_or_else(|| {
                        AppError::bad_request(
                            "HR signature not configured; upload the HR signature first",
                        )
                    })?
                    .file_key,
            )
        }
        (None, Department::Hr, Decision::Rejected) => {
            let mut conn = state.db()?;
            department_signatures::table
                .filter(department_signatures::role.eq(HR_SIGNATURE_ROLE))
                .first::<DepartmentSignature>(&mut conn)
                .optional()?
                .map(|s| s.file_key)
        }
        (None, _, _) => None,
    };

    let reason = if form.decision == Decision::Rejected {
        Some(
            form.reason
                .unwrap_or_else(|| default_reject_reason(department).to_string()),
        )
    } else {
        None
    };

    let mut conn = state.db()?;
    let outcome = workflow::record_decision(
        &mut conn,
        employee_id,
        department,
        form.decision,
        &form.approved_by,
        signature_key.as_deref(),
        reason.as_deref(),
    )
    .map_err(|err| match err {
        WorkflowError::EmployeeNotFound => AppError::not_found(),
        WorkflowError::SignatureRequired(dept) => {
            AppError::bad_request(format!("{dept} approval requires a signature"))
        }
        WorkflowError::Database(db_err) => AppError::from(db_err),
    })?;
    drop(conn);

    info!(
        employee_id = %employee_id,
        department = department.as_str(),
        decision = form.decision.status().as_str(),
        final_status = outcome.final_status.as_str(),
        "department decision recorded"
    );

    let card = idcard::issue_card_if_ready(&state, &outcome.employee).await?;

    let contractor_email: Option<String> = {
        let mut conn = state.db()?;
        contractors::table
            .find(outcome.employee.contractor_id)
            .first::<Contractor>(&mut conn)
            .optional()?
            .and_then(|c| c.email)
    };
    if let Some(email) = contractor_email {
        let message = notify::decision_notification_email(
            &email,
            &outcome.employee.full_name(),
            department,
            form.decision.status(),
            &state.config.company_name,
        );
        notify::spawn_send(state.notifier.clone(), message);
    }

    Ok(Json(DecisionResponse {
        employee_id,
        department: department.as_str().to_string(),
        final_status: outcome.final_status.as_str().to_string(),
        idcard_issued: card.is_some(),
    }))
}

#[derive(Serialize)]
pub struct IdCardResponse {
    pub issued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_till: Option<NaiveDateTime>,
}

pub async fn get_idcard(
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<IdCardResponse>> {
    let mut conn = state.db()?;

    let _employee: Employee = employees::table
        .find(employee_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let Some(card) = idcard::find_card(&mut conn, employee_id)? else {
        return Ok(Json(IdCardResponse {
            issued: false,
            url: None,
            issued_at: None,
            valid_till: None,
        }));
    };
    drop(conn);

    let expires_in = Duration::from_secs(state.config.download_url_expiry_minutes * 60);
    let url = state
        .storage
        .presign_get_object(&card.pdf_key, expires_in)
        .await
        .map_err(AppError::bad_gateway)?;

    Ok(Json(IdCardResponse {
        issued: true,
        url: Some(url),
        issued_at: Some(card.issued_at),
        valid_till: Some(card.valid_till),
    }))
}
