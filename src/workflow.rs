//! Approval workflow core: the three-department review state machine.
//!
//! Every decision write goes through [`record_decision`], which holds a row
//! lock on the employee for the duration of the sub-record write and the
//! final-status recomputation so that concurrent reviews of the same
//! employee cannot interleave.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Employee;
use crate::schema::employees;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Department {
    Hr,
    Medical,
    Safety,
}

impl Department {
    pub const ALL: [Department; 3] = [Department::Hr, Department::Medical, Department::Safety];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Hr => "hr",
            Department::Medical => "medical",
            Department::Safety => "safety",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Department::Hr => "HR",
            Department::Medical => "Medical",
            Department::Safety => "Safety",
        }
    }

    /// Medical and Safety reviewers sign each approval themselves; HR
    /// approvals use the standing HR signature resolved by the caller.
    pub fn requires_signature_upload(&self) -> bool {
        matches!(self, Department::Medical | Department::Safety)
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Department {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "hr" => Ok(Department::Hr),
            "medical" => Ok(Department::Medical),
            "safety" => Ok(Department::Safety),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn status(&self) -> ApprovalStatus {
        match self {
            Decision::Approved => ApprovalStatus::Approved,
            Decision::Rejected => ApprovalStatus::Rejected,
        }
    }
}

impl FromStr for Decision {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "approved" => Ok(Decision::Approved),
            "rejected" => Ok(Decision::Rejected),
            _ => Err(()),
        }
    }
}

/// Derives the overall status from the three department sub-statuses.
/// Rejection dominates: one rejection anywhere forces `rejected` no matter
/// what the other departments say.
pub fn aggregate_final_status(
    hr: ApprovalStatus,
    medical: ApprovalStatus,
    safety: ApprovalStatus,
) -> ApprovalStatus {
    let trio = [hr, medical, safety];
    if trio.iter().any(|s| *s == ApprovalStatus::Rejected) {
        ApprovalStatus::Rejected
    } else if trio.iter().all(|s| *s == ApprovalStatus::Approved) {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Pending
    }
}

pub fn employee_final_status(employee: &Employee) -> ApprovalStatus {
    aggregate_final_status(
        parse_status(&employee.hr_status),
        parse_status(&employee.medical_status),
        parse_status(&employee.safety_status),
    )
}

fn parse_status(raw: &str) -> ApprovalStatus {
    ApprovalStatus::from_str(raw).unwrap_or(ApprovalStatus::Pending)
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("employee not found")]
    EmployeeNotFound,
    #[error("{0} approval requires a signature")]
    SignatureRequired(Department),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug)]
pub struct DecisionOutcome {
    pub employee: Employee,
    pub final_status: ApprovalStatus,
}

/// Writes one department's decision and recomputes the employee's final
/// status in a single transaction. A re-decision overwrites the previous
/// sub-record; an existing signature is kept when no new one is supplied.
pub fn record_decision(
    conn: &mut PgConnection,
    employee_id: Uuid,
    department: Department,
    decision: Decision,
    approved_by: &str,
    signature_key: Option<&str>,
    reason: Option<&str>,
) -> WorkflowResult<DecisionOutcome> {
    if decision == Decision::Approved
        && department.requires_signature_upload()
        && signature_key.is_none()
    {
        return Err(WorkflowError::SignatureRequired(department));
    }

    conn.transaction(|conn| {
        let employee: Employee = employees::table
            .find(employee_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(WorkflowError::EmployeeNotFound)?;

        let now = Utc::now().naive_utc();
        let status = decision.status();

        let mut hr = parse_status(&employee.hr_status);
        let mut medical = parse_status(&employee.medical_status);
        let mut safety = parse_status(&employee.safety_status);
        match department {
            Department::Hr => hr = status,
            Department::Medical => medical = status,
            Department::Safety => safety = status,
        }
        let final_status = aggregate_final_status(hr, medical, safety);

        // The reason tracks the latest rejection; once no rejection remains
        // in the trio, a stale reason would contradict the final status.
        let reject_reason: Option<String> = if final_status == ApprovalStatus::Rejected {
            if decision == Decision::Rejected {
                reason
                    .map(str::to_string)
                    .or_else(|| employee.reject_reason.clone())
            } else {
                employee.reject_reason.clone()
            }
        } else {
            None
        };

        let approved_by = approved_by.to_string();
        match department {
            Department::Hr => {
                let signature = signature_key
                    .map(str::to_string)
                    .or_else(|| employee.hr_signature_key.clone());
                diesel::update(employees::table.find(employee_id))
                    .set((
                        employees::hr_status.eq(status.as_str()),
                        employees::hr_approved_by.eq(Some(approved_by)),
                        employees::hr_decided_at.eq(Some(now)),
                        employees::hr_signature_key.eq(signature),
                        employees::final_status.eq(final_status.as_str()),
                        employees::reject_reason.eq(reject_reason),
                    ))
                    .execute(conn)?;
            }
            Department::Medical => {
                let signature = signature_key
                    .map(str::to_string)
                    .or_else(|| employee.medical_signature_key.clone());
                diesel::update(employees::table.find(employee_id))
                    .set((
                        employees::medical_status.eq(status.as_str()),
                        employees::medical_approved_by.eq(Some(approved_by)),
                        employees::medical_decided_at.eq(Some(now)),
                        employees::medical_signature_key.eq(signature),
                        employees::final_status.eq(final_status.as_str()),
                        employees::reject_reason.eq(reject_reason),
                    ))
                    .execute(conn)?;
            }
            Department::Safety => {
                let signature = signature_key
                    .map(str::to_string)
                    .or_else(|| employee.safety_signature_key.clone());
                diesel::update(employees::table.find(employee_id))
                    .set((
                        employees::safety_status.eq(status.as_str()),
                        employees::safety_approved_by.eq(Some(approved_by)),
                        employees::safety_decided_at.eq(Some(now)),
                        employees::safety_signature_key.eq(signature),
                        employees::final_status.eq(final_status.as_str()),
                        employees::reject_reason.eq(reject_reason),
                    ))
                    .execute(conn)?;
            }
        }

        let refreshed: Employee = employees::table.find(employee_id).first(conn)?;
        Ok(DecisionOutcome {
            employee: refreshed,
            final_status,
        })
    })
}

/// Employees whose sub-status for `department` is still `pending`.
/// Visibility is deliberately independent of upstream stages: any dashboard
/// sees its own pending queue even before earlier departments have acted.
pub fn pending_for_department(
    conn: &mut PgConnection,
    department: Department,
) -> QueryResult<Vec<Employee>> {
    let pending = ApprovalStatus::Pending.as_str();
    match department {
        Department::Hr => employees::table
            .filter(employees::hr_status.eq(pending))
            .order(employees::submitted_at.asc())
            .load(conn),
        Department::Medical => employees::table
            .filter(employees::medical_status.eq(pending))
            .order(employees::submitted_at.asc())
            .load(conn),
        Department::Safety => employees::table
            .filter(employees::safety_status.eq(pending))
            .order(employees::submitted_at.asc())
            .load(conn),
    }
}
