use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = contractors)]
pub struct Contractor {
    pub id: Uuid,
    pub name: String,
    pub po_number: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub department: String,
    pub job_description: Option<String>,
    pub hod_name: String,
    pub hod_signature_key: String,
    pub status: String,
    pub access_token: String,
    pub submitted_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contractors)]
pub struct NewContractor {
    pub id: Uuid,
    pub name: String,
    pub po_number: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub department: String,
    pub job_description: Option<String>,
    pub hod_name: String,
    pub hod_signature_key: String,
    pub status: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = employees)]
#[diesel(belongs_to(Contractor))]
pub struct Employee {
    pub id: Uuid,
    pub contractor_id: Uuid,
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
    pub photo_key: Option<String>,
    pub signature_key: Option<String>,
    pub submitted_at: NaiveDateTime,
    pub final_status: String,
    pub reject_reason: Option<String>,
    pub hr_status: String,
    pub hr_approved_by: Option<String>,
    pub hr_decided_at: Option<NaiveDateTime>,
    pub hr_signature_key: Option<String>,
    pub medical_status: String,
    pub medical_approved_by: Option<String>,
    pub medical_decided_at: Option<NaiveDateTime>,
    pub medical_signature_key: Option<String>,
    pub safety_status: String,
    pub safety_approved_by: Option<String>,
    pub safety_decided_at: Option<NaiveDateTime>,
    pub safety_signature_key: Option<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        let mut parts = vec![self.first_name.as_str()];
        if let Some(middle) = self.middle_name.as_deref() {
            if !middle.is_empty() {
                parts.push(middle);
            }
        }
        parts.push(self.surname.as_str());
        parts.join(" ")
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = employees)]
pub struct NewEmployee {
    pub id: Uuid,
    pub contractor_id: Uuid,
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
    pub photo_key: Option<String>,
    pub signature_key: Option<String>,
    pub final_status: String,
    pub hr_status: String,
    pub medical_status: String,
    pub safety_status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = department_signatures)]
pub struct DepartmentSignature {
    pub id: Uuid,
    pub role: String,
    pub file_key: String,
    pub uploaded_by: String,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = department_signatures)]
pub struct NewDepartmentSignature {
    pub id: Uuid,
    pub role: String,
    pub file_key: String,
    pub uploaded_by: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = hod_signatures)]
pub struct HodSignature {
    pub id: Uuid,
    pub department: String,
    pub hod_name: String,
    pub file_key: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = hod_signatures)]
pub struct NewHodSignature {
    pub id: Uuid,
    pub department: String,
    pub hod_name: String,
    pub file_key: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = idcards)]
#[diesel(belongs_to(Employee))]
pub struct IdCard {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub pdf_key: String,
    pub issued_at: NaiveDateTime,
    pub valid_till: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = idcards)]
pub struct NewIdCard {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub pdf_key: String,
    pub issued_at: NaiveDateTime,
    pub valid_till: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = reviewers)]
pub struct Reviewer {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reviewers)]
pub struct NewReviewer {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}
