//! ID-card issuance: evaluated after every department decision, fires once
//! per employee when the aggregated status reaches `approved`.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Contractor, Employee, IdCard, NewIdCard};
use crate::schema::{contractors, idcards};
use crate::state::AppState;
use crate::workflow::{employee_final_status, ApprovalStatus};

/// Everything the renderer needs to lay out one card.
#[derive(Debug, Clone)]
pub struct CardData {
    pub employee_name: String,
    pub address: String,
    pub date_of_birth: String,
    pub date_of_joining: String,
    pub contractor_name: String,
    pub department: String,
    pub company_name: String,
    pub company_address: String,
    pub issued_on: String,
    pub valid_till: String,
}

pub trait CardRenderer: Send + Sync + 'static {
    fn render(&self, card: &CardData) -> Result<Vec<u8>>;
}

pub fn compute_validity(issued_at: NaiveDateTime, validity_days: i64) -> NaiveDateTime {
    issued_at + Duration::days(validity_days)
}

/// Fires the `NOT_ISSUED -> ISSUED` transition if the employee is fully
/// approved and holds no card yet. Returns the card when one exists after
/// the call (freshly issued or already present), `None` while not eligible.
///
/// Render and upload happen before the card row is written and outside any
/// row lock, so a renderer or storage failure leaves the store in its
/// pre-trigger condition and the decision can simply be retried.
pub async fn issue_card_if_ready(
    state: &AppState,
    employee: &Employee,
) -> AppResult<Option<IdCard>> {
    if employee_final_status(employee) != ApprovalStatus::Approved {
        return Ok(None);
    }

    let mut conn = state.db()?;

    let existing: Option<IdCard> = idcards::table
        .filter(idcards::employee_id.eq(employee.id))
        .first(&mut conn)
        .optional()?;
    if let Some(card) = existing {
        return Ok(Some(card));
    }

    let contractor: Contractor = contractors::table
        .find(employee.contractor_id)
        .first(&mut conn)?;

    let issued_at = Utc::now().naive_utc();
    let valid_till = compute_validity(issued_at, state.config.idcard_validity_days);

    let card_data = CardData {
        employee_name: employee.full_name(),
        address: employee.address_present.clone().unwrap_or_default(),
        date_of_birth: employee
            .dob
            .map(|d| d.format("%d-%m-%Y").to_string())
            .unwrap_or_default(),
        date_of_joining: employee
            .hr_decided_at
            .unwrap_or(issued_at)
            .format("%d-%m-%Y")
            .to_string(),
        contractor_name: contractor.name.clone(),
        department: contractor.department.clone(),
        company_name: state.config.company_name.clone(),
        company_address: state.config.company_address.clone(),
        issued_on: issued_at.format("%d-%m-%Y").to_string(),
        valid_till: valid_till.format("%d-%m-%Y").to_string(),
    };

    let pdf_bytes = state
        .renderer
        .render(&card_data)
        .map_err(AppError::bad_gateway)?;

    let pdf_key = format!(
        "idcards/idcard_{}_{}.pdf",
        sanitize_for_key(&card_data.employee_name),
        employee.id
    );
    state
        .storage
        .put_object(&pdf_key, pdf_bytes, Some("application/pdf".to_string()))
        .await
        .map_err(AppError::bad_gateway)?;

    let new_card = NewIdCard {
        id: Uuid::new_v4(),
        employee_id: employee.id,
        pdf_key,
        issued_at,
        valid_till,
    };

    match diesel::insert_into(idcards::table)
        .values(&new_card)
        .execute(&mut conn)
    {
        Ok(_) => {}
        // A concurrent decision beat us to issuance; keep the winner's card.
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {}
        Err(err) => return Err(AppError::from(err)),
    }

    let card: IdCard = idcards::table
        .filter(idcards::employee_id.eq(employee.id))
        .first(&mut conn)?;

    tracing::info!(employee_id = %employee.id, card_id = %card.id, "id card issued");
    Ok(Some(card))
}

pub fn find_card(conn: &mut PgConnection, employee_id: Uuid) -> QueryResult<Option<IdCard>> {
    idcards::table
        .filter(idcards::employee_id.eq(employee_id))
        .first(conn)
        .optional()
}

fn sanitize_for_key(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Credit-card sized (85 x 54 mm) single-page PDF with the badge fields as
/// plain Helvetica text. Deliberately not a layout engine; anything fancier
/// belongs behind the [`CardRenderer`] seam.
pub struct BadgePdfRenderer;

const CARD_WIDTH_PT: f32 = 240.94;
const CARD_HEIGHT_PT: f32 = 153.07;

impl CardRenderer for BadgePdfRenderer {
    fn render(&self, card: &CardData) -> Result<Vec<u8>> {
        let lines: Vec<(String, f32)> = vec![
            (card.company_name.clone(), 10.0),
            (card.company_address.clone(), 6.0),
            (String::new(), 6.0),
            (format!("Name: {}", card.employee_name), 8.0),
            (format!("Address: {}", card.address), 7.0),
            (format!("DOB: {}", card.date_of_birth), 7.0),
            (format!("Joining: {}", card.date_of_joining), 7.0),
            (format!("Contractor: {}", card.contractor_name), 7.0),
            (format!("Department: {}", card.department), 7.0),
            (String::new(), 6.0),
            (format!("Issue: {}", card.issued_on), 6.0),
            (format!("Valid Till: {}", card.valid_till), 6.0),
        ];

        let mut content = String::new();
        let mut y = CARD_HEIGHT_PT - 16.0;
        for (text, size) in lines {
            if !text.is_empty() {
                let _ = write!(
                    content,
                    "BT /F1 {size} Tf 12 {y:.2} Td ({}) Tj ET\n",
                    escape_pdf_text(&text)
                );
            }
            y -= size + 3.0;
        }

        Ok(assemble_pdf(&content))
    }
}

fn escape_pdf_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            // Helvetica via the standard encoding only covers ASCII here.
            _ => escaped.push('?'),
        }
    }
    escaped
}

fn assemble_pdf(content: &str) -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {CARD_WIDTH_PT} {CARD_HEIGHT_PT}] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
    ];

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", index + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );

    out
}
