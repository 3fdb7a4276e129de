mod common;

use anyhow::{ensure, Result};
use axum::http::{Method, StatusCode};
use common::{acquire_db_lock, body_to_json, TestApp};
use serde_json::json;
use uuid::Uuid;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-signature-bytes";

async fn seed(app: &TestApp) -> Result<(String, Uuid, String)> {
    app.insert_reviewer("admin", "admin@123", "admin").await?;
    let admin_token = app.login_token("admin", "admin@123").await?;

    let response = app
        .send_multipart(
            Method::PUT,
            "/api/signatures/hod",
            &[("department", "Maintenance"), ("hod_name", "K Iyer")],
            &[("file", "hod.png", "image/png", PNG)],
            Some(&admin_token),
        )
        .await?;
    ensure!(response.status() == StatusCode::OK, "hod upload failed");

    let response = app
        .send_multipart(
            Method::PUT,
            "/api/signatures/departments",
            &[("role", "HR")],
            &[("file", "hr.png", "image/png", PNG)],
            Some(&admin_token),
        )
        .await?;
    ensure!(response.status() == StatusCode::OK, "hr upload failed");

    let response = app
        .post_json(
            "/api/contractors",
            &json!({
                "name": "Breeze Electricals",
                "po_number": "PO-2024-044",
                "department": "Maintenance"
            }),
            None,
        )
        .await?;
    ensure!(response.status() == StatusCode::CREATED, "contractor failed");
    let body = body_to_json(response.into_body()).await?;
    let contractor_id: Uuid = serde_json::from_value(body["contractor_id"].clone())?;
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let response = app
        .post_json(
            &format!("/api/contractors/{contractor_id}/employees"),
            &json!({
                "access_token": access_token,
                "employees": [{ "first_name": "Sita", "surname": "Patil" }]
            }),
            None,
        )
        .await?;
    ensure!(response.status() == StatusCode::CREATED, "employees failed");
    let body = body_to_json(response.into_body()).await?;
    let employee_id: Uuid = serde_json::from_value(body["employee_ids"][0].clone())?;

    Ok((admin_token, employee_id, access_token))
}

async fn decide(
    app: &TestApp,
    token: &str,
    employee_id: Uuid,
    department: &str,
    decision: &str,
    reason: Option<&str>,
    with_signature: bool,
) -> Result<hyper::Response<axum::body::Body>> {
    let mut fields = vec![("decision", decision)];
    if let Some(reason) = reason {
        fields.push(("reason", reason));
    }
    let files: &[(&str, &str, &str, &[u8])] = if with_signature {
        &[("signature", "sig.png", "image/png", PNG)]
    } else {
        &[]
    };
    app.send_multipart(
        Method::POST,
        &format!("/api/employees/{employee_id}/decisions/{department}"),
        &fields,
        files,
        Some(token),
    )
    .await
}

#[tokio::test]
async fn one_rejection_forces_rejected_regardless_of_other_departments() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (admin_token, employee_id, access_token) = seed(&app).await?;

    let response = decide(&app, &admin_token, employee_id, "hr", "approved", None, false).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = decide(
        &app,
        &admin_token,
        employee_id,
        "medical",
        "rejected",
        Some("Failed eyesight test"),
        false,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["final_status"], "rejected");
    assert_eq!(body["idcard_issued"], false);

    // A later approval elsewhere cannot override the rejection.
    let response = decide(
        &app,
        &admin_token,
        employee_id,
        "safety",
        "approved",
        None,
        true,
    )
    .await?;
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["final_status"], "rejected");
    assert_eq!(body["idcard_issued"], false);
    assert_eq!(app.storage().keys_with_prefix("idcards/").await.len(), 0);

    let response = app
        .get(&format!("/api/contractors/status?token={access_token}"), None)
        .await?;
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["employees"][0]["final_status"], "rejected");
    assert_eq!(body["employees"][0]["reject_reason"], "Failed eyesight test");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn corrected_rejection_clears_reason_and_issues_card() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (admin_token, employee_id, access_token) = seed(&app).await?;

    decide(&app, &admin_token, employee_id, "hr", "approved", None, false).await?;
    decide(
        &app,
        &admin_token,
        employee_id,
        "medical",
        "rejected",
        Some("Incomplete medical report"),
        false,
    )
    .await?;
    decide(&app, &admin_token, employee_id, "safety", "approved", None, true).await?;

    // Medical reverses its decision after a fresh report.
    let response = decide(
        &app,
        &admin_token,
        employee_id,
        "medical",
        "approved",
        None,
        true,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["final_status"], "approved");
    assert_eq!(body["idcard_issued"], true);

    let response = app
        .get(&format!("/api/contractors/status?token={access_token}"), None)
        .await?;
    let body = body_to_json(response.into_body()).await?;
    let employee = &body["employees"][0];
    assert_eq!(employee["final_status"], "approved");
    assert!(employee["reject_reason"].is_null());
    assert_eq!(employee["has_idcard"], true);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn reject_reason_round_trips_verbatim() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (admin_token, employee_id, access_token) = seed(&app).await?;

    // Whitespace and punctuation included: the stored reason must come back
    // exactly as the reviewer typed it.
    let reason = "  Follow-up X-ray needed (left wrist) -- recheck in 2 weeks ";
    let response = decide(
        &app,
        &admin_token,
        employee_id,
        "medical",
        "rejected",
        Some(reason),
        false,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get(&format!("/api/contractors/status?token={access_token}"), None)
        .await?;
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["employees"][0]["reject_reason"], reason);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn rejection_without_reason_falls_back_to_department_default() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (admin_token, employee_id, access_token) = seed(&app).await?;

    let response = decide(
        &app,
        &admin_token,
        employee_id,
        "safety",
        "rejected",
        None,
        false,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get(&format!("/api/contractors/status?token={access_token}"), None)
        .await?;
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(
        body["employees"][0]["reject_reason"],
        "PPE or safety requirements not met"
    );
    assert_eq!(
        body["employees"][0]["safety"]["approved_by"],
        "Safety Officer"
    );

    app.cleanup().await?;
    Ok(())
}
