use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::AppState;

pub mod auth;
pub mod contractors;
pub mod employees;
pub mod files;
pub mod health;
pub mod signatures;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new().route("/login", post(auth::login));

    let contractor_routes = Router::new()
        .route("/", post(contractors::submit_contractor))
        .route("/status", get(contractors::contractor_status))
        .route("/:id/employees", post(contractors::submit_employees));

    let employee_routes = Router::new()
        .route(
            "/:id/decisions/:department",
            post(employees::decide),
        )
        .route("/:id/idcard", get(employees::get_idcard));

    let department_routes = Router::new().route(
        "/:department/pending",
        get(employees::pending_for_department),
    );

    let signature_routes = Router::new()
        .route("/departments", put(signatures::put_department_signature))
        .route("/hod", put(signatures::put_hod_signature))
        .route("/hod/:department", get(signatures::get_hod_signature));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/contractors", contractor_routes)
        .nest("/api/employees", employee_routes)
        .nest("/api/departments", department_routes)
        .nest("/api/signatures", signature_routes)
        .route("/api/files", post(files::upload_file))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 16))
}
