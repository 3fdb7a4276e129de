pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState, workflow::Department};

pub const ROLE_HR: &str = "hr";
pub const ROLE_MEDICAL: &str = "medical";
pub const ROLE_SAFETY: &str = "safety";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedReviewer {
    pub reviewer_id: uuid::Uuid,
    pub username: String,
    pub role: String,
}

impl AuthenticatedReviewer {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Admins may act for any department; reviewers only for their own.
    pub fn can_review(&self, department: Department) -> bool {
        self.is_admin() || self.role == department.as_str()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedReviewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let claims = state
            .jwt
            .verify_token(bearer.token())
            .map_err(|_| AppError::unauthorized())?;

        Ok(AuthenticatedReviewer {
            reviewer_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}
