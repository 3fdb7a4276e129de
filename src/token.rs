//! Opaque access tokens handed to contractors for unauthenticated status
//! lookups. Tokens are globally unique so that a token alone can resolve
//! its contractor.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use rand::rngs::OsRng;
use rand::Rng;
use thiserror::Error;

use crate::schema::contractors;

pub const TOKEN_LEN: usize = 12;
const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_ISSUE_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("could not find an unused access token after {MAX_ISSUE_ATTEMPTS} attempts")]
    Exhausted,
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

pub fn generate_access_token() -> String {
    let mut rng = OsRng;
    (0..TOKEN_LEN)
        .map(|_| TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

/// Generates a token that no existing contractor holds. Collisions are
/// practically impossible at 36^12 but the retry loop keeps the uniqueness
/// guarantee explicit rather than probabilistic.
pub fn issue_unique_token(conn: &mut PgConnection) -> Result<String, TokenError> {
    for _ in 0..MAX_ISSUE_ATTEMPTS {
        let candidate = generate_access_token();
        let taken = diesel::select(diesel::dsl::exists(
            contractors::table.filter(contractors::access_token.eq(&candidate)),
        ))
        .get_result::<bool>(conn)?;
        if !taken {
            return Ok(candidate);
        }
    }
    Err(TokenError::Exhausted)
}
