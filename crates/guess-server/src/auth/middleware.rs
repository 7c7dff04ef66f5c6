use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::claims::{decode_claims, Claims};
use crate::error::AppError;

/// Session key shared by everyone without a token.
pub const GUEST_KEY: &str = "guest";

/// Who is playing, taken from an optional bearer token.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Claims>);

impl Viewer {
    pub fn session_key(&self) -> String {
        match &self.0 {
            Some(claims) => format!("user:{}", claims.id),
            None => GUEST_KEY.to_string(),
        }
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
            .and_then(decode_claims);

        Ok(Viewer(claims))
    }
}
