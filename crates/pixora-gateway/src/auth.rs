// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session authentication for the user-facing routes.
//!
//! The bearer token is the identity provider's access token. A valid token
//! for a user without a profile creates the profile with the sign-up grant,
//! so the first authenticated request doubles as registration.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use pixora_core::PixoraError;
use pixora_core::types::UserProfile;

use crate::error::ApiError;
use crate::server::AppState;

/// The authenticated caller, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the bearer token to a profile or rejects with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(&request).map(str::to_string) else {
        return Err(PixoraError::Unauthenticated("missing bearer token".into()).into());
    };

    let Some(user) = state.identity.get_user(&token).await? else {
        return Err(PixoraError::Unauthenticated("invalid session".into()).into());
    };

    let profile = state.storage.ensure_profile(&user, state.signup_grant).await?;
    request.extensions_mut().insert(CurrentUser(profile));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(header: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/credits");
        if let Some(value) = header {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&request_with(Some("Bearer abc"))), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes_and_blank_tokens() {
        assert_eq!(bearer_token(&request_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&request_with(Some("Bearer  "))), None);
        assert_eq!(bearer_token(&request_with(None)), None);
    }
}
