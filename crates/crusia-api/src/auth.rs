use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "x-authorization";

pub fn extract_bearer_token(value: &str) -> Option<&str> {
    let value = value.trim();
    if let Some(rest) = value.strip_prefix("Bearer ") {
        Some(rest.trim())
    } else if let Some(rest) = value.strip_prefix("bearer ") {
        Some(rest.trim())
    } else {
        None
    }
}

/// Token from `X-Authorization`, falling back to `Authorization: Bearer`.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let primary = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| extract_bearer_token(value).unwrap_or(value.trim()))
        .filter(|token| !token.is_empty());

    primary
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(extract_bearer_token)
        })
        .filter(|token| !token.is_empty())
}

/// Resolve the request's token to a user and attach it to the request.
///
/// Short-circuits with 401 when the token is absent, does not resolve, or
/// names a user that no longer exists.
pub async fn http_layer(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user_id = match extract_token(req.headers()) {
        Some(token) => state.caps.resolve_token(token),
        None => {
            debug!("missing token");
            return ApiError::unauthorized().into_response();
        }
    };

    let user_id = match user_id {
        Ok(id) => id,
        Err(_) => {
            debug!("token did not resolve");
            return ApiError::unauthorized().into_response();
        }
    };

    match state.caps.store().get_user(user_id).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(None) => {
            warn!(%user_id, "token names a missing user");
            ApiError::unauthorized().into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}
