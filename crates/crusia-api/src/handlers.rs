//! Request handlers.
//!
//! Handlers read bodies as raw bytes and parse them themselves, so a
//! missing or wrong content type is not an error.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tracing::{debug, info, warn, Instrument};

use crusia_core::{now_millis, NewUser, SaveData, User, EMPTY_SAVE};
use crusia_store::{StoreError, UpdateResult};

use crate::error::{ApiError, ApiErrorKind};
use crate::models::Credentials;
use crate::state::AppState;
use crate::telemetry::{request_span, CorrelationId};

/// Header declaring which secret version sealed a set-save body.
pub const SAVE_VERSION_HEADER: &str = "x-save-version";

pub const CROSSDOMAIN_POLICY: &str = r#"<?xml version="1.0" ?>
<cross-domain-policy>
  <site-control permitted-cross-domain-policies="master-only"/>
  <allow-access-from domain="*"/>
  <allow-http-request-headers-from domain="*" headers="*"/>
</cross-domain-policy>
"#;

pub async fn crossdomain() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/x-cross-domain-policy")], CROSSDOMAIN_POLICY)
}

pub async fn version(State(state): State<AppState>) -> Json<u32> {
    Json(state.caps.current_version())
}

pub async fn login(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    body: Bytes,
) -> Result<Json<String>, ApiError> {
    let creds = Credentials::from_body(&body)?;
    let span = request_span("login", &correlation.0);

    async move {
        let user = state
            .caps
            .store()
            .get_user_by_username(&creds.username)
            .await?
            .ok_or(ApiErrorKind::NotFound)?;

        if !passhash_matches(&user.passhash, &creds.passhash) {
            warn!(user_id = %user.id, "wrong passhash");
            return Err(ApiErrorKind::Forbidden.into());
        }

        let token = state.caps.create_token(user.id)?;
        debug!(user_id = %user.id, "token issued");
        Ok::<_, ApiError>(Json(token))
    }
    .instrument(span)
    .await
}

pub async fn register(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let creds = Credentials::from_body(&body)?;
    if creds.username.is_empty() {
        return Err(ApiError::bad_request("empty username"));
    }
    let span = request_span("register", &correlation.0);

    async move {
        let new_user = NewUser::new(creds.username, creds.passhash);
        let user = state
            .caps
            .store()
            .create_account(&new_user, EMPTY_SAVE, now_millis())
            .await?;

        info!(user_id = %user.id, username = %user.username, "account created");
        Ok::<_, ApiError>(StatusCode::OK)
    }
    .instrument(span)
    .await
}

pub async fn get_save(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<String>, ApiError> {
    let data = state
        .caps
        .store()
        .get_save_data(user.id)
        .await?
        .ok_or_else(|| ApiError::internal(format!("user {} has no save data", user.id)))?;

    Ok(Json(data.payload))
}

pub async fn set_save(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let declared = save_version(&headers)?;
    let span = request_span("set_save", &correlation.0);

    async move {
        let version = u32::try_from(declared).map_err(|_| {
            warn!(user_id = %user.id, version = declared, "save rejected: version out of range");
            ApiErrorKind::UnknownVersion(declared)
        })?;
        let plaintext = state.caps.decrypt_save(version, &body).map_err(|err| {
            warn!(user_id = %user.id, version, error = %err, "save rejected");
            ApiError::from(err)
        })?;
        let payload = String::from_utf8(plaintext)
            .map_err(|_| ApiError::bad_request("save payload is not UTF-8"))?;

        let data = SaveData {
            user_id: user.id,
            edited_at: now_millis(),
            payload,
        };

        match state.caps.store().update_save_data(&data).await {
            Ok(UpdateResult::Applied) => {
                debug!(user_id = %user.id, version, "save stored");
            }
            Ok(UpdateResult::Superseded) => {
                debug!(user_id = %user.id, version, "newer save already stored");
            }
            Err(StoreError::NotFound(what)) => {
                return Err(ApiError::internal(format!("{} missing on update", what)));
            }
            Err(err) => return Err(err.into()),
        }

        Ok::<_, ApiError>(StatusCode::OK)
    }
    .instrument(span)
    .await
}

/// Digest equality in blake3 is constant time, unlike `str` comparison.
fn passhash_matches(stored: &str, given: &str) -> bool {
    blake3::hash(stored.as_bytes()) == blake3::hash(given.as_bytes())
}

/// Parse the declared save version header.
///
/// Any integer is accepted here; whether the registry knows it is decided
/// later, so only a non-integer value is a bad request.
pub fn save_version(headers: &HeaderMap) -> Result<i64, ApiError> {
    let raw = headers
        .get(SAVE_VERSION_HEADER)
        .ok_or_else(|| ApiError::bad_request("missing save version"))?;

    raw.to_str()
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::bad_request("save version is not an integer"))
}
