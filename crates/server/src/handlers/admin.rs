//! Admin endpoints: health, backup/restore, token management.

use crate::auth::{hash_token, require_auth};
use crate::backup::{export_store, restore_store};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use loft_core::ExportRecord;
use loft_core::token::{CreateTokenRequest, CreateTokenResponse, TokenScope};
use loft_metadata::models::TokenRow;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

/// Maximum request body size for admin requests (64 MiB). Restore payloads
/// carry one small record per package, so this is generous.
const MAX_ADMIN_BODY_SIZE: usize = 64 * 1024 * 1024;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /v1/health - Health check.
///
/// This endpoint is intentionally unauthenticated to support load balancer
/// probes and monitoring systems. Returns only non-sensitive information.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.metadata.health_check().await?;
    state.storage.health_check().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /v1/admin/backup - Export the documentation store.
pub async fn export_backup(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<Vec<ExportRecord>>> {
    let auth = require_auth(&req)?;
    auth.require_scope(TokenScope::DocsAdmin)?;

    let records = export_store(&state).await?;
    Ok(Json(records))
}

/// Restore response.
#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    /// Number of package entries in the restored store.
    pub restored: usize,
}

/// POST /v1/admin/restore - Restore the documentation store from backup
/// records. Replaces the entire aggregate.
pub async fn restore_backup(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<RestoreResponse>> {
    let auth = require_auth(&req)?.clone();
    auth.require_scope(TokenScope::DocsAdmin)?;

    let records: Vec<ExportRecord> = {
        let bytes = axum::body::to_bytes(req.into_body(), MAX_ADMIN_BODY_SIZE)
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))?
    };

    let restored = restore_store(&state, &records).await?;
    Ok(Json(RestoreResponse { restored }))
}

/// Token listing entry.
#[derive(Debug, Serialize)]
pub struct TokenInfo {
    pub token_id: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<String>,
    pub revoked_at: Option<String>,
    pub created_at: String,
    pub description: Option<String>,
}

fn format_rfc3339(ts: OffsetDateTime, field: &str) -> ApiResult<String> {
    ts.format(&Rfc3339)
        .map_err(|e| ApiError::Internal(format!("failed to format {field}: {e}")))
}

/// POST /v1/admin/tokens - Create a new token.
pub async fn create_token(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<CreateTokenResponse>)> {
    let auth = require_auth(&req)?.clone();
    auth.require_scope(TokenScope::DocsAdmin)?;

    let body: CreateTokenRequest = {
        let bytes = axum::body::to_bytes(req.into_body(), MAX_ADMIN_BODY_SIZE)
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))?
    };

    // Validate all scopes before storing - reject unknown scopes
    for scope in &body.scopes {
        TokenScope::parse(scope)
            .map_err(|_| ApiError::BadRequest(format!("invalid scope: {scope}")))?;
    }

    let token_secret = generate_token_secret();
    let token_hash = hash_token(&token_secret);

    let now = OffsetDateTime::now_utc();
    let expires_at = match body.expires_in_secs {
        Some(secs) => {
            let secs_i64: i64 = secs.try_into().map_err(|_| {
                ApiError::BadRequest(format!("expires_in_secs too large: {secs}"))
            })?;
            Some(now + time::Duration::seconds(secs_i64))
        }
        None => None,
    };

    let token_id = Uuid::new_v4();
    let scopes_json = serde_json::to_string(&body.scopes)
        .map_err(|e| ApiError::Internal(format!("failed to serialize scopes: {e}")))?;

    let token_row = TokenRow {
        token_id,
        token_hash,
        scopes: scopes_json,
        expires_at,
        revoked_at: None,
        created_at: now,
        last_used_at: None,
        description: body.description,
    };

    state.metadata.create_token(&token_row).await?;

    let expires_at_str = expires_at
        .map(|t| format_rfc3339(t, "expires_at"))
        .transpose()?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTokenResponse {
            token_id: token_id.to_string(),
            token_secret,
            expires_at: expires_at_str,
        }),
    ))
}

/// GET /v1/admin/tokens - List tokens.
pub async fn list_tokens(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<Vec<TokenInfo>>> {
    let auth = require_auth(&req)?;
    auth.require_scope(TokenScope::DocsAdmin)?;

    let tokens = state.metadata.list_tokens().await?;

    let response: Result<Vec<TokenInfo>, ApiError> = tokens
        .into_iter()
        .map(|token| {
            let scopes: Vec<String> = serde_json::from_str(&token.scopes)
                .map_err(|e| ApiError::Internal(format!("invalid token scopes: {e}")))?;

            Ok(TokenInfo {
                token_id: token.token_id.to_string(),
                scopes,
                expires_at: token
                    .expires_at
                    .map(|t| format_rfc3339(t, "expires_at"))
                    .transpose()?,
                revoked_at: token
                    .revoked_at
                    .map(|t| format_rfc3339(t, "revoked_at"))
                    .transpose()?,
                created_at: format_rfc3339(token.created_at, "created_at")?,
                description: token.description,
            })
        })
        .collect();

    Ok(Json(response?))
}

/// DELETE /v1/admin/tokens/{token_id} - Revoke a token.
pub async fn revoke_token(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
    req: Request,
) -> ApiResult<StatusCode> {
    let auth = require_auth(&req)?;
    auth.require_scope(TokenScope::DocsAdmin)?;

    let token_id = Uuid::parse_str(&token_id)
        .map_err(|e| ApiError::BadRequest(format!("invalid token ID: {e}")))?;

    state
        .metadata
        .get_token(token_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("token not found".to_string()))?;

    state
        .metadata
        .revoke_token(token_id, OffsetDateTime::now_utc())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Generate a new random token secret.
fn generate_token_secret() -> String {
    use base64::Engine;
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_secrets_are_unique() {
        let a = generate_token_secret();
        let b = generate_token_secret();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43); // 32 bytes, base64 url-safe, no padding
    }
}
