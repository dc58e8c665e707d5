//! Authentication-related endpoints.

use crate::auth::require_auth;
use crate::error::{ApiError, ApiResult};
use axum::Json;
use axum::extract::Request;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

/// Response for the authenticated caller.
#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub token_id: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<String>,
}

/// GET /v1/auth/whoami - Return token identity.
pub async fn whoami(req: Request) -> ApiResult<Json<WhoamiResponse>> {
    let auth = require_auth(&req)?;
    let token = &auth.token;

    let mut scopes: Vec<String> = token
        .scopes
        .iter()
        .map(|s| s.as_str().to_string())
        .collect();
    scopes.sort();

    let expires_at = match token.expires_at {
        Some(ts) => Some(
            ts.format(&Rfc3339)
                .map_err(|e| ApiError::Internal(format!("failed to format expires_at: {e}")))?,
        ),
        None => None,
    };

    Ok(Json(WhoamiResponse {
        token_id: token.id.to_string(),
        scopes,
        expires_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use axum::body::Body;
    use loft_core::token::{Token, TokenId, TokenScope};
    use std::collections::HashSet;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn test_whoami_reports_sorted_scopes() {
        let now = OffsetDateTime::now_utc();
        let token = Token {
            id: TokenId::new(),
            scopes: HashSet::from([TokenScope::DocsWrite, TokenScope::DocsRead]),
            expires_at: None,
            revoked_at: None,
            created_at: now,
            description: None,
        };

        let mut req = Request::new(Body::empty());
        req.extensions_mut().insert(AuthenticatedUser {
            token: token.clone(),
        });

        let Json(response) = whoami(req).await.unwrap();
        assert_eq!(response.token_id, token.id.to_string());
        assert_eq!(
            response.scopes,
            vec!["docs:read".to_string(), "docs:write".to_string()]
        );
        assert!(response.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_whoami_requires_auth() {
        let req = Request::new(Body::empty());
        assert!(matches!(
            whoami(req).await,
            Err(ApiError::Unauthorized(_))
        ));
    }
}
