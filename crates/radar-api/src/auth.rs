//! # Authentication & Authorization Middleware
//!
//! Optional static bearer token with three roles.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{secret}   role is viewer, analyst or admin
//! Bearer {secret}          treated as admin
//! ```
//!
//! Only the secret is compared against `RADAR_AUTH_TOKEN`, in constant time.
//! When no token is configured every request runs as admin.
//!
//! ## CallerIdentity
//!
//! The middleware injects a [`CallerIdentity`] into request extensions.
//! Handlers extract it and call [`require_role`] before writes and
//! computations.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};

// ── Role ────────────────────────────────────────────────────────────

/// Roles ordered by privilege: `Viewer < Analyst < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access.
    Viewer,
    /// Can create records and run assessments, forecasts and reports.
    Analyst,
    /// Full access.
    Admin,
}

impl Role {
    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Analyst => "analyst",
            Self::Admin => "admin",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "viewer" => Some(Self::Viewer),
            "analyst" => Some(Self::Analyst),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub role: Role,
}

impl CallerIdentity {
    /// Whether the caller holds at least `minimum`.
    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// 403 unless the caller holds at least `minimum`.
pub fn require_role(caller: &CallerIdentity, minimum: Role) -> Result<(), AppError> {
    if caller.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            caller.role.as_str()
        )))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────

/// Auth configuration injected into request extensions.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────

fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse `{role}:{secret}` or `{secret}` and check the secret.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    match provided.split_once(':') {
        None => {
            if constant_time_token_eq(provided, expected_secret) {
                Ok(CallerIdentity { role: Role::Admin })
            } else {
                Err("invalid bearer token".into())
            }
        }
        Some((role, secret)) => {
            if !constant_time_token_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }
            let role = Role::parse(role).ok_or_else(|| format!("unknown role: {role}"))?;
            Ok(CallerIdentity { role })
        }
    }
}

// ── Middleware ──────────────────────────────────────────────────────

/// Validate the bearer token and inject the caller's identity.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header {
                Some(value) => match value.strip_prefix("Bearer ") {
                    Some(provided) => match parse_bearer_token(provided, expected) {
                        Ok(identity) => {
                            request.extensions_mut().insert(identity);
                            next.run(request).await
                        }
                        Err(msg) => {
                            tracing::warn!(
                                reason = %msg,
                                "authentication failed: invalid bearer token"
                            );
                            unauthorized_response(&msg)
                        }
                    },
                    None => {
                        tracing::warn!("authentication failed: non-Bearer authorization scheme");
                        unauthorized_response("authorization header must use Bearer scheme")
                    }
                },
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    unauthorized_response("missing authorization header")
                }
            }
        }
        _ => {
            request
                .extensions_mut()
                .insert(CallerIdentity { role: Role::Admin });
            next.run(request).await
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody::new("UNAUTHORIZED", message)),
    )
        .into_response()
}
