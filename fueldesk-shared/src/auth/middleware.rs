/// Authentication middleware for Axum
///
/// Reads the `Authorization` header, validates the JWT, reloads the user from
/// the database and stores the outcome as an [`AuthContext`] request
/// extension. The middleware never rejects a request on its own; resolvers
/// decide what the outcome means through [`super::authorization`].
///
/// Accepted header forms are `Bearer <token>` and `JWT <token>`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::post, Extension, Router};
/// use fueldesk_shared::auth::middleware::{authenticate_request, AuthContext, AuthState};
/// use sqlx::PgPool;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("{:?}", auth.user().map(|u| u.id))
/// }
///
/// fn router(pool: PgPool) -> Router {
///     let state = AuthState::new(pool, "secret-key-at-least-32-bytes-long!!");
///     Router::new()
///         .route("/graphql", post(handler))
///         .layer(middleware::from_fn_with_state(state, authenticate_request))
/// }
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use tracing::{debug, error};

use super::jwt::{validate_token, JwtError};
use crate::models::user::User;

/// Who is making the request
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// No credentials were sent
    Anonymous,

    /// Credentials were sent but could not be used; holds the reason
    Rejected(String),

    /// Valid token for an existing, active user
    User(User),
}

impl AuthContext {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthContext::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_superuser(&self) -> bool {
        self.user().map(|u| u.is_superuser).unwrap_or(false)
    }
}

/// State captured by [`authenticate_request`]
#[derive(Clone)]
pub struct AuthState {
    pub pool: PgPool,
    pub jwt_secret: Arc<str>,
}

impl AuthState {
    pub fn new(pool: PgPool, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            pool,
            jwt_secret: jwt_secret.into(),
        }
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Extracts the raw token from `Authorization: Bearer <t>` or `JWT <t>`
///
/// Returns `Err` with a reason if the header is present but malformed.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<&str>, String> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| "Invalid Authorization header".to_string())?;

    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("JWT "))
        .map(|token| Some(token.trim()))
        .ok_or_else(|| "Expected Bearer token".to_string())
}

/// Turns an optional token into an [`AuthContext`]
///
/// Only database failures are errors; a bad token, a deleted user or a
/// disabled account all yield [`AuthContext::Rejected`].
pub async fn resolve_context(
    pool: &PgPool,
    secret: &str,
    token: Option<&str>,
) -> Result<AuthContext, sqlx::Error> {
    let Some(token) = token else {
        return Ok(AuthContext::Anonymous);
    };

    let claims = match validate_token(token, secret) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "Rejected token");
            let reason = match e {
                JwtError::Expired => "Signature has expired".to_string(),
                other => other.to_string(),
            };
            return Ok(AuthContext::Rejected(reason));
        }
    };

    match User::find_by_id(pool, claims.sub).await? {
        Some(user) if user.is_active => Ok(AuthContext::User(user)),
        Some(_) => Ok(AuthContext::Rejected("User is disabled".to_string())),
        None => Ok(AuthContext::Rejected("User not found".to_string())),
    }
}

/// Middleware inserting an [`AuthContext`] into the request extensions
pub async fn authenticate_request(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = match extract_token(req.headers()) {
        Ok(token) => resolve_context(&state.pool, &state.jwt_secret, token)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load user for token");
                AuthError::DatabaseError(e.to_string())
            })?,
        Err(reason) => AuthContext::Rejected(reason),
    };

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
