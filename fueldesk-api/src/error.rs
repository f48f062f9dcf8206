/// Error handling for the API server
///
/// One error type serves both surfaces. Admin and REST handlers return
/// `Result<T, ApiError>`, which renders as an HTTP status plus a JSON body.
/// GraphQL resolvers convert it with [`ErrorExtensions::extend`], which keeps
/// the message and tags the error with an extension `code` so clients can
/// tell failures apart.
///
/// # Example
///
/// ```
/// use async_graphql::ErrorExtensions;
/// use fueldesk_api::error::ApiError;
///
/// let err = ApiError::Conflict("fuel already exist".to_string()).extend();
/// assert_eq!(err.message, "fuel already exist");
/// ```

use async_graphql::ErrorExtensions;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fueldesk_shared::auth::{
    authorization::AuthzError,
    jwt::JwtError,
    password::{PasswordError, PASSWORD_POLICY_MESSAGE},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Missing or unusable credentials (401)
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    Forbidden(String),

    /// Not found (404), including unresolved foreign keys
    NotFound(String),

    /// Uniqueness violation (409), e.g. a mobile number already in use
    Conflict(String),

    /// Unprocessable entity (422) - field validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Extension code attached to GraphQL errors
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHENTICATED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "DUPLICATE",
            ApiError::ValidationError(_) => "VALIDATION",
            ApiError::InternalError(_) => "INTERNAL",
        }
    }

    /// Message safe to show to clients
    ///
    /// Internal errors are logged here and replaced with a generic message.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::ValidationError(details) => match details.as_slice() {
                [single] => single.message.clone(),
                _ => details
                    .iter()
                    .map(|d| format!("{}: {}", d.field, d.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            },
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InternalError(_) => "internal_error",
        };
        let message = self.client_message();
        let details = match self {
            ApiError::ValidationError(errors) => Some(errors),
            _ => None,
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        let fields: Vec<async_graphql::Value> = match self {
            ApiError::ValidationError(details) => details
                .iter()
                .map(|d| async_graphql::Value::from(d.field.clone()))
                .collect(),
            _ => Vec::new(),
        };

        async_graphql::Error::new(self.client_message()).extend_with(|_, e| {
            e.set("code", code);
            if !fields.is_empty() {
                e.set("fields", async_graphql::Value::List(fields));
            }
        })
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or("unique");
                    return ApiError::Conflict(format!("Duplicate value violates {}", constraint));
                }

                if db_err.is_foreign_key_violation() {
                    return ApiError::NotFound("Related record does not exist".to_string());
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated | AuthzError::InvalidCredentials(_) => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthzError::NotSuperuser | AuthzError::NotStaff => ApiError::Forbidden(err.to_string()),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Policy => ApiError::ValidationError(vec![ValidationErrorDetail::new(
                "password",
                PASSWORD_POLICY_MESSAGE,
            )]),
            other => ApiError::InternalError(format!("Password operation failed: {}", other)),
        }
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

/// Convert field validation failures, one detail per failing rule
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                    ValidationErrorDetail::new(field.clone(), message)
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Fuel not found".to_string());
        assert_eq!(err.to_string(), "Not found: Fuel not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail::new("name", "Name is required"),
            ValidationErrorDetail::new("mobile", "Mobile must be digits"),
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
        assert_eq!(
            err.client_message(),
            "name: Name is required; mobile: Mobile must be digits"
        );
    }

    #[test]
    fn test_graphql_extension_codes() {
        let cases = [
            (ApiError::Unauthorized("x".into()), "UNAUTHENTICATED"),
            (ApiError::Forbidden("x".into()), "FORBIDDEN"),
            (ApiError::NotFound("x".into()), "NOT_FOUND"),
            (ApiError::Conflict("x".into()), "DUPLICATE"),
            (ApiError::ValidationError(vec![]), "VALIDATION"),
            (ApiError::BadRequest("x".into()), "BAD_REQUEST"),
            (ApiError::InternalError("x".into()), "INTERNAL"),
        ];

        for (err, code) in cases {
            let gql = err.extend();
            let ext = gql.extensions.expect("extensions set");
            assert_eq!(ext.get("code"), Some(&async_graphql::Value::from(code)));
        }
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let gql = ApiError::InternalError("connection refused".into()).extend();
        assert_eq!(gql.message, "An internal error occurred");
    }

    #[test]
    fn test_password_policy_maps_to_validation() {
        let err = ApiError::from(PasswordError::Policy);
        assert_eq!(err.code(), "VALIDATION");
        assert_eq!(err.client_message(), PASSWORD_POLICY_MESSAGE);
    }

    #[test]
    fn test_authz_mapping() {
        assert_eq!(
            ApiError::from(AuthzError::Unauthenticated).code(),
            "UNAUTHENTICATED"
        );
        assert_eq!(ApiError::from(AuthzError::NotSuperuser).code(), "FORBIDDEN");
    }

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
    }

    #[test]
    fn test_from_validator_errors() {
        let err = ApiError::from(Probe { name: String::new() }.validate().unwrap_err());
        assert_eq!(
            err,
            ApiError::ValidationError(vec![ValidationErrorDetail::new("name", "Name is required")])
        );
    }
}
