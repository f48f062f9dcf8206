/// JWT token generation and validation
///
/// Tokens are HS256-signed and carry the user id and username. They are
/// issued by the `token_auth` mutation and by the admin login form, and are
/// long-lived (the expiration is configured in days).
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use fueldesk_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let claims = Claims::new(42, "9876543210", Duration::days(9999));
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, 42);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer written into and required from every token
pub const ISSUER: &str = "fueldesk";

/// Seconds, counted from `orig_iat`, during which a token may be refreshed
pub const REFRESH_EXPIRATION_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Signature has expired")]
    Expired,

    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },

    #[error("Error decoding signature")]
    InvalidSignature,
}

/// JWT claims
///
/// `sub`, `iss`, `iat` and `exp` are the registered claims; `username` and
/// `orig_iat` make up the payload returned to GraphQL clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,

    /// Mobile number the token was issued for
    pub username: String,

    pub iss: String,
    pub iat: i64,
    pub exp: i64,

    /// Issue time of the first token in a refresh chain
    pub orig_iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, username: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: user_id,
            username: username.into(),
            iss: ISSUER.to_string(),
            iat: now,
            exp: now + expires_in.num_seconds(),
            orig_iat: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Unix timestamp after which the token can no longer be refreshed
    pub fn refresh_expires_in(&self) -> i64 {
        self.orig_iat + REFRESH_EXPIRATION_SECS
    }

    /// Client-facing payload: `{username, exp, orig_iat}`
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "exp": self.exp,
            "orig_iat": self.orig_iat,
        })
    }
}

/// Signs `claims` with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, expiry and issuer, returning the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(5, "9876543210", Duration::days(9999));

        assert_eq!(claims.sub, 5);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.orig_iat, claims.iat);
        assert_eq!(claims.exp - claims.iat, 9999 * 24 * 60 * 60);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let claims = Claims::new(5, "9876543210", Duration::hours(1));
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated, claims);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(5, "9876543210", Duration::hours(1));
        let token = create_token(&claims, SECRET).expect("Should create token");

        let result = validate_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::new(5, "9876543210", Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).expect("Should create token");
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_garbage() {
        assert!(validate_token("not-a-jwt", SECRET).is_err());
    }

    #[test]
    fn test_payload_and_refresh_window() {
        let claims = Claims::new(5, "9876543210", Duration::hours(1));
        let payload = claims.payload();

        assert_eq!(payload["username"], "9876543210");
        assert_eq!(payload["exp"], claims.exp);
        assert_eq!(payload["orig_iat"], claims.orig_iat);
        assert_eq!(
            claims.refresh_expires_in() - claims.orig_iat,
            7 * 24 * 60 * 60
        );
    }
}
