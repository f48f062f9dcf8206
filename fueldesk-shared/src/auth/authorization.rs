/// Authorization checks
///
/// Every protected GraphQL resolver and admin CRUD view starts with a guard
/// call. Superusers may do everything; staff may log into the admin console
/// and view the report page; nobody else gets in.
///
/// # Example
///
/// ```
/// use fueldesk_shared::auth::authorization::{require_superuser, AuthzError};
/// use fueldesk_shared::auth::middleware::AuthContext;
///
/// let ctx = AuthContext::Anonymous;
/// assert!(matches!(require_superuser(&ctx), Err(AuthzError::Unauthenticated)));
/// ```

use super::middleware::AuthContext;
use crate::models::user::User;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthzError {
    /// No credentials
    #[error("You do not have permission to perform this action")]
    Unauthenticated,

    /// Credentials sent but unusable
    #[error("{0}")]
    InvalidCredentials(String),

    /// Authenticated, but lacking the superuser flag
    #[error("You do not have permission to perform this action")]
    NotSuperuser,

    /// Authenticated, but not allowed into the admin console
    #[error("This account cannot log into the admin console")]
    NotStaff,
}

fn authenticated(ctx: &AuthContext) -> Result<&User, AuthzError> {
    match ctx {
        AuthContext::Anonymous => Err(AuthzError::Unauthenticated),
        AuthContext::Rejected(reason) => Err(AuthzError::InvalidCredentials(reason.clone())),
        AuthContext::User(user) => Ok(user),
    }
}

/// Requires an authenticated, active superuser
pub fn require_superuser(ctx: &AuthContext) -> Result<&User, AuthzError> {
    let user = authenticated(ctx)?;

    if !user.is_superuser {
        return Err(AuthzError::NotSuperuser);
    }

    Ok(user)
}

/// Requires an authenticated, active staff member (superusers count as staff)
pub fn require_staff(ctx: &AuthContext) -> Result<&User, AuthzError> {
    let user = authenticated(ctx)?;

    if !can_access_admin(user) {
        return Err(AuthzError::NotStaff);
    }

    Ok(user)
}

/// Whether `user` may log into the admin console
pub fn can_access_admin(user: &User) -> bool {
    user.is_active && (user.is_staff || user.is_superuser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(is_staff: bool, is_superuser: bool) -> User {
        User {
            id: 1,
            name: "Ravi".to_string(),
            username: "9000000001".to_string(),
            password_hash: String::new(),
            authorisation: String::new(),
            is_staff,
            is_superuser,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_require_superuser() {
        assert_eq!(
            require_superuser(&AuthContext::Anonymous).unwrap_err(),
            AuthzError::Unauthenticated
        );
        assert_eq!(
            require_superuser(&AuthContext::Rejected("Signature has expired".into())).unwrap_err(),
            AuthzError::InvalidCredentials("Signature has expired".into())
        );
        assert_eq!(
            require_superuser(&AuthContext::User(user(true, false))).unwrap_err(),
            AuthzError::NotSuperuser
        );
        assert!(require_superuser(&AuthContext::User(user(false, true))).is_ok());
    }

    #[test]
    fn test_require_staff() {
        assert!(require_staff(&AuthContext::User(user(true, false))).is_ok());
        assert!(require_staff(&AuthContext::User(user(false, true))).is_ok());
        assert_eq!(
            require_staff(&AuthContext::User(user(false, false))).unwrap_err(),
            AuthzError::NotStaff
        );
    }

    #[test]
    fn test_inactive_user_cannot_access_admin() {
        let mut inactive = user(true, true);
        inactive.is_active = false;
        assert!(!can_access_admin(&inactive));
    }
}
