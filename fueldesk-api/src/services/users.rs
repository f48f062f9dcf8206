/// Account management
///
/// Accounts are identified by mobile number (stored as the username). The
/// password policy applies to passwords set through the API or the admin
/// forms; the bootstrap superuser skips it.

use fueldesk_shared::{
    auth::password,
    models::user::{CreateUser, UpdateUser, User},
};
use sqlx::PgPool;
use validator::Validate;

use super::{not_found, on_duplicate};
use crate::error::{ApiError, ApiResult, ValidationErrorDetail};

pub const DUPLICATE_MESSAGE: &str = "user already exist";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Please enter valid credentials";
const MOBILE_MESSAGE: &str = "Mobile number must contain only digits";

/// Fields of a user as entered by an operator
#[derive(Debug, Clone, Default, Validate)]
pub struct UserInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 10, message = "Mobile number must be 1 to 10 digits"))]
    pub mobile: String,

    /// Clear-text password; on update an empty value keeps the current one
    pub password: String,

    #[validate(length(max = 100, message = "Authorisation must be at most 100 characters"))]
    pub authorisation: String,
}

impl UserInput {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;

        if !self.mobile.chars().all(|c| c.is_ascii_digit()) {
            return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
                "mobile",
                MOBILE_MESSAGE,
            )]));
        }

        Ok(())
    }
}

/// Creates a regular (non-staff) account
pub async fn create_user(pool: &PgPool, input: UserInput) -> ApiResult<User> {
    input.check()?;
    password::check_password_policy(&input.password)?;

    let password_hash = password::hash_password(&input.password)?;

    let user = User::create(
        pool,
        CreateUser {
            name: input.name,
            username: input.mobile,
            password_hash,
            authorisation: input.authorisation,
            is_staff: false,
            is_superuser: false,
        },
    )
    .await
    .map_err(|e| on_duplicate(e, DUPLICATE_MESSAGE))?;

    tracing::info!(user_id = user.id, "Created user");
    Ok(user)
}

/// Replaces name, mobile and authorisation; re-hashes the password only when
/// a non-empty one is given
pub async fn update_user(pool: &PgPool, id: i64, input: UserInput) -> ApiResult<User> {
    input.check()?;

    let password_hash = if input.password.is_empty() {
        None
    } else {
        password::check_password_policy(&input.password)?;
        Some(password::hash_password(&input.password)?)
    };

    let user = User::update(
        pool,
        id,
        UpdateUser {
            name: input.name,
            username: input.mobile,
            authorisation: input.authorisation,
            password_hash,
        },
    )
    .await
    .map_err(|e| on_duplicate(e, DUPLICATE_MESSAGE))?
    .ok_or_else(|| not_found("User"))?;

    tracing::info!(user_id = user.id, "Updated user");
    Ok(user)
}

pub async fn delete_user(pool: &PgPool, id: i64) -> ApiResult<()> {
    if !User::delete(pool, id).await? {
        return Err(not_found("User"));
    }

    tracing::info!(user_id = id, "Deleted user");
    Ok(())
}

/// Creates an active staff superuser without applying the password policy
pub async fn create_superuser(
    pool: &PgPool,
    mobile: &str,
    name: &str,
    password: &str,
) -> ApiResult<User> {
    let input = UserInput {
        name: name.to_string(),
        mobile: mobile.to_string(),
        password: password.to_string(),
        authorisation: String::new(),
    };
    input.check()?;

    if password.is_empty() {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "password",
            "Password is required",
        )]));
    }

    let user = User::create(
        pool,
        CreateUser {
            name: input.name,
            username: input.mobile,
            password_hash: password::hash_password(password)?,
            authorisation: input.authorisation,
            is_staff: true,
            is_superuser: true,
        },
    )
    .await
    .map_err(|e| on_duplicate(e, DUPLICATE_MESSAGE))?;

    tracing::info!(user_id = user.id, "Created superuser");
    Ok(user)
}

/// Checks a username/password pair and records the login
///
/// Unknown users, wrong passwords and disabled accounts all fail with the
/// same message.
pub async fn authenticate(pool: &PgPool, username: &str, password: &str) -> ApiResult<User> {
    let invalid = || ApiError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string());

    let user = User::find_by_username(pool, username)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active || !password::verify_password(password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Rejected login");
        return Err(invalid());
    }

    User::update_last_login(pool, user.id).await?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(mobile: &str) -> UserInput {
        UserInput {
            name: "Asha".to_string(),
            mobile: mobile.to_string(),
            password: "@1a".to_string(),
            authorisation: "Night shift".to_string(),
        }
    }

    #[test]
    fn test_mobile_must_be_digits() {
        assert!(input("9876543210").check().is_ok());

        let err = input("98765abc").check().unwrap_err();
        assert_eq!(
            err,
            ApiError::ValidationError(vec![ValidationErrorDetail::new("mobile", MOBILE_MESSAGE)])
        );
    }

    #[test]
    fn test_mobile_length() {
        assert!(matches!(
            input("12345678901").check(),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(input("").check(), Err(ApiError::ValidationError(_))));
    }

    #[test]
    fn test_name_is_required() {
        let mut user = input("9876543210");
        user.name.clear();
        assert!(matches!(user.check(), Err(ApiError::ValidationError(_))));
    }
}
