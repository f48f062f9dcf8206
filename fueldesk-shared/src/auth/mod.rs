/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the account password policy
/// - [`jwt`]: JWT creation and validation
/// - [`middleware`]: request authentication into an [`middleware::AuthContext`]
/// - [`authorization`]: superuser and staff guards
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use fueldesk_shared::auth::jwt::{create_token, Claims};
/// use fueldesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("@1a")?;
/// assert!(verify_password("@1a", &hash)?);
///
/// let claims = Claims::new(1, "9876543210", Duration::days(9999));
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
