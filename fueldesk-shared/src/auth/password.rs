/// Password hashing and password policy
///
/// Hashes use Argon2id (64 MB memory, 3 iterations, 4 lanes, 32-byte output)
/// in PHC string format, so parameters and salt travel with the hash.
///
/// # Example
///
/// ```
/// use fueldesk_shared::auth::password::{check_password_policy, hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// check_password_policy("@1a")?;
///
/// let hash = hash_password("@1a")?;
/// assert!(verify_password("@1a", &hash)?);
/// assert!(!verify_password("@1b", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Message returned when a password is rejected by [`check_password_policy`].
///
/// The wording describes a stricter rule than the check applies. It is kept
/// as-is because clients match on it.
pub const PASSWORD_POLICY_MESSAGE: &str = "Must contain at least one number and one uppercase \
                                           and lowercase letter, and at least 8 or more characters";

static POLICY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[@#%]+[0-9]+@*[a-zA-Z]+").expect("password policy pattern is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// Password rejected by the policy check
    #[error("{}", PASSWORD_POLICY_MESSAGE)]
    Policy,
}

/// Hashes a password using Argon2id
///
/// Returns the PHC string, e.g. `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash (constant-time)
///
/// `Ok(false)` means the password is wrong; `Err` means the hash itself is
/// unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Returns whether `password` satisfies the account password policy
///
/// The characters are sorted by code point; if the password contains an `@`
/// one more `@` is prepended. The result must start with one or more of
/// `@#%`, then digits, then optional `@`s, then ASCII letters.
pub fn passwords_match(password: &str) -> bool {
    let mut chars: Vec<char> = password.chars().collect();
    chars.sort_unstable();

    let mut sorted: String = chars.into_iter().collect();
    if sorted.contains('@') {
        sorted.insert(0, '@');
    }

    POLICY_PATTERN.is_match(&sorted)
}

/// [`passwords_match`] as a `Result`, for use with `?`
pub fn check_password_policy(password: &str) -> Result<(), PasswordError> {
    if passwords_match(password) {
        Ok(())
    } else {
        Err(PasswordError::Policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("@1abc").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password").expect("Hash 2 should succeed");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password").expect("Hash should succeed");

        assert!(verify_password("correct_password", &hash).expect("Verify should succeed"));
        assert!(!verify_password("wrong_password", &hash).expect("Verify should succeed"));
        assert!(!verify_password("", &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").is_err());
        assert!(verify_password("password", "").is_err());
        assert!(verify_password("password", "argon2id$v=19$m=19456,t=2,p=1").is_err());
    }

    #[test]
    fn test_policy_rejects_plain_word_with_digit() {
        // sorted: "1adoprssw", no leading symbol
        assert!(!passwords_match("password1"));
        assert!(matches!(
            check_password_policy("password1"),
            Err(PasswordError::Policy)
        ));
    }

    #[test]
    fn test_policy_accepts_at_digit_letter() {
        // sorted "1@a", prefixed to "@1@a"
        assert!(passwords_match("@1a"));
        assert!(check_password_policy("@1a").is_ok());
    }

    #[test]
    fn test_policy_cases() {
        assert!(passwords_match("#9Zz"));
        assert!(passwords_match("%%12ab"));
        assert!(passwords_match("a1@b2"));

        // no symbol at all
        assert!(!passwords_match("Abcdefg1"));
        // symbol but no digit
        assert!(!passwords_match("#abc"));
        // symbol and digit but no letter
        assert!(!passwords_match("#123"));
        // '!' sorts before the accepted symbols
        assert!(!passwords_match("!#1a"));
        assert!(!passwords_match(""));
    }

    #[test]
    fn test_policy_message_is_verbatim() {
        assert_eq!(
            PasswordError::Policy.to_string(),
            "Must contain at least one number and one uppercase and lowercase letter, \
             and at least 8 or more characters"
        );
    }
}
