/// Write paths shared by the GraphQL mutations and the admin forms
///
/// Each service validates its input, resolves foreign keys (failing with
/// `NotFound` before anything is written), performs the write and maps
/// database errors onto [`ApiError`]. Authorization is the caller's job.
///
/// - `users`: accounts, password policy, credential checks
/// - `fuels`, `machines`, `payments`, `creditors`: catalogue tables

pub mod creditors;
pub mod fuels;
pub mod machines;
pub mod payments;
pub mod users;

use crate::error::ApiError;

/// `NotFound` with the message clients already match on
pub(crate) fn not_found(entity: &str) -> ApiError {
    ApiError::NotFound(format!("{} matching query does not exist.", entity))
}

/// Replaces a uniqueness violation with `message`, passing other errors on
pub(crate) fn on_duplicate(err: sqlx::Error, message: &str) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(detail) => {
            tracing::debug!(%detail, "Duplicate value rejected");
            ApiError::Conflict(message.to_string())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            not_found("Fuel"),
            ApiError::NotFound("Fuel matching query does not exist.".to_string())
        );
    }

    #[test]
    fn test_on_duplicate_passes_other_errors() {
        let err = on_duplicate(sqlx::Error::RowNotFound, "fuel already exist");
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
