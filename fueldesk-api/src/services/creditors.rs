use fueldesk_shared::models::{
    creditor::{CreateCreditor, Creditor},
    payment::Payment,
};
use sqlx::PgPool;
use validator::Validate;

use super::not_found;
use crate::error::ApiResult;

#[derive(Debug, Clone, Default, Validate)]
pub struct CreditorInput {
    pub payment_id: i64,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Warning limit must be 1 to 100 characters"))]
    pub limit_warning: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Stop-credit limit must be 1 to 100 characters"
    ))]
    pub limit_stop_credit: String,
}

/// Validates the input and confirms the payment mode exists
async fn prepare(pool: &PgPool, input: CreditorInput) -> ApiResult<CreateCreditor> {
    input.validate()?;

    if Payment::find_by_id(pool, input.payment_id).await?.is_none() {
        return Err(not_found("Payment"));
    }

    Ok(CreateCreditor {
        payment_id: input.payment_id,
        name: input.name,
        limit_warning: input.limit_warning,
        limit_stop_credit: input.limit_stop_credit,
    })
}

pub async fn create_creditor(pool: &PgPool, input: CreditorInput) -> ApiResult<Creditor> {
    let data = prepare(pool, input).await?;
    let creditor = Creditor::create(pool, data).await?;

    tracing::info!(
        creditor_id = creditor.id,
        payment_id = creditor.payment_id,
        "Created creditor"
    );
    Ok(creditor)
}

pub async fn update_creditor(pool: &PgPool, id: i64, input: CreditorInput) -> ApiResult<Creditor> {
    if Creditor::find_by_id(pool, id).await?.is_none() {
        return Err(not_found("Creditor"));
    }

    let data = prepare(pool, input).await?;
    let creditor = Creditor::update(pool, id, data)
        .await?
        .ok_or_else(|| not_found("Creditor"))?;

    tracing::info!(creditor_id = creditor.id, "Updated creditor");
    Ok(creditor)
}

pub async fn delete_creditor(pool: &PgPool, id: i64) -> ApiResult<()> {
    if !Creditor::delete(pool, id).await? {
        return Err(not_found("Creditor"));
    }

    tracing::info!(creditor_id = id, "Deleted creditor");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_are_required() {
        let input = CreditorInput {
            payment_id: 1,
            name: "Ravi Transport".to_string(),
            limit_warning: "5000".to_string(),
            limit_stop_credit: String::new(),
        };

        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("limit_stop_credit"));
    }
}
