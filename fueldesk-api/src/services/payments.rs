use fueldesk_shared::models::payment::{CreatePayment, Payment};
use sqlx::PgPool;
use validator::Validate;

use super::not_found;
use crate::error::ApiResult;

#[derive(Debug, Clone, Default, Validate)]
pub struct PaymentInput {
    #[validate(length(min = 1, max = 100, message = "Mode must be 1 to 100 characters"))]
    pub mode: String,

    pub allowed_subcategory: bool,
}

impl From<PaymentInput> for CreatePayment {
    fn from(input: PaymentInput) -> Self {
        CreatePayment {
            mode: input.mode,
            allowed_subcategory: input.allowed_subcategory,
        }
    }
}

pub async fn create_payment(pool: &PgPool, input: PaymentInput) -> ApiResult<Payment> {
    input.validate()?;

    let payment = Payment::create(pool, input.into()).await?;

    tracing::info!(payment_id = payment.id, mode = %payment.mode, "Created payment mode");
    Ok(payment)
}

pub async fn update_payment(pool: &PgPool, id: i64, input: PaymentInput) -> ApiResult<Payment> {
    input.validate()?;

    let payment = Payment::update(pool, id, input.into())
        .await?
        .ok_or_else(|| not_found("Payment"))?;

    tracing::info!(payment_id = payment.id, "Updated payment mode");
    Ok(payment)
}

/// Deletes a payment mode together with its creditors
pub async fn delete_payment(pool: &PgPool, id: i64) -> ApiResult<()> {
    if !Payment::delete(pool, id).await? {
        return Err(not_found("Payment"));
    }

    tracing::info!(payment_id = id, "Deleted payment mode");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_is_required() {
        let input = PaymentInput {
            mode: String::new(),
            allowed_subcategory: true,
        };
        assert!(input.validate().is_err());
    }
}
