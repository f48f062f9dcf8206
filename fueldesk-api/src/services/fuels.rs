use fueldesk_shared::models::fuel::{CreateFuel, Fuel};
use sqlx::PgPool;
use validator::Validate;

use super::{not_found, on_duplicate};
use crate::error::ApiResult;

pub const DUPLICATE_MESSAGE: &str = "fuel already exist";

#[derive(Debug, Clone, Default, Validate)]
pub struct FuelInput {
    #[validate(length(min = 1, max = 100, message = "Type must be 1 to 100 characters"))]
    pub fuel_type: String,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
}

impl From<FuelInput> for CreateFuel {
    fn from(input: FuelInput) -> Self {
        CreateFuel {
            fuel_type: input.fuel_type,
            price: input.price,
        }
    }
}

pub async fn create_fuel(pool: &PgPool, input: FuelInput) -> ApiResult<Fuel> {
    input.validate()?;

    let fuel = Fuel::create(pool, input.into())
        .await
        .map_err(|e| on_duplicate(e, DUPLICATE_MESSAGE))?;

    tracing::info!(fuel_id = fuel.id, fuel_type = %fuel.fuel_type, "Created fuel");
    Ok(fuel)
}

pub async fn update_fuel(pool: &PgPool, id: i64, input: FuelInput) -> ApiResult<Fuel> {
    input.validate()?;

    let fuel = Fuel::update(pool, id, input.into())
        .await
        .map_err(|e| on_duplicate(e, DUPLICATE_MESSAGE))?
        .ok_or_else(|| not_found("Fuel"))?;

    tracing::info!(fuel_id = fuel.id, "Updated fuel");
    Ok(fuel)
}

/// Deletes a fuel together with its machines
pub async fn delete_fuel(pool: &PgPool, id: i64) -> ApiResult<()> {
    if !Fuel::delete(pool, id).await? {
        return Err(not_found("Fuel"));
    }

    tracing::info!(fuel_id = id, "Deleted fuel");
    Ok(())
}
