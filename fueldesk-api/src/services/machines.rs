use fueldesk_shared::models::{
    fuel::Fuel,
    machine::{CreateMachine, Machine},
};
use sqlx::PgPool;
use validator::Validate;

use super::not_found;
use crate::error::ApiResult;

#[derive(Debug, Clone, Default, Validate)]
pub struct MachineInput {
    pub fuel_id: i64,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    pub reading: f64,
}

/// Validates the input and confirms the fuel exists
async fn prepare(pool: &PgPool, input: MachineInput) -> ApiResult<CreateMachine> {
    input.validate()?;

    if Fuel::find_by_id(pool, input.fuel_id).await?.is_none() {
        return Err(not_found("Fuel"));
    }

    Ok(CreateMachine {
        fuel_id: input.fuel_id,
        name: input.name,
        reading: input.reading,
    })
}

pub async fn create_machine(pool: &PgPool, input: MachineInput) -> ApiResult<Machine> {
    let data = prepare(pool, input).await?;
    let machine = Machine::create(pool, data).await?;

    tracing::info!(machine_id = machine.id, fuel_id = machine.fuel_id, "Created machine");
    Ok(machine)
}

pub async fn update_machine(pool: &PgPool, id: i64, input: MachineInput) -> ApiResult<Machine> {
    if Machine::find_by_id(pool, id).await?.is_none() {
        return Err(not_found("Machine"));
    }

    let data = prepare(pool, input).await?;
    let machine = Machine::update(pool, id, data)
        .await?
        .ok_or_else(|| not_found("Machine"))?;

    tracing::info!(machine_id = machine.id, "Updated machine");
    Ok(machine)
}

pub async fn delete_machine(pool: &PgPool, id: i64) -> ApiResult<()> {
    if !Machine::delete(pool, id).await? {
        return Err(not_found("Machine"));
    }

    tracing::info!(machine_id = id, "Deleted machine");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[tokio::test]
    async fn test_invalid_input_fails_before_lookup() {
        // The lazy pool never connects; validation must reject first.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();

        let input = MachineInput {
            fuel_id: 1,
            name: String::new(),
            reading: 0.0,
        };

        let err = create_machine(&pool, input).await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }
}
