use async_graphql::{connection::Connection, Context, Object, SimpleObject, ID};
use fueldesk_shared::models::{
    fuel::Fuel,
    machine::{Machine, MachineFilter},
};

use super::fuels::{self, FuelNode};
use super::relay::{decode_id, paginate, to_global_id, OffsetCursor};
use super::{gql_err, pool, require_superuser, DeletePayload};
use crate::error::ApiError;
use crate::services::{
    self,
    machines::{self as service, MachineInput},
};

pub const TYPE_NAME: &str = "MachineNode";

pub struct MachineNode(pub Machine);

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl MachineNode {
    async fn id(&self) -> ID {
        to_global_id(TYPE_NAME, self.0.id)
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn reading(&self) -> f64 {
        self.0.reading
    }

    async fn fuel(&self, ctx: &Context<'_>) -> async_graphql::Result<FuelNode> {
        let fuel = Fuel::find_by_id(pool(ctx)?, self.0.fuel_id)
            .await
            .map_err(|e| gql_err(e.into()))?
            .ok_or_else(|| gql_err(services::not_found("Fuel")))?;

        Ok(FuelNode(fuel))
    }
}

#[derive(Debug, Default)]
pub struct MachinesQuery;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl MachinesQuery {
    async fn machines(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        name: Option<String>,
        reading: Option<f64>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> async_graphql::Result<Connection<OffsetCursor, MachineNode>> {
        require_superuser(ctx)?;
        let pool = pool(ctx)?;

        let filter = MachineFilter {
            id: id.map(|id| decode_id(&id, TYPE_NAME)).transpose().map_err(gql_err)?,
            name,
            reading,
            ..Default::default()
        };
        let total = Machine::count(pool, &filter)
            .await
            .map_err(|e| gql_err(e.into()))?;

        paginate(total, after, before, first, last, |limit, offset| async move {
            let rows = Machine::list(pool, &filter, limit, offset).await?;
            Ok::<_, ApiError>(rows.into_iter().map(MachineNode).collect())
        })
        .await
    }
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct CreateMachinePayload {
    pub machine: MachineNode,
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct UpdateMachinePayload {
    pub machine: MachineNode,
}

#[derive(Debug, Default)]
pub struct MachinesMutation;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl MachinesMutation {
    /// `fuel` is the global id of an existing fuel
    async fn create_machine(
        &self,
        ctx: &Context<'_>,
        name: String,
        fuel: ID,
        reading: f64,
    ) -> async_graphql::Result<CreateMachinePayload> {
        require_superuser(ctx)?;

        let fuel_id = decode_id(&fuel, fuels::TYPE_NAME).map_err(gql_err)?;
        let input = MachineInput {
            fuel_id,
            name,
            reading,
        };
        let machine = service::create_machine(pool(ctx)?, input)
            .await
            .map_err(gql_err)?;

        Ok(CreateMachinePayload {
            machine: MachineNode(machine),
        })
    }

    async fn update_machine(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: String,
        fuel: ID,
        reading: f64,
    ) -> async_graphql::Result<UpdateMachinePayload> {
        require_superuser(ctx)?;

        let id = decode_id(&id, TYPE_NAME).map_err(gql_err)?;
        let fuel_id = decode_id(&fuel, fuels::TYPE_NAME).map_err(gql_err)?;
        let input = MachineInput {
            fuel_id,
            name,
            reading,
        };
        let machine = service::update_machine(pool(ctx)?, id, input)
            .await
            .map_err(gql_err)?;

        Ok(UpdateMachinePayload {
            machine: MachineNode(machine),
        })
    }

    async fn delete_machine(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<DeletePayload> {
        require_superuser(ctx)?;

        let id = decode_id(&id, TYPE_NAME).map_err(gql_err)?;
        service::delete_machine(pool(ctx)?, id)
            .await
            .map_err(gql_err)?;

        Ok(DeletePayload { success: true })
    }
}
