use async_graphql::{connection::Connection, Context, Object, SimpleObject, ID};
use fueldesk_shared::models::{
    fuel::{Fuel, FuelFilter},
    machine::{Machine, MachineFilter},
};

use super::machines::MachineNode;
use super::relay::{decode_id, paginate, to_global_id, OffsetCursor};
use super::{gql_err, pool, require_superuser, DeletePayload};
use crate::error::ApiError;
use crate::services::fuels::{self as service, FuelInput};

pub const TYPE_NAME: &str = "FuelNode";

pub struct FuelNode(pub Fuel);

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl FuelNode {
    async fn id(&self) -> ID {
        to_global_id(TYPE_NAME, self.0.id)
    }

    #[graphql(name = "type")]
    async fn fuel_type(&self) -> &str {
        &self.0.fuel_type
    }

    async fn price(&self) -> f64 {
        self.0.price
    }

    /// Machines dispensing this fuel
    async fn machine_set(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> async_graphql::Result<Connection<OffsetCursor, MachineNode>> {
        let pool = pool(ctx)?;
        let filter = MachineFilter {
            fuel_id: Some(self.0.id),
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

#[derive(Debug, Default)]
pub struct FuelsQuery;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl FuelsQuery {
    async fn fuels(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        #[graphql(name = "type")] fuel_type: Option<String>,
        price: Option<f64>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> async_graphql::Result<Connection<OffsetCursor, FuelNode>> {
        require_superuser(ctx)?;
        let pool = pool(ctx)?;

        let filter = FuelFilter {
            id: id.map(|id| decode_id(&id, TYPE_NAME)).transpose().map_err(gql_err)?,
            fuel_type,
            price,
            search: None,
        };
        let total = Fuel::count(pool, &filter).await.map_err(|e| gql_err(e.into()))?;

        paginate(total, after, before, first, last, |limit, offset| async move {
            let rows = Fuel::list(pool, &filter, limit, offset).await?;
            Ok::<_, ApiError>(rows.into_iter().map(FuelNode).collect())
        })
        .await
    }
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct CreateFuelPayload {
    pub fuel: FuelNode,
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct UpdateFuelPayload {
    pub fuel: FuelNode,
}

#[derive(Debug, Default)]
pub struct FuelsMutation;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl FuelsMutation {
    async fn create_fuel(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "type")] fuel_type: String,
        price: f64,
    ) -> async_graphql::Result<CreateFuelPayload> {
        require_superuser(ctx)?;

        let fuel = service::create_fuel(pool(ctx)?, FuelInput { fuel_type, price })
            .await
            .map_err(gql_err)?;

        Ok(CreateFuelPayload {
            fuel: FuelNode(fuel),
        })
    }

    async fn update_fuel(
        &self,
        ctx: &Context<'_>,
        id: ID,
        #[graphql(name = "type")] fuel_type: String,
        price: f64,
    ) -> async_graphql::Result<UpdateFuelPayload> {
        require_superuser(ctx)?;

        let id = decode_id(&id, TYPE_NAME).map_err(gql_err)?;
        let fuel = service::update_fuel(pool(ctx)?, id, FuelInput { fuel_type, price })
            .await
            .map_err(gql_err)?;

        Ok(UpdateFuelPayload {
            fuel: FuelNode(fuel),
        })
    }

    /// Also deletes the fuel's machines
    async fn delete_fuel(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<DeletePayload> {
        require_superuser(ctx)?;

        let id = decode_id(&id, TYPE_NAME).map_err(gql_err)?;
        service::delete_fuel(pool(ctx)?, id)
            .await
            .map_err(gql_err)?;

        Ok(DeletePayload { success: true })
    }
}
