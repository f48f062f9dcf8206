//! GraphQL API
//!
//! One schema at `POST /graphql`. Field and argument names are snake_case;
//! the relay connection types keep their standard names.
//!
//! Every query and mutation except `token_auth` and `verify_token` starts
//! with [`require_superuser`], so anonymous and non-superuser callers are
//! turned away before any data is read.
mod auth;
mod creditors;
mod fuels;
mod machines;
mod payments;
pub mod relay;
mod users;

use async_graphql::{Context, EmptySubscription, ErrorExtensions, Schema, SimpleObject};
use axum::{extract::State, Extension};
use fueldesk_shared::auth::{authorization, middleware::AuthContext};
use fueldesk_shared::models::user::User;
use sqlx::PgPool;

use crate::{app::AppState, error::ApiError};

pub use creditors::CreditorNode;
pub use fuels::FuelNode;
pub use machines::MachineNode;
pub use payments::PaymentNode;
pub use users::UserNode;

// This type represents the complete graphql schema.
pub type FuelDeskSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Schema-wide data available to every resolver
pub struct SchemaData {
    pub pool: PgPool,
    pub jwt_secret: String,
    pub jwt_expiration: chrono::Duration,
}

// Query structs must have unique names, hence the repetition.
#[derive(Debug, Default, async_graphql::MergedObject)]
pub struct QueryRoot(
    users::UsersQuery,
    fuels::FuelsQuery,
    machines::MachinesQuery,
    payments::PaymentsQuery,
    creditors::CreditorsQuery,
);

#[derive(Debug, Default, async_graphql::MergedObject)]
pub struct MutationRoot(
    auth::AuthMutation,
    users::UsersMutation,
    fuels::FuelsMutation,
    machines::MachinesMutation,
    payments::PaymentsMutation,
    creditors::CreditorsMutation,
);

/// Result of a delete mutation
#[derive(Debug, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct DeletePayload {
    pub success: bool,
}

pub fn create_schema(data: SchemaData) -> FuelDeskSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(data)
        .finish()
}

/// Returns the GraphQL SDL (Schema Definition Language) as a string.
pub fn schema_sdl() -> String {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .finish()
        .sdl()
}

pub(crate) async fn graphql_handler(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    req: axum::extract::Json<async_graphql::Request>,
) -> axum::Json<async_graphql::Response> {
    let auth = auth.map(|Extension(ctx)| ctx).unwrap_or(AuthContext::Anonymous);

    let response = state.schema.execute(req.0.data(auth)).await;
    axum::Json(response)
}

static ANONYMOUS: AuthContext = AuthContext::Anonymous;

/// Requires the caller to be an active superuser
pub(crate) fn require_superuser<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a User> {
    let auth = ctx.data_opt::<AuthContext>().unwrap_or(&ANONYMOUS);

    authorization::require_superuser(auth).map_err(|e| ApiError::from(e).extend())
}

pub(crate) fn schema_data<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a SchemaData> {
    ctx.data::<SchemaData>()
}

pub(crate) fn pool<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a PgPool> {
    Ok(&schema_data(ctx)?.pool)
}

/// Converts a service error into a coded GraphQL error
pub(crate) fn gql_err(err: ApiError) -> async_graphql::Error {
    err.extend()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_exposes_snake_case_operations() {
        let sdl = schema_sdl();

        for field in [
            "create_user",
            "update_user",
            "delete_user",
            "create_fuel",
            "create_machine",
            "update_payment",
            "delete_creditor",
            "token_auth",
            "verify_token",
            "limit_stop_credit",
            "machine_set",
            "creditor_set",
        ] {
            assert!(sdl.contains(field), "missing {} in schema", field);
        }
        assert!(sdl.contains("type UserNodeConnection"));
    }

    #[tokio::test]
    async fn test_anonymous_query_is_rejected() {
        let schema = Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
            .finish();

        let response = schema
            .execute(async_graphql::Request::new("{ fuels { edges { node { id } } } }"))
            .await;

        assert_eq!(response.errors.len(), 1);
        assert_eq!(
            response.errors[0].message,
            "You do not have permission to perform this action"
        );
        let code = response.errors[0]
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code").cloned());
        assert_eq!(code, Some(async_graphql::Value::from("UNAUTHENTICATED")));
    }
}
