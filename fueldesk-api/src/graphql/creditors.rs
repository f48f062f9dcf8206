use async_graphql::{connection::Connection, Context, Object, SimpleObject, ID};
use fueldesk_shared::models::{
    creditor::{Creditor, CreditorFilter},
    payment::Payment,
};

use super::payments::{self, PaymentNode};
use super::relay::{decode_id, paginate, to_global_id, OffsetCursor};
use super::{gql_err, pool, require_superuser, DeletePayload};
use crate::error::ApiError;
use crate::services::{
    self,
    creditors::{self as service, CreditorInput},
};

pub const TYPE_NAME: &str = "CreditorNode";

pub struct CreditorNode(pub Creditor);

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl CreditorNode {
    async fn id(&self) -> ID {
        to_global_id(TYPE_NAME, self.0.id)
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn limit_warning(&self) -> &str {
        &self.0.limit_warning
    }

    async fn limit_stop_credit(&self) -> &str {
        &self.0.limit_stop_credit
    }

    async fn payment(&self, ctx: &Context<'_>) -> async_graphql::Result<PaymentNode> {
        let payment = Payment::find_by_id(pool(ctx)?, self.0.payment_id)
            .await
            .map_err(|e| gql_err(e.into()))?
            .ok_or_else(|| gql_err(services::not_found("Payment")))?;

        Ok(PaymentNode(payment))
    }
}

#[derive(Debug, Default)]
pub struct CreditorsQuery;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl CreditorsQuery {
    async fn creditors(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        name: Option<String>,
        limit_warning: Option<String>,
        limit_stop_credit: Option<String>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> async_graphql::Result<Connection<OffsetCursor, CreditorNode>> {
        require_superuser(ctx)?;
        let pool = pool(ctx)?;

        let filter = CreditorFilter {
            id: id.map(|id| decode_id(&id, TYPE_NAME)).transpose().map_err(gql_err)?,
            name,
            limit_warning,
            limit_stop_credit,
            ..Default::default()
        };
        let total = Creditor::count(pool, &filter)
            .await
            .map_err(|e| gql_err(e.into()))?;

        paginate(total, after, before, first, last, |limit, offset| async move {
            let rows = Creditor::list(pool, &filter, limit, offset).await?;
            Ok::<_, ApiError>(rows.into_iter().map(CreditorNode).collect())
        })
        .await
    }
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct CreateCreditorPayload {
    pub creditor: CreditorNode,
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct UpdateCreditorPayload {
    pub creditor: CreditorNode,
}

#[derive(Debug, Default)]
pub struct CreditorsMutation;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl CreditorsMutation {
    /// `payment` is the global id of an existing payment mode
    async fn create_creditor(
        &self,
        ctx: &Context<'_>,
        payment: ID,
        name: String,
        limit_warning: String,
        limit_stop_credit: String,
    ) -> async_graphql::Result<CreateCreditorPayload> {
        require_superuser(ctx)?;

        let payment_id = decode_id(&payment, payments::TYPE_NAME).map_err(gql_err)?;
        let input = CreditorInput {
            payment_id,
            name,
            limit_warning,
            limit_stop_credit,
        };
        let creditor = service::create_creditor(pool(ctx)?, input)
            .await
            .map_err(gql_err)?;

        Ok(CreateCreditorPayload {
            creditor: CreditorNode(creditor),
        })
    }

    async fn update_creditor(
        &self,
        ctx: &Context<'_>,
        id: ID,
        payment: ID,
        name: String,
        limit_warning: String,
        limit_stop_credit: String,
    ) -> async_graphql::Result<UpdateCreditorPayload> {
        require_superuser(ctx)?;

        let id = decode_id(&id, TYPE_NAME).map_err(gql_err)?;
        let payment_id = decode_id(&payment, payments::TYPE_NAME).map_err(gql_err)?;
        let input = CreditorInput {
            payment_id,
            name,
            limit_warning,
            limit_stop_credit,
        };
        let creditor = service::update_creditor(pool(ctx)?, id, input)
            .await
            .map_err(gql_err)?;

        Ok(UpdateCreditorPayload {
            creditor: CreditorNode(creditor),
        })
    }

    async fn delete_creditor(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<DeletePayload> {
        require_superuser(ctx)?;

        let id = decode_id(&id, TYPE_NAME).map_err(gql_err)?;
        service::delete_creditor(pool(ctx)?, id)
            .await
            .map_err(gql_err)?;

        Ok(DeletePayload { success: true })
    }
}
