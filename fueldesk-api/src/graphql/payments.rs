use async_graphql::{connection::Connection, Context, Object, SimpleObject, ID};
use fueldesk_shared::models::{
    creditor::{Creditor, CreditorFilter},
    payment::{Payment, PaymentFilter},
};

use super::creditors::CreditorNode;
use super::relay::{decode_id, paginate, to_global_id, OffsetCursor};
use super::{gql_err, pool, require_superuser, DeletePayload};
use crate::error::ApiError;
use crate::services::payments::{self as service, PaymentInput};

pub const TYPE_NAME: &str = "PaymentNode";

pub struct PaymentNode(pub Payment);

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl PaymentNode {
    async fn id(&self) -> ID {
        to_global_id(TYPE_NAME, self.0.id)
    }

    async fn mode(&self) -> &str {
        &self.0.mode
    }

    async fn allowed_subcategory(&self) -> bool {
        self.0.allowed_subcategory
    }

    /// Creditors settling with this payment mode
    async fn creditor_set(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> async_graphql::Result<Connection<OffsetCursor, CreditorNode>> {
        let pool = pool(ctx)?;
        let filter = CreditorFilter {
            payment_id: Some(self.0.id),
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

#[derive(Debug, Default)]
pub struct PaymentsQuery;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl PaymentsQuery {
    async fn payments(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        allowed_subcategory: Option<bool>,
        mode: Option<String>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> async_graphql::Result<Connection<OffsetCursor, PaymentNode>> {
        require_superuser(ctx)?;
        let pool = pool(ctx)?;

        let filter = PaymentFilter {
            id: id.map(|id| decode_id(&id, TYPE_NAME)).transpose().map_err(gql_err)?,
            allowed_subcategory,
            mode,
            search: None,
        };
        let total = Payment::count(pool, &filter)
            .await
            .map_err(|e| gql_err(e.into()))?;

        paginate(total, after, before, first, last, |limit, offset| async move {
            let rows = Payment::list(pool, &filter, limit, offset).await?;
            Ok::<_, ApiError>(rows.into_iter().map(PaymentNode).collect())
        })
        .await
    }
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct CreatePaymentPayload {
    pub payment: PaymentNode,
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct UpdatePaymentPayload {
    pub payment: PaymentNode,
}

#[derive(Debug, Default)]
pub struct PaymentsMutation;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl PaymentsMutation {
    async fn create_payment(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] allowed_subcategory: bool,
        mode: String,
    ) -> async_graphql::Result<CreatePaymentPayload> {
        require_superuser(ctx)?;

        let input = PaymentInput {
            mode,
            allowed_subcategory,
        };
        let payment = service::create_payment(pool(ctx)?, input)
            .await
            .map_err(gql_err)?;

        Ok(CreatePaymentPayload {
            payment: PaymentNode(payment),
        })
    }

    async fn update_payment(
        &self,
        ctx: &Context<'_>,
        id: ID,
        #[graphql(default)] allowed_subcategory: bool,
        mode: String,
    ) -> async_graphql::Result<UpdatePaymentPayload> {
        require_superuser(ctx)?;

        let id = decode_id(&id, TYPE_NAME).map_err(gql_err)?;
        let input = PaymentInput {
            mode,
            allowed_subcategory,
        };
        let payment = service::update_payment(pool(ctx)?, id, input)
            .await
            .map_err(gql_err)?;

        Ok(UpdatePaymentPayload {
            payment: PaymentNode(payment),
        })
    }

    /// Also deletes the payment mode's creditors
    async fn delete_payment(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<DeletePayload> {
        require_superuser(ctx)?;

        let id = decode_id(&id, TYPE_NAME).map_err(gql_err)?;
        service::delete_payment(pool(ctx)?, id)
            .await
            .map_err(gql_err)?;

        Ok(DeletePayload { success: true })
    }
}
