use async_graphql::{connection::Connection, Context, Object, SimpleObject, ID};
use chrono::{DateTime, Utc};
use fueldesk_shared::models::user::{User, UserFilter};

use super::relay::{decode_id, paginate, to_global_id, OffsetCursor};
use super::{gql_err, pool, require_superuser, DeletePayload};
use crate::error::ApiError;
use crate::services::users::{self as service, UserInput};

pub const TYPE_NAME: &str = "UserNode";

pub struct UserNode(pub User);

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl UserNode {
    async fn id(&self) -> ID {
        to_global_id(TYPE_NAME, self.0.id)
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    /// Mobile number
    async fn username(&self) -> &str {
        &self.0.username
    }

    async fn authorisation(&self) -> &str {
        &self.0.authorisation
    }

    async fn is_staff(&self) -> bool {
        self.0.is_staff
    }

    async fn is_superuser(&self) -> bool {
        self.0.is_superuser
    }

    async fn is_active(&self) -> bool {
        self.0.is_active
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }

    async fn last_login(&self) -> Option<DateTime<Utc>> {
        self.0.last_login_at
    }
}

#[derive(Debug, Default)]
pub struct UsersQuery;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl UsersQuery {
    /// Non-staff accounts, ordered by id
    async fn users(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        username: Option<String>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> async_graphql::Result<Connection<OffsetCursor, UserNode>> {
        require_superuser(ctx)?;
        let pool = pool(ctx)?;

        let filter = UserFilter {
            id: id.map(|id| decode_id(&id, TYPE_NAME)).transpose().map_err(gql_err)?,
            username,
            exclude_staff: true,
            ..Default::default()
        };
        let total = User::count(pool, &filter).await.map_err(|e| gql_err(e.into()))?;

        paginate(total, after, before, first, last, |limit, offset| async move {
            let rows = User::list(pool, &filter, limit, offset).await?;
            Ok::<_, ApiError>(rows.into_iter().map(UserNode).collect())
        })
        .await
    }
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct CreateUserPayload {
    pub user: UserNode,
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct UpdateUserPayload {
    pub user: UserNode,
}

#[derive(Debug, Default)]
pub struct UsersMutation;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl UsersMutation {
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        name: String,
        mobile: String,
        password: String,
        authorisation: String,
    ) -> async_graphql::Result<CreateUserPayload> {
        require_superuser(ctx)?;

        let input = UserInput {
            name,
            mobile,
            password,
            authorisation,
        };
        let user = service::create_user(pool(ctx)?, input)
            .await
            .map_err(gql_err)?;

        Ok(CreateUserPayload {
            user: UserNode(user),
        })
    }

    /// An empty `password` keeps the current one
    async fn update_user(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: String,
        mobile: String,
        #[graphql(default)] password: String,
        authorisation: String,
    ) -> async_graphql::Result<UpdateUserPayload> {
        require_superuser(ctx)?;

        let id = decode_id(&id, TYPE_NAME).map_err(gql_err)?;
        let input = UserInput {
            name,
            mobile,
            password,
            authorisation,
        };
        let user = service::update_user(pool(ctx)?, id, input)
            .await
            .map_err(gql_err)?;

        Ok(UpdateUserPayload {
            user: UserNode(user),
        })
    }

    async fn delete_user(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<DeletePayload> {
        require_superuser(ctx)?;

        let id = decode_id(&id, TYPE_NAME).map_err(gql_err)?;
        service::delete_user(pool(ctx)?, id)
            .await
            .map_err(gql_err)?;

        Ok(DeletePayload { success: true })
    }
}
