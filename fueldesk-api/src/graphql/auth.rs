use async_graphql::{Context, Json, Object, SimpleObject};
use fueldesk_shared::auth::jwt::{self, Claims};

use super::{gql_err, schema_data};
use crate::error::ApiError;
use crate::services::users;

/// A freshly issued token
#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct ObtainTokenPayload {
    pub token: String,

    /// `{username, exp, orig_iat}`
    pub payload: Json<serde_json::Value>,

    /// Unix time after which the token can no longer be refreshed
    pub refresh_expires_in: i64,
}

#[derive(SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct VerifyPayload {
    pub payload: Json<serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct AuthMutation;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl AuthMutation {
    /// Exchanges a mobile number and password for a JWT
    async fn token_auth(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> async_graphql::Result<ObtainTokenPayload> {
        let data = schema_data(ctx)?;

        let user = users::authenticate(&data.pool, &username, &password)
            .await
            .map_err(gql_err)?;

        let claims = Claims::new(user.id, user.username, data.jwt_expiration);
        let token = jwt::create_token(&claims, &data.jwt_secret)
            .map_err(|e| gql_err(ApiError::from(e)))?;

        tracing::info!(user_id = user.id, "Issued token");

        Ok(ObtainTokenPayload {
            token,
            payload: Json(claims.payload()),
            refresh_expires_in: claims.refresh_expires_in(),
        })
    }

    /// Checks a token's signature and expiry, returning its payload
    async fn verify_token(
        &self,
        ctx: &Context<'_>,
        token: String,
    ) -> async_graphql::Result<VerifyPayload> {
        let data = schema_data(ctx)?;

        let claims = jwt::validate_token(&token, &data.jwt_secret)
            .map_err(|e| gql_err(ApiError::from(e)))?;

        Ok(VerifyPayload {
            payload: Json(claims.payload()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::{MutationRoot, QueryRoot, SchemaData};
    use async_graphql::{EmptySubscription, Schema};

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn schema() -> Schema<QueryRoot, MutationRoot, EmptySubscription> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();

        Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
            .data(SchemaData {
                pool,
                jwt_secret: SECRET.to_string(),
                jwt_expiration: chrono::Duration::days(1),
            })
            .finish()
    }

    #[tokio::test]
    async fn test_verify_token_returns_payload() {
        let claims = fueldesk_shared::auth::jwt::Claims::new(7, "9876543210", chrono::Duration::days(1));
        let token = fueldesk_shared::auth::jwt::create_token(&claims, SECRET).unwrap();

        let query = format!(
            r#"mutation {{ verify_token(token: "{}") {{ payload }} }}"#,
            token
        );
        let response = schema().execute(query.as_str()).await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["verify_token"]["payload"]["username"], "9876543210");
        assert_eq!(data["verify_token"]["payload"]["exp"], claims.exp);
    }

    #[tokio::test]
    async fn test_verify_token_rejects_foreign_signature() {
        let claims = fueldesk_shared::auth::jwt::Claims::new(7, "9876543210", chrono::Duration::days(1));
        let token = fueldesk_shared::auth::jwt::create_token(&claims, "another-secret-key-at-least-32-bytes").unwrap();

        let query = format!(
            r#"mutation {{ verify_token(token: "{}") {{ payload }} }}"#,
            token
        );
        let response = schema().execute(query.as_str()).await;

        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "Error decoding signature");
    }
}
