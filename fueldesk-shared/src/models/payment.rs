/// Payment model: accepted payment modes
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payments (
///     id BIGSERIAL PRIMARY KEY,
///     mode VARCHAR(100) NOT NULL,
///     allowed_subcategory BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// ```
///
/// Deleting a payment mode deletes every creditor bound to it.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

const COLUMNS: &str = "id, mode, allowed_subcategory";

pub const SEARCH_FIELDS: &[&str] = &["mode"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,

    /// Payment mode, e.g. "Cash" or "Credit"
    pub mode: String,

    /// Whether creditors may be filed under this mode
    pub allowed_subcategory: bool,
}

#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub mode: String,
    pub allowed_subcategory: bool,
}

pub type UpdatePayment = CreatePayment;

#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub id: Option<i64>,
    pub allowed_subcategory: Option<bool>,
    pub mode: Option<String>,
    pub search: Option<String>,
}

impl PaymentFilter {
    fn push_where<'a>(&self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(id) = self.id {
            qb.push(" AND id = ").push_bind(id);
        }
        if let Some(sub) = self.allowed_subcategory {
            qb.push(" AND allowed_subcategory = ").push_bind(sub);
        }
        if let Some(mode) = &self.mode {
            qb.push(" AND mode = ").push_bind(mode.clone());
        }
        if let Some(term) = &self.search {
            super::push_search(qb, SEARCH_FIELDS, term);
        }
    }
}

impl Payment {
    pub async fn create(pool: &PgPool, data: CreatePayment) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments (mode, allowed_subcategory) VALUES ($1, $2) RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(data.mode)
            .bind(data.allowed_subcategory)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdatePayment,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET mode = $2, allowed_subcategory = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(data.mode)
            .bind(data.allowed_subcategory)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a payment mode and, by cascade, its creditors
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        pool: &PgPool,
        filter: &PaymentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM payments"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        qb.build_query_as::<Payment>().fetch_all(pool).await
    }

    pub async fn count(pool: &PgPool, filter: &PaymentFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM payments");
        filter.push_where(&mut qb);

        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    /// Every payment mode, for select widgets
    pub async fn all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments ORDER BY mode, id");

        sqlx::query_as::<_, Payment>(&query).fetch_all(pool).await
    }
}
