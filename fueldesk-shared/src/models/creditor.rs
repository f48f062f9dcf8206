/// Creditor model: customers buying on credit, with warning and stop limits
///
/// # Schema
///
/// ```sql
/// CREATE TABLE creditors (
///     id BIGSERIAL PRIMARY KEY,
///     payment_id BIGINT NOT NULL REFERENCES payments (id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     limit_warning VARCHAR(100) NOT NULL,
///     limit_stop_credit VARCHAR(100) NOT NULL
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

const COLUMNS: &str = "id, payment_id, name, limit_warning, limit_stop_credit";

/// Search also matches the bound payment's mode
pub const SEARCH_FIELDS: &[&str] = &[
    "(SELECT p.mode FROM payments p WHERE p.id = creditors.payment_id)",
    "name",
    "limit_warning",
    "limit_stop_credit",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Creditor {
    pub id: i64,

    /// Payment mode this creditor settles with
    pub payment_id: i64,

    pub name: String,

    /// Outstanding amount at which the creditor is warned
    pub limit_warning: String,

    /// Outstanding amount at which credit is stopped
    pub limit_stop_credit: String,
}

#[derive(Debug, Clone)]
pub struct CreateCreditor {
    pub payment_id: i64,
    pub name: String,
    pub limit_warning: String,
    pub limit_stop_credit: String,
}

pub type UpdateCreditor = CreateCreditor;

#[derive(Debug, Clone, Default)]
pub struct CreditorFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub limit_warning: Option<String>,
    pub limit_stop_credit: Option<String>,
    pub payment_id: Option<i64>,
    pub search: Option<String>,
}

impl CreditorFilter {
    fn push_where<'a>(&self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(id) = self.id {
            qb.push(" AND id = ").push_bind(id);
        }
        if let Some(name) = &self.name {
            qb.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(warning) = &self.limit_warning {
            qb.push(" AND limit_warning = ").push_bind(warning.clone());
        }
        if let Some(stop) = &self.limit_stop_credit {
            qb.push(" AND limit_stop_credit = ").push_bind(stop.clone());
        }
        if let Some(payment_id) = self.payment_id {
            qb.push(" AND payment_id = ").push_bind(payment_id);
        }
        if let Some(term) = &self.search {
            super::push_search(qb, SEARCH_FIELDS, term);
        }
    }
}

impl Creditor {
    pub async fn create(pool: &PgPool, data: CreateCreditor) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO creditors (payment_id, name, limit_warning, limit_stop_credit)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Creditor>(&query)
            .bind(data.payment_id)
            .bind(data.name)
            .bind(data.limit_warning)
            .bind(data.limit_stop_credit)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM creditors WHERE id = $1");

        sqlx::query_as::<_, Creditor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Creditors settling with the given payment mode
    pub async fn list_by_payment(
        pool: &PgPool,
        payment_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM creditors WHERE payment_id = $1 ORDER BY id");

        sqlx::query_as::<_, Creditor>(&query)
            .bind(payment_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateCreditor,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE creditors
             SET payment_id = $2, name = $3, limit_warning = $4, limit_stop_credit = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Creditor>(&query)
            .bind(id)
            .bind(data.payment_id)
            .bind(data.name)
            .bind(data.limit_warning)
            .bind(data.limit_stop_credit)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM creditors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        pool: &PgPool,
        filter: &CreditorFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM creditors"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        qb.build_query_as::<Creditor>().fetch_all(pool).await
    }

    pub async fn count(pool: &PgPool, filter: &CreditorFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM creditors");
        filter.push_where(&mut qb);

        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }
}
