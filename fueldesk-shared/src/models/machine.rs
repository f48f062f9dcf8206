/// Machine model: dispensing machines and their meter readings
///
/// # Schema
///
/// ```sql
/// CREATE TABLE machines (
///     id BIGSERIAL PRIMARY KEY,
///     fuel_id BIGINT NOT NULL REFERENCES fuels (id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     reading DOUBLE PRECISION NOT NULL
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

const COLUMNS: &str = "id, fuel_id, name, reading";

/// Search matches the machine name, reading, and the dispensed fuel's type
pub const SEARCH_FIELDS: &[&str] = &[
    "name",
    "reading",
    "(SELECT f.type FROM fuels f WHERE f.id = machines.fuel_id)",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Machine {
    pub id: i64,

    /// Fuel dispensed by this machine
    pub fuel_id: i64,

    pub name: String,

    /// Current meter reading
    pub reading: f64,
}

/// Input for creating a machine, also used for full updates
#[derive(Debug, Clone)]
pub struct CreateMachine {
    pub fuel_id: i64,
    pub name: String,
    pub reading: f64,
}

pub type UpdateMachine = CreateMachine;

#[derive(Debug, Clone, Default)]
pub struct MachineFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub reading: Option<f64>,
    pub fuel_id: Option<i64>,
    pub search: Option<String>,
}

impl MachineFilter {
    fn push_where<'a>(&self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(id) = self.id {
            qb.push(" AND id = ").push_bind(id);
        }
        if let Some(name) = &self.name {
            qb.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(reading) = self.reading {
            qb.push(" AND reading = ").push_bind(reading);
        }
        if let Some(fuel_id) = self.fuel_id {
            qb.push(" AND fuel_id = ").push_bind(fuel_id);
        }
        if let Some(term) = &self.search {
            super::push_search(qb, SEARCH_FIELDS, term);
        }
    }
}

impl Machine {
    /// Inserts a machine
    ///
    /// The caller is expected to have resolved `fuel_id`; a dangling id still
    /// fails with a foreign key violation.
    pub async fn create(pool: &PgPool, data: CreateMachine) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO machines (fuel_id, name, reading) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Machine>(&query)
            .bind(data.fuel_id)
            .bind(data.name)
            .bind(data.reading)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM machines WHERE id = $1");

        sqlx::query_as::<_, Machine>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Machines dispensing the given fuel
    pub async fn list_by_fuel(pool: &PgPool, fuel_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM machines WHERE fuel_id = $1 ORDER BY id");

        sqlx::query_as::<_, Machine>(&query)
            .bind(fuel_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateMachine,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE machines SET fuel_id = $2, name = $3, reading = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Machine>(&query)
            .bind(id)
            .bind(data.fuel_id)
            .bind(data.name)
            .bind(data.reading)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM machines WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        pool: &PgPool,
        filter: &MachineFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM machines"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        qb.build_query_as::<Machine>().fetch_all(pool).await
    }

    pub async fn count(pool: &PgPool, filter: &MachineFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM machines");
        filter.push_where(&mut qb);

        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }
}
