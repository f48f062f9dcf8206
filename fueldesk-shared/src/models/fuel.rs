/// Fuel model: fuel types sold at the station and their unit price
///
/// # Schema
///
/// ```sql
/// CREATE TABLE fuels (
///     id BIGSERIAL PRIMARY KEY,
///     type VARCHAR(100) NOT NULL UNIQUE,
///     price DOUBLE PRECISION NOT NULL CHECK (price >= 0)
/// );
/// ```
///
/// Deleting a fuel deletes every machine that dispenses it.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

pub const SEARCH_FIELDS: &[&str] = &["type", "price"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Fuel {
    pub id: i64,

    /// Fuel type name, e.g. "Petrol" (unique)
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub fuel_type: String,

    /// Price per unit
    pub price: f64,
}

/// Input for creating a fuel, also used for full updates
#[derive(Debug, Clone)]
pub struct CreateFuel {
    pub fuel_type: String,
    pub price: f64,
}

pub type UpdateFuel = CreateFuel;

#[derive(Debug, Clone, Default)]
pub struct FuelFilter {
    pub id: Option<i64>,
    pub fuel_type: Option<String>,
    pub price: Option<f64>,
    pub search: Option<String>,
}

impl FuelFilter {
    fn push_where<'a>(&self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(id) = self.id {
            qb.push(" AND id = ").push_bind(id);
        }
        if let Some(fuel_type) = &self.fuel_type {
            qb.push(" AND type = ").push_bind(fuel_type.clone());
        }
        if let Some(price) = self.price {
            qb.push(" AND price = ").push_bind(price);
        }
        if let Some(term) = &self.search {
            super::push_search(qb, SEARCH_FIELDS, term);
        }
    }
}

impl Fuel {
    /// Inserts a fuel
    ///
    /// # Errors
    ///
    /// Unique violation on `fuels_type_key` when the type already exists.
    pub async fn create(pool: &PgPool, data: CreateFuel) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Fuel>(
            "INSERT INTO fuels (type, price) VALUES ($1, $2) RETURNING id, type, price",
        )
        .bind(data.fuel_type)
        .bind(data.price)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Fuel>("SELECT id, type, price FROM fuels WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads several fuels at once (order not guaranteed)
    pub async fn find_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Fuel>("SELECT id, type, price FROM fuels WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Replaces type and price. Returns `None` if the fuel doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateFuel,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Fuel>(
            "UPDATE fuels SET type = $2, price = $3 WHERE id = $1 RETURNING id, type, price",
        )
        .bind(id)
        .bind(data.fuel_type)
        .bind(data.price)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a fuel and, by cascade, its machines
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM fuels WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        pool: &PgPool,
        filter: &FuelFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id, type, price FROM fuels");
        filter.push_where(&mut qb);
        qb.push(" ORDER BY id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        qb.build_query_as::<Fuel>().fetch_all(pool).await
    }

    pub async fn count(pool: &PgPool, filter: &FuelFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM fuels");
        filter.push_where(&mut qb);

        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    /// Every fuel, for select widgets
    pub async fn all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Fuel>("SELECT id, type, price FROM fuels ORDER BY type")
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuel_serializes_type_field() {
        let fuel = Fuel {
            id: 1,
            fuel_type: "Diesel".to_string(),
            price: 94.5,
        };

        let json = serde_json::to_value(&fuel).unwrap();
        assert_eq!(json["type"], "Diesel");
        assert!(json.get("fuel_type").is_none());
    }

    #[test]
    fn test_filter_with_search() {
        let filter = FuelFilter {
            price: Some(100.0),
            search: Some("pet".to_string()),
            ..Default::default()
        };

        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM fuels");
        filter.push_where(&mut qb);
        let sql = qb.sql();

        assert!(sql.contains("price = $1"));
        assert!(sql.contains("CAST(type AS TEXT) ILIKE $2"));
    }
}
