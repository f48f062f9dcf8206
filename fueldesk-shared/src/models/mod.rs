/// Database models for FuelDesk
///
/// One module per table, each exposing the row struct, its create/update
/// inputs, a filter, and the CRUD queries.
///
/// - `user`: staff and operator accounts
/// - `fuel`: fuel types and unit prices
/// - `machine`: dispensing machines, each bound to one fuel
/// - `payment`: payment modes
/// - `creditor`: credit accounts, each bound to one payment mode
///
/// # Example
///
/// ```no_run
/// use fueldesk_shared::models::fuel::{CreateFuel, Fuel, FuelFilter};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let diesel = Fuel::create(&pool, CreateFuel {
///     fuel_type: "Diesel".to_string(),
///     price: 94.5,
/// })
/// .await?;
///
/// let page = Fuel::list(&pool, &FuelFilter::default(), 10, 0).await?;
/// # Ok(())
/// # }
/// ```

pub mod creditor;
pub mod fuel;
pub mod machine;
pub mod payment;
pub mod user;

use sqlx::{Postgres, QueryBuilder};

/// Appends a free-text search clause to a query that already has a `WHERE`.
///
/// The term is split on whitespace; every word must match at least one of
/// `columns` (case-insensitive substring, columns compared as text).
pub(crate) fn push_search<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    columns: &[&str],
    term: &str,
) {
    if columns.is_empty() {
        return;
    }

    for word in term.split_whitespace() {
        let pattern = format!("%{}%", escape_like(word));
        qb.push(" AND (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("CAST({} AS TEXT) ILIKE ", column));
            qb.push_bind(pattern.clone());
        }
        qb.push(")");
    }
}

fn escape_like(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    for c in word.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
