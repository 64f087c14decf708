use std::sync::Arc;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use lunchly_core::domain::customer::{capitalize_first, Customer, CustomerFields, CustomerId};
use lunchly_core::domain::reservation::Reservation;

use super::{
    CustomerLookup, CustomerRepository, RepositoryError, ReservationLookup,
    SqlReservationRepository,
};
use crate::DbPool;

const LIKE_ESCAPE: char = '\\';

pub struct SqlCustomerRepository {
    pool: DbPool,
    reservations: Arc<dyn ReservationLookup>,
}

impl SqlCustomerRepository {
    /// Reservations are read from the same database.
    pub fn new(pool: DbPool) -> Self {
        let reservations = Arc::new(SqlReservationRepository::new(pool.clone()));
        Self { pool, reservations }
    }

    pub fn with_reservation_lookup(pool: DbPool, reservations: Arc<dyn ReservationLookup>) -> Self {
        Self { pool, reservations }
    }
}

/// Maps a `customers` row onto a saved [`Customer`].
pub(crate) fn row_to_customer(row: &SqliteRow) -> Result<Customer, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let first_name: String =
        row.try_get("first_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let last_name: String =
        row.try_get("last_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let phone: Option<String> =
        row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Customer::saved(CustomerId(id), CustomerFields { first_name, last_name, phone, notes }))
}

/// Lowercased `"first last"` stored alongside each row. SQLite only folds
/// ASCII case in `LIKE`, so both sides are folded here with full Unicode rules.
pub(crate) fn search_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}").to_lowercase()
}

/// Wraps `term` for an unanchored `LIKE ... ESCAPE '\'` match, so `%` and `_`
/// in the term only ever match themselves.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if ch == LIKE_ESCAPE || ch == '%' || ch == '_' {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows: Vec<SqliteRow> = sqlx::query(
            "SELECT id, first_name, last_name, phone, notes
             FROM customers
             ORDER BY last_name, first_name",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(event_name = "db.customer.list_all", row_count = rows.len(), "listed customers");
        rows.iter().map(row_to_customer).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Customer, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, phone, notes
             FROM customers WHERE id = ?1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => row_to_customer(r),
            None => {
                debug!(event_name = "db.customer.not_found", customer_id = id.0, "no such customer");
                Err(RepositoryError::NotFound(CustomerLookup::ById(id)))
            }
        }
    }

    async fn search(&self, term: &str) -> Result<Vec<Customer>, RepositoryError> {
        let rows: Vec<SqliteRow> = sqlx::query(
            r"SELECT id, first_name, last_name, phone, notes
              FROM customers
              WHERE search_name LIKE ?1 ESCAPE '\'
              ORDER BY last_name, first_name",
        )
        .bind(contains_pattern(&term.to_lowercase()))
        .fetch_all(&self.pool)
        .await?;

        debug!(event_name = "db.customer.search", row_count = rows.len(), "searched customers");
        rows.iter().map(row_to_customer).collect::<Result<Vec<_>, _>>()
    }

    async fn top_by_reservation_count(
        &self,
        limit: u32,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let rows: Vec<SqliteRow> = sqlx::query(
            "SELECT c.id, c.first_name, c.last_name, c.phone, c.notes
             FROM customers AS c
             JOIN reservations AS r ON r.customer_id = c.id
             GROUP BY c.id
             ORDER BY COUNT(r.id) DESC
             LIMIT ?1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        debug!(
            event_name = "db.customer.top_by_reservation_count",
            limit,
            row_count = rows.len(),
            "ranked customers by reservation count"
        );
        rows.iter().map(row_to_customer).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_exact_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let first_name = capitalize_first(first_name);
        let last_name = capitalize_first(last_name);

        let rows: Vec<SqliteRow> = sqlx::query(
            "SELECT id, first_name, last_name, phone, notes
             FROM customers
             WHERE first_name = ?1 AND last_name = ?2
             ORDER BY id",
        )
        .bind(&first_name)
        .bind(&last_name)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            debug!(event_name = "db.customer.not_found", "no customer with exact name");
            return Err(RepositoryError::NotFound(CustomerLookup::ByName { first_name, last_name }));
        }

        rows.iter().map(row_to_customer).collect::<Result<Vec<_>, _>>()
    }

    async fn save(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        match customer.id() {
            None => {
                let fields = customer.fields();
                let id: i64 = sqlx::query_scalar(
                    "INSERT INTO customers (first_name, last_name, phone, notes, search_name)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     RETURNING id",
                )
                .bind(&fields.first_name)
                .bind(&fields.last_name)
                .bind(&fields.phone)
                .bind(&fields.notes)
                .bind(search_name(&fields.first_name, &fields.last_name))
                .fetch_one(&self.pool)
                .await?;

                customer.assign_id(CustomerId(id));
                debug!(event_name = "db.customer.inserted", customer_id = id, "customer inserted");
            }
            Some(id) => {
                let fields = customer.fields();
                sqlx::query(
                    "UPDATE customers
                     SET first_name = ?1,
                         last_name = ?2,
                         phone = ?3,
                         notes = ?4,
                         search_name = ?5
                     WHERE id = ?6",
                )
                .bind(&fields.first_name)
                .bind(&fields.last_name)
                .bind(&fields.phone)
                .bind(&fields.notes)
                .bind(search_name(&fields.first_name, &fields.last_name))
                .bind(id.0)
                .execute(&self.pool)
                .await?;

                debug!(event_name = "db.customer.updated", customer_id = id.0, "customer updated");
            }
        }

        Ok(())
    }

    async fn reservations(
        &self,
        customer: &Customer,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        match customer.id() {
            Some(id) => self.reservations.reservations_for_customer(id).await,
            None => Ok(Vec::new()),
        }
    }
}
