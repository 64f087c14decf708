use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use lunchly_core::domain::customer::CustomerId;
use lunchly_core::domain::reservation::{NewReservation, Reservation, ReservationId};

use super::{RepositoryError, ReservationLookup};
use crate::DbPool;

pub struct SqlReservationRepository {
    pool: DbPool,
}

impl SqlReservationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, reservation: &NewReservation) -> Result<ReservationId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO reservations (customer_id, start_at, num_guests, notes)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id",
        )
        .bind(reservation.customer_id.0)
        .bind(reservation.start_at.to_rfc3339())
        .bind(i64::from(reservation.num_guests))
        .bind(&reservation.notes)
        .fetch_one(&self.pool)
        .await?;

        debug!(
            event_name = "db.reservation.inserted",
            reservation_id = id,
            customer_id = reservation.customer_id.0,
            "reservation inserted"
        );
        Ok(ReservationId(id))
    }
}

fn row_to_reservation(row: &SqliteRow) -> Result<Reservation, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_id: i64 =
        row.try_get("customer_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let start_at_str: String =
        row.try_get("start_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let num_guests: i64 =
        row.try_get("num_guests").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let start_at = DateTime::parse_from_rfc3339(&start_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("reservation {id} start_at: {e}")))?;
    let num_guests = u32::try_from(num_guests)
        .map_err(|e| RepositoryError::Decode(format!("reservation {id} num_guests: {e}")))?;

    Ok(Reservation {
        id: ReservationId(id),
        customer_id: CustomerId(customer_id),
        start_at,
        num_guests,
        notes,
    })
}

#[async_trait::async_trait]
impl ReservationLookup for SqlReservationRepository {
    async fn reservations_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let rows: Vec<SqliteRow> = sqlx::query(
            "SELECT id, customer_id, start_at, num_guests, notes
             FROM reservations
             WHERE customer_id = ?1
             ORDER BY start_at",
        )
        .bind(customer_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reservation).collect::<Result<Vec<_>, _>>()
    }
}
