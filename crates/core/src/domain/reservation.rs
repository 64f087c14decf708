use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub i64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub customer_id: CustomerId,
    pub start_at: DateTime<Utc>,
    pub num_guests: u32,
    pub notes: Option<String>,
}

/// A reservation that has not been written yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    pub customer_id: CustomerId,
    pub start_at: DateTime<Utc>,
    pub num_guests: u32,
    pub notes: Option<String>,
}
