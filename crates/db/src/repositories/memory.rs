use std::collections::HashMap;

use tokio::sync::RwLock;

use lunchly_core::domain::customer::CustomerId;
use lunchly_core::domain::reservation::{NewReservation, Reservation, ReservationId};

use super::{RepositoryError, ReservationLookup};

/// Reservation source kept in process memory, keyed by customer.
#[derive(Default)]
pub struct InMemoryReservationLookup {
    state: RwLock<InMemoryReservations>,
}

#[derive(Default)]
struct InMemoryReservations {
    next_id: i64,
    by_customer: HashMap<CustomerId, Vec<Reservation>>,
}

impl InMemoryReservationLookup {
    pub async fn add(&self, reservation: NewReservation) -> Reservation {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let stored = Reservation {
            id: ReservationId(state.next_id),
            customer_id: reservation.customer_id,
            start_at: reservation.start_at,
            num_guests: reservation.num_guests,
            notes: reservation.notes,
        };
        state.by_customer.entry(stored.customer_id).or_default().push(stored.clone());
        stored
    }
}

#[async_trait::async_trait]
impl ReservationLookup for InMemoryReservationLookup {
    async fn reservations_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let state = self.state.read().await;
        let mut reservations = state.by_customer.get(&customer_id).cloned().unwrap_or_default();
        reservations.sort_by_key(|reservation| reservation.start_at);
        Ok(reservations)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use lunchly_core::domain::customer::CustomerId;
    use lunchly_core::domain::reservation::NewReservation;

    use crate::repositories::{InMemoryReservationLookup, ReservationLookup};

    #[tokio::test]
    async fn in_memory_lookup_returns_reservations_by_start() {
        let lookup = InMemoryReservationLookup::default();
        let late = Utc.with_ymd_and_hms(2024, 3, 2, 20, 0, 0).single().expect("valid time");
        let early = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("valid time");

        let second = lookup
            .add(NewReservation { customer_id: CustomerId(1), start_at: late, num_guests: 2, notes: None })
            .await;
        let first = lookup
            .add(NewReservation { customer_id: CustomerId(1), start_at: early, num_guests: 3, notes: None })
            .await;
        lookup
            .add(NewReservation { customer_id: CustomerId(2), start_at: early, num_guests: 4, notes: None })
            .await;

        let found = lookup.reservations_for_customer(CustomerId(1)).await.expect("lookup");

        assert_eq!(found, vec![first, second]);
        assert_ne!(found[0].id, found[1].id);
    }

    #[tokio::test]
    async fn in_memory_lookup_is_empty_for_unknown_customer() {
        let lookup = InMemoryReservationLookup::default();

        let found = lookup.reservations_for_customer(CustomerId(9)).await.expect("lookup");

        assert!(found.is_empty());
    }
}
