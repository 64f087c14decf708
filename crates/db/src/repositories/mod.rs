use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use lunchly_core::domain::customer::{Customer, CustomerId};
use lunchly_core::domain::reservation::Reservation;
use lunchly_core::errors::ApplicationError;

pub mod customer;
pub mod memory;
pub mod reservation;

pub use customer::SqlCustomerRepository;
pub use memory::InMemoryReservationLookup;
pub use reservation::SqlReservationRepository;

/// Number of customers returned by a top-customer query when the caller does
/// not ask for a specific count.
pub const DEFAULT_TOP_CUSTOMER_LIMIT: u32 = 10;

/// The input a failed customer lookup was keyed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustomerLookup {
    ById(CustomerId),
    ByName { first_name: String, last_name: String },
}

impl fmt::Display for CustomerLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "{id}"),
            Self::ByName { first_name, last_name } => write!(f, "{first_name} {last_name}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("No such customer: {0}")]
    NotFound(CustomerLookup),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("seed conflict: {0}")]
    SeedConflict(String),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(_) => Self::NotFound(value.to_string()),
            RepositoryError::Database(_)
            | RepositoryError::Decode(_)
            | RepositoryError::SeedConflict(_) => {
                Self::Persistence(value.to_string())
            }
        }
    }
}

/// Read and write access to customer records.
///
/// Every call is a single round trip to storage; nothing is cached between
/// calls.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// All customers, ordered by last name then first name.
    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError>;

    /// Fails with [`RepositoryError::NotFound`] when no row has this id.
    async fn find_by_id(&self, id: CustomerId) -> Result<Customer, RepositoryError>;

    /// Case-insensitive substring match on `"first last"`. No match is an
    /// empty list, not an error.
    async fn search(&self, term: &str) -> Result<Vec<Customer>, RepositoryError>;

    /// Customers with at least one reservation, most reservations first.
    async fn top_by_reservation_count(&self, limit: u32)
        -> Result<Vec<Customer>, RepositoryError>;

    /// Exact match after upper-casing the first character of each name.
    async fn find_by_exact_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<Customer>, RepositoryError>;

    /// Inserts an unsaved customer and records the new id on it, or
    /// overwrites every field of a saved one.
    async fn save(&self, customer: &mut Customer) -> Result<(), RepositoryError>;

    async fn reservations(&self, customer: &Customer)
        -> Result<Vec<Reservation>, RepositoryError>;
}

#[async_trait]
pub trait ReservationLookup: Send + Sync {
    async fn reservations_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use lunchly_core::domain::customer::CustomerId;
    use lunchly_core::errors::ApplicationError;

    use super::{CustomerLookup, RepositoryError};

    #[test]
    fn not_found_message_names_the_lookup_key() {
        let by_id = RepositoryError::NotFound(CustomerLookup::ById(CustomerId(12)));
        assert_eq!(by_id.to_string(), "No such customer: 12");

        let by_name = RepositoryError::NotFound(CustomerLookup::ByName {
            first_name: "Cara".to_string(),
            last_name: "ng".to_string(),
        });
        assert_eq!(by_name.to_string(), "No such customer: Cara ng");
    }

    #[test]
    fn not_found_and_storage_failures_map_to_distinct_application_errors() {
        let not_found = RepositoryError::NotFound(CustomerLookup::ById(CustomerId(3)));
        assert!(not_found.is_not_found());
        assert_eq!(
            ApplicationError::from(not_found),
            ApplicationError::NotFound("No such customer: 3".to_string())
        );

        let storage = RepositoryError::Database(sqlx::Error::PoolClosed);
        assert!(!storage.is_not_found());
        assert!(matches!(ApplicationError::from(storage), ApplicationError::Persistence(_)));
    }
}
