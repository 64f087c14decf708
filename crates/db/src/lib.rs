pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{SeedCustomerInfo, SeedDataset, SeedResult, VerificationResult};
pub use repositories::{
    CustomerLookup, CustomerRepository, InMemoryReservationLookup, RepositoryError,
    ReservationLookup, SqlCustomerRepository, SqlReservationRepository,
    DEFAULT_TOP_CUSTOMER_LIMIT,
};
