pub mod config;
pub mod domain;
pub mod errors;

pub use config::{
    discover_config_path, AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat,
};
pub use domain::customer::{capitalize_first, Customer, CustomerFields, CustomerId};
pub use domain::reservation::{NewReservation, Reservation, ReservationId};
pub use errors::{ApplicationError, InterfaceError};
