use chrono::{Duration, TimeZone, Utc};
use tracing::info;

use crate::connection::DbPool;
use crate::repositories::customer::search_name;
use crate::repositories::RepositoryError;

struct SeedCustomer {
    id: i64,
    label: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    phone: Option<&'static str>,
    notes: Option<&'static str>,
    reservation_count: i64,
}

/// Canonical demo customers. Ids are fixed so repeated loads are no-ops.
const SEED_CUSTOMERS: &[SeedCustomer] = &[
    SeedCustomer {
        id: 1,
        label: "customer-ann-lee",
        first_name: "Ann",
        last_name: "Lee",
        phone: Some("415-555-0101"),
        notes: Some("Prefers the window booth."),
        reservation_count: 2,
    },
    SeedCustomer {
        id: 2,
        label: "customer-bob-lee",
        first_name: "Bob",
        last_name: "Lee",
        phone: Some("415-555-0102"),
        notes: None,
        reservation_count: 4,
    },
    SeedCustomer {
        id: 3,
        label: "customer-cara-ng",
        first_name: "cara",
        last_name: "Ng",
        phone: None,
        notes: Some("Shellfish allergy."),
        reservation_count: 1,
    },
    SeedCustomer {
        id: 4,
        label: "customer-dev-okafor",
        first_name: "Dev",
        last_name: "Okafor",
        phone: Some("415-555-0104"),
        notes: None,
        reservation_count: 3,
    },
    SeedCustomer {
        id: 5,
        label: "customer-eve-adams",
        first_name: "Eve",
        last_name: "Adams",
        phone: None,
        notes: Some("Walk-in regular, never books."),
        reservation_count: 0,
    },
];

/// Demo customers with a spread of reservation counts, for exercising list,
/// search and top-customer queries against a fresh database.
pub struct SeedDataset;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedCustomerInfo {
    pub label: &'static str,
    pub full_name: String,
    pub reservation_count: i64,
}

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub customers_seeded: Vec<SeedCustomerInfo>,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl SeedDataset {
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        let first_sitting =
            Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).single().ok_or_else(|| {
                RepositoryError::Decode("seed base timestamp is not representable".to_string())
            })?;

        let mut reservation_id = 0_i64;
        for customer in SEED_CUSTOMERS {
            sqlx::query(
                "INSERT OR IGNORE INTO customers
                     (id, first_name, last_name, phone, notes, search_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(customer.id)
            .bind(customer.first_name)
            .bind(customer.last_name)
            .bind(customer.phone)
            .bind(customer.notes)
            .bind(search_name(customer.first_name, customer.last_name))
            .execute(&mut *tx)
            .await?;

            // The id may already belong to a customer created through the repository.
            let (first_name, last_name): (String, String) =
                sqlx::query_as("SELECT first_name, last_name FROM customers WHERE id = ?1")
                    .bind(customer.id)
                    .fetch_one(&mut *tx)
                    .await?;
            if first_name != customer.first_name || last_name != customer.last_name {
                tx.rollback().await?;
                return Err(RepositoryError::SeedConflict(format!(
                    "customer id {} is taken by `{first_name} {last_name}`, expected {}",
                    customer.id, customer.label
                )));
            }

            for sitting in 0..customer.reservation_count {
                reservation_id += 1;
                let start_at = first_sitting + Duration::days(sitting) + Duration::hours(customer.id);
                sqlx::query(
                    "INSERT OR IGNORE INTO reservations (id, customer_id, start_at, num_guests, notes)
                     VALUES (?1, ?2, ?3, ?4, NULL)",
                )
                .bind(reservation_id)
                .bind(customer.id)
                .bind(start_at.to_rfc3339())
                .bind(2 + sitting % 3)
                .execute(&mut *tx)
                .await?;

                let owner: i64 =
                    sqlx::query_scalar("SELECT customer_id FROM reservations WHERE id = ?1")
                        .bind(reservation_id)
                        .fetch_one(&mut *tx)
                        .await?;
                if owner != customer.id {
                    tx.rollback().await?;
                    return Err(RepositoryError::SeedConflict(format!(
                        "reservation id {reservation_id} belongs to customer {owner}, expected {}",
                        customer.label
                    )));
                }
            }
        }

        tx.commit().await?;

        let customers_seeded = SEED_CUSTOMERS
            .iter()
            .map(|customer| SeedCustomerInfo {
                label: customer.label,
                full_name: format!("{} {}", customer.first_name, customer.last_name),
                reservation_count: customer.reservation_count,
            })
            .collect::<Vec<_>>();

        info!(
            event_name = "db.seed.loaded",
            customer_count = customers_seeded.len(),
            reservation_count = reservation_id,
            "seed dataset loaded"
        );
        Ok(SeedResult { customers_seeded })
    }

    /// Checks each seeded customer row and its reservation count.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(SEED_CUSTOMERS.len());

        for customer in SEED_CUSTOMERS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customers
                               WHERE id = ?1 AND first_name = ?2 AND last_name = ?3)",
            )
            .bind(customer.id)
            .bind(customer.first_name)
            .bind(customer.last_name)
            .fetch_one(pool)
            .await?;

            let reservations: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM reservations WHERE customer_id = ?1")
                    .bind(customer.id)
                    .fetch_one(pool)
                    .await?;

            checks.push((customer.label, exists == 1 && reservations == customer.reservation_count));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use lunchly_core::domain::customer::{Customer, CustomerFields, CustomerId};
    use lunchly_core::domain::reservation::NewReservation;

    use super::SeedDataset;
    use crate::repositories::{
        CustomerRepository, RepositoryError, SqlCustomerRepository, SqlReservationRepository,
        DEFAULT_TOP_CUSTOMER_LIMIT,
    };
    use crate::{connect_with_settings, migrations};

    fn full_names(customers: &[Customer]) -> Vec<String> {
        customers.iter().map(Customer::full_name).collect()
    }

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn seed_loads_and_verifies() {
        let pool = setup().await;

        let result = SeedDataset::load(&pool).await.expect("load seed");
        let verification = SeedDataset::verify(&pool).await.expect("verify seed");

        assert_eq!(result.customers_seeded.len(), 5);
        assert!(verification.all_present, "checks: {:?}", verification.checks);
    }

    #[tokio::test]
    async fn seed_is_idempotent() {
        let pool = setup().await;

        SeedDataset::load(&pool).await.expect("first load");
        SeedDataset::load(&pool).await.expect("second load");

        let customers: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM customers")
            .fetch_one(&pool)
            .await
            .expect("count customers");
        let reservations: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM reservations")
            .fetch_one(&pool)
            .await
            .expect("count reservations");
        assert_eq!(customers, 5);
        assert_eq!(reservations, 10);
        assert!(SeedDataset::verify(&pool).await.expect("verify").all_present);
    }

    #[tokio::test]
    async fn verify_flags_missing_seed_rows() {
        let pool = setup().await;

        let verification = SeedDataset::verify(&pool).await.expect("verify empty database");

        assert!(!verification.all_present);
        assert!(verification.checks.iter().all(|(_, passed)| !passed));
    }

    #[tokio::test]
    async fn seed_refuses_ids_taken_by_other_customers() {
        let pool = setup().await;
        let repo = SqlCustomerRepository::new(pool.clone());
        let mut zed = Customer::new(CustomerFields::new("Zed", "Zimmer"));
        repo.save(&mut zed).await.expect("save customer");
        assert_eq!(zed.id(), Some(CustomerId(1)));

        let error = SeedDataset::load(&pool).await.expect_err("id 1 is taken");

        assert!(matches!(
            error,
            RepositoryError::SeedConflict(ref message) if message.contains("Zed Zimmer")
        ));
        assert!(repo.reservations(&zed).await.expect("reservations").is_empty());
        assert_eq!(full_names(&repo.list_all().await.expect("list")), vec!["Zed Zimmer"]);
    }

    #[tokio::test]
    async fn seed_refuses_reservation_ids_taken_by_other_customers() {
        let pool = setup().await;
        sqlx::query(
            "INSERT INTO customers (id, first_name, last_name, search_name)
             VALUES (100, 'Zed', 'Zimmer', 'zed zimmer')",
        )
        .execute(&pool)
        .await
        .expect("insert customer outside the seed id range");
        let booked = SqlReservationRepository::new(pool.clone())
            .insert(&NewReservation {
                customer_id: CustomerId(100),
                start_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid time"),
                num_guests: 2,
                notes: None,
            })
            .await
            .expect("book");
        assert_eq!(booked.0, 1);

        let error = SeedDataset::load(&pool).await.expect_err("reservation id 1 is taken");

        assert!(matches!(error, RepositoryError::SeedConflict(_)));
        let customers: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM customers")
            .fetch_one(&pool)
            .await
            .expect("count customers");
        assert_eq!(customers, 1, "rolled back seed must not leave seed customers behind");
    }

    #[tokio::test]
    async fn seeded_customers_are_searchable() {
        let pool = setup().await;
        SeedDataset::load(&pool).await.expect("load seed");
        let repo = SqlCustomerRepository::new(pool);

        let lees = repo.search("LEE").await.expect("search");
        assert_eq!(full_names(&lees), vec!["Ann Lee", "Bob Lee"]);
    }

    #[tokio::test]
    async fn seeded_top_customers_skip_walk_ins() {
        let pool = setup().await;
        SeedDataset::load(&pool).await.expect("load seed");
        let repo = SqlCustomerRepository::new(pool);

        let top = repo.top_by_reservation_count(DEFAULT_TOP_CUSTOMER_LIMIT).await.expect("top");

        assert_eq!(full_names(&top), vec!["Bob Lee", "Dev Okafor", "Ann Lee", "cara Ng"]);
    }
}
