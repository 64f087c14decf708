use lunchly_core::config::LoadOptions;
use lunchly_db::{SeedCustomerInfo, SeedDataset};
use tracing::info;

use crate::commands::{with_migrated_pool, CommandResult};

pub fn run(options: &LoadOptions) -> CommandResult {
    let result = with_migrated_pool(options, |pool| async move {
        let seeded = SeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = SeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        if verification.all_present {
            Ok(seeded.customers_seeded)
        } else {
            let failed_checks: Vec<&str> = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect();
            Err(("seed_verification", verification_failure_message(&failed_checks), 6u8))
        }
    });

    match result {
        Ok(customers) => {
            info!(event_name = "cli.seed.loaded", customer_count = customers.len(), "seed loaded");
            CommandResult::success("seed", render_summary(&customers))
        }
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

fn verification_failure_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

fn render_summary(customers: &[SeedCustomerInfo]) -> String {
    let lines: Vec<String> = customers
        .iter()
        .map(|c| format!("  - {}: {} ({} reservations)", c.label, c.full_name, c.reservation_count))
        .collect();
    format!("Seed dataset loaded {} customers:\n{}", customers.len(), lines.join("\n"))
}
