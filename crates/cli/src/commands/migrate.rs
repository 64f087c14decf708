use lunchly_core::config::LoadOptions;
use tracing::info;

use crate::commands::{with_migrated_pool, CommandResult};

/// Applies pending migrations. Every command does this before touching the
/// database; `migrate` does nothing else.
pub fn run(options: &LoadOptions) -> CommandResult {
    match with_migrated_pool(options, |_pool| async { Ok(()) }) {
        Ok(()) => {
            info!(event_name = "cli.migrate.applied", "applied pending migrations");
            CommandResult::success("migrate", "applied pending migrations")
        }
        Err(failure) => CommandResult::from_failure("migrate", failure),
    }
}
