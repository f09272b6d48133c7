use licibot_core::config::{AppConfig, LoadOptions};
use licibot_db::{connect_with_settings, SeedDataset};

use super::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("seed", "config", error.to_string(), 78),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("seed", "runtime", error.to_string(), 70),
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return CommandResult::failure("seed", "database", error.to_string(), 69)
            }
        };

        let result = SeedDataset::load(&pool).await;
        pool.close().await;

        match result {
            Ok(summary) => CommandResult::success(
                "seed",
                format!(
                    "seeded {} licitaciones, {} adjudicaciones, {} contratos, {} consorcios into `{}`",
                    summary.licitaciones,
                    summary.adjudicaciones,
                    summary.contratos,
                    summary.consorcios,
                    config.database.url,
                ),
            ),
            Err(error) => CommandResult::failure("seed", "database", error.to_string(), 69),
        }
    })
}
