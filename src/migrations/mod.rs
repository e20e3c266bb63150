// Schema migrations, embedded in the binary and applied at startup

pub mod diesel;

use std::error::Error;
use tracing::{error, info};

use crate::app_config::AppConfig;

/// Apply pending migrations unless DISABLE_EMBEDDED_MIGRATIONS is set
pub async fn run_all_migrations(config: &AppConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    if config.disable_embedded_migrations {
        info!("[MIGRATIONS] Skipping embedded migrations (disabled in config)");
        return Ok(());
    }

    info!(
        "[MIGRATIONS] Starting migration process for environment: {}",
        config.server.environment
    );

    match diesel::run_migrations(&config.database.url).await {
        Ok(0) => info!("[MIGRATIONS] Diesel migrations up to date"),
        Ok(applied) => info!("[MIGRATIONS] Applied {} Diesel migrations", applied),
        Err(e) => {
            error!("[MIGRATIONS] Diesel migration failed: {}", e);
            return Err(format!("Diesel migration failed: {}", e).into());
        },
    }

    Ok(())
}
