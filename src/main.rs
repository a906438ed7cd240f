//! Bootstrap entrypoint: initializes logging, loads configuration, connects
//! to the store, and creates the schema. The request-serving layer is a
//! separate concern and mounts the `trackvault` library on top of the
//! database this prepares.

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trackvault::{config, errors::Result};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the token-economy configuration
    let economy = config::economy::load_or_default()?;
    info!(
        signup_bonus = economy.signup_bonus,
        packages = economy.packages.len(),
        "Economy configuration loaded."
    );

    // 4. Initialize the database
    let db = config::database::create_connection().await?;
    config::database::create_tables(&db).await?;
    info!(url = %config::database::get_database_url(), "Ledger store initialized.");

    Ok(())
}
