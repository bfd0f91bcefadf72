pub mod db;

pub mod order_items;
pub mod orders;
pub mod products;

use std::{env, fs, str::FromStr};

pub use db::SqliteDatabase;
use log::{debug, info};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::traits::StorefrontDbError;

const SQLITE_DB_URL: &str = "sqlite://data/storefront.db";

pub fn db_url() -> String {
    let result = env::var("SFP_DATABASE_URL").unwrap_or_else(|_| {
        info!("SFP_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// Opens a pool on `url`, creating the database file (and its directory) if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, StorefrontDbError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    if let Some(dir) = options.clone().get_filename().parent().filter(|d| !d.as_os_str().is_empty() && !d.exists()) {
        debug!("🗃️ Creating database directory {}", dir.display());
        fs::create_dir_all(dir).map_err(|e| StorefrontDbError::DatabaseError(e.to_string()))?;
    }
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
