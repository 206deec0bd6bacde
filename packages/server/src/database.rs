use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("image_store::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Fresh in-memory database for unit tests. A single pooled connection keeps
/// every query on the same SQLite memory instance.
#[cfg(test)]
pub(crate) async fn test_db() -> DatabaseConnection {
    init_db(&DatabaseConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
    })
    .await
    .expect("Failed to initialize in-memory database")
}
