use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;

pub mod migrations;
pub mod models;
pub mod repositories;

use models::RevisionError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Per-connection pragmas. Concurrent writers wait on the lock instead of
/// failing immediately with SQLITE_BUSY.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Builds the pool and makes sure the schema exists
pub fn build_pool(database_url: &str, max_size: u32) -> Result<DbPool, RevisionError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout_ms: 5_000,
        }))
        .build(manager)?;

    let mut conn = pool.get()?;
    conn.batch_execute(migrations::SCHEMA)?;
    log::info!("Database ready at {}", database_url);

    Ok(pool)
}

#[cfg(test)]
pub fn test_pool() -> (tempfile::TempDir, DbPool) {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("revisions.db");
    let pool = build_pool(path.to_str().expect("utf-8 path"), 4).expect("pool");
    (dir, pool)
}
