use sqlx::{
    Error, Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::path::Path;

/// Create a SQLite connection pool
///
/// # Parameters
/// - `database_path`: location of the database file; created if missing
///
/// # Returns
/// A connection pool with max 5 connections
pub async fn get_connection(database_path: &Path) -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}
