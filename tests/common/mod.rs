use sqlx::{Connection, PgConnection};
use tokio::sync::{Mutex, MutexGuard};

use ledger_api::db::Database;

static DB_GATE: Mutex<()> = Mutex::const_new(());

/// Serialize DB-backed tests: they share one database and the destructive
/// reset is global.
#[allow(dead_code)]
pub async fn db_lock() -> MutexGuard<'static, ()> {
    DB_GATE.lock().await
}

/// Connect to the test database, apply the schema, and wipe ledger state.
/// Returns `None` when `TEST_DATABASE_URL` is unset so DB-backed tests can
/// skip on machines without Postgres.
#[allow(dead_code)]
pub async fn setup_test_db() -> Option<Database> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;

    let mut conn = PgConnection::connect(&url)
        .await
        .expect("Failed to connect to test database");
    sqlx::raw_sql(include_str!("../../sql/init.sql"))
        .execute(&mut conn)
        .await
        .expect("Failed to apply schema");

    // Clean state for test isolation
    sqlx::raw_sql("DELETE FROM transactions; UPDATE accounts SET balance = 0;")
        .execute(&mut conn)
        .await
        .expect("Failed to clean tables");
    conn.close().await.ok();

    let db = Database::connect(&url, 2, 2)
        .await
        .expect("Failed to build command pools");
    Some(db)
}
