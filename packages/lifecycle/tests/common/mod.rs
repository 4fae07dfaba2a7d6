use std::sync::LazyLock;

use tokio::runtime::{Builder, Runtime};
use tokio::sync::{Mutex, MutexGuard};

use db::{DbConfig, DbError};

static TEST_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// A dedicated, process-lived runtime that owns the embedded database
/// connection.
///
/// SurrealDB's in-memory engine spawns a background router task when it
/// connects. If that task is spawned on a per-test `#[tokio::test]` runtime it
/// is cancelled the moment that test's runtime is dropped, and every later
/// test in the binary then talks to a closed channel. Pinning the connection
/// to this never-dropped runtime keeps the router alive for the whole test
/// binary; queries issued from each test's own runtime reach it over channels.
static DB_RT: LazyLock<Runtime> =
    LazyLock::new(|| Builder::new_multi_thread().enable_all().build().unwrap());

pub async fn setup_db() -> Result<MutexGuard<'static, ()>, DbError> {
    let guard = TEST_LOCK.lock().await;
    DB_RT
        .spawn(async {
            db::init(DbConfig::memory()).await?;
            let db_conn = db::get_db()?;
            db_conn.query("DELETE print_job; DELETE shop;").await?;
            Ok::<(), DbError>(())
        })
        .await
        .expect("db setup task panicked")?;
    Ok(guard)
}
