//! Rating store test utilities.

use sqlx::{Pool, Postgres as SqlxPostgres, Sqlite};
use std::sync::Arc;
use tally_store::{PostgresStore, RatingStore, SqliteStore, StoreError, StoreResult};
use tempfile::TempDir;
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;

/// Stable prefix for Docker/container startup failures in Postgres test setup.
pub const POSTGRES_CONTAINER_START_ERR_PREFIX: &str = "postgres-container-start:";

/// A SQLite test store that removes its database on drop.
#[allow(dead_code)]
pub struct TestStore {
    pub store: Arc<dyn RatingStore>,
    pub(crate) sqlite_store: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestStore {
    pub async fn new() -> StoreResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("ratings.db");
        let arc_store = Arc::new(SqliteStore::new(&db_path).await?);

        Ok(Self {
            store: arc_store.clone(),
            sqlite_store: arc_store,
            _temp_dir: temp_dir,
        })
    }

    pub fn store(&self) -> Arc<dyn RatingStore> {
        self.store.clone()
    }

    /// Raw pool access for seeding states the public API cannot produce.
    pub fn pool(&self) -> &Pool<Sqlite> {
        self.sqlite_store.pool()
    }
}

/// PostgreSQL test store backed by a testcontainer.
#[allow(dead_code)]
pub struct PostgresTestStore {
    pub store: Arc<dyn RatingStore>,
    pub(crate) postgres_store: Arc<PostgresStore>,
    _container: ContainerAsync<Postgres>,
}

#[allow(dead_code)]
impl PostgresTestStore {
    pub async fn new() -> StoreResult<Self> {
        let container = Postgres::default()
            .with_tag("15-alpine")
            .start()
            .await
            .map_err(|e| {
                StoreError::Internal(format!(
                    "{} Failed to start PostgreSQL container: {e}",
                    POSTGRES_CONTAINER_START_ERR_PREFIX
                ))
            })?;

        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get port");

        // Default credentials from testcontainers-modules postgres
        let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

        let arc_store = Arc::new(PostgresStore::from_url(&url, 5, None).await?);

        Ok(Self {
            store: arc_store.clone(),
            postgres_store: arc_store,
            _container: container,
        })
    }

    pub fn store(&self) -> Arc<dyn RatingStore> {
        self.store.clone()
    }

    pub fn pool(&self) -> &Pool<SqlxPostgres> {
        self.postgres_store.pool()
    }
}

/// Run a test against both SQLite and PostgreSQL backends.
#[allow(dead_code)]
pub async fn run_store_test_both<F, Fut>(test_fn: F)
where
    F: Fn(Arc<dyn RatingStore>) -> Fut + Clone,
    Fut: std::future::Future<Output = ()>,
{
    let sqlite = TestStore::new()
        .await
        .expect("Failed to create SQLite test store");
    test_fn.clone()(sqlite.store()).await;

    // PostgreSQL requires Docker
    if std::env::var("SKIP_POSTGRES_TESTS").is_err() {
        match PostgresTestStore::new().await {
            Ok(postgres) => {
                test_fn(postgres.store()).await;
            }
            Err(err) => {
                eprintln!("Skipping PostgreSQL store tests: {err}");
            }
        }
    }
}
