//! Throwaway pantry databases for integration tests.
//!
//! All tests in a binary share one PostgreSQL server: the one named by
//! `PANTRY_TEST_PG_URL` when set, otherwise a `postgres:17` container started
//! on first use. Each [`PantryTestDb`] is a separate, freshly migrated
//! database on that server.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use pantry_db::models::{Category, InventoryItem, NewItem};
use pantry_db::pool::run_migrations;
use pantry_db::queries::items;

/// Where the shared server lives. Holding the container keeps it running
/// for the life of the test binary.
struct Server {
    url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<Server> = OnceCell::const_new();

async fn server() -> &'static Server {
    SERVER
        .get_or_init(|| async {
            if let Ok(url) = std::env::var("PANTRY_TEST_PG_URL") {
                return Server {
                    url: url.trim_end_matches('/').to_owned(),
                    _container: None,
                };
            }
            let container = Postgres::default()
                .with_tag("17")
                .start()
                .await
                .expect("postgres test container should start");
            let host = container.get_host().await.expect("container host");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("container port 5432");
            Server {
                url: format!("postgresql://postgres:postgres@{host}:{port}"),
                _container: Some(container),
            }
        })
        .await
}

async fn admin_connection() -> PgConnection {
    let url = format!("{}/postgres", server().await.url);
    PgConnection::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("cannot reach test server at {url}: {e}"))
}

/// One migrated, empty pantry database. Call [`PantryTestDb::teardown`] at
/// the end of the test.
pub struct PantryTestDb {
    pool: PgPool,
    name: String,
    url: String,
}

impl PantryTestDb {
    pub async fn create() -> Self {
        let name = format!("pantry_test_{}", Uuid::new_v4().simple());

        let mut admin = admin_connection().await;
        admin
            .execute(format!("CREATE DATABASE {name}").as_str())
            .await
            .unwrap_or_else(|e| panic!("cannot create {name}: {e}"));
        let _ = admin.close().await;

        let url = format!("{}/{name}", server().await.url);
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&url)
            .await
            .unwrap_or_else(|e| panic!("cannot connect to {name}: {e}"));
        run_migrations(&pool)
            .await
            .expect("pantry migrations apply to a fresh database");

        Self { pool, name, url }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Connection URL of this database, for code that builds its own pool.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Insert `(name, category, grams)` rows for `owner`, oldest first.
    pub async fn stock(&self, owner: &str, rows: &[(&str, Category, f64)]) -> Vec<InventoryItem> {
        let mut stocked = Vec::with_capacity(rows.len());
        for (name, category, grams) in rows {
            let new = NewItem::new(*name, category.clone(), *grams);
            let item = items::insert_item(&self.pool, owner, &new)
                .await
                .unwrap_or_else(|e| panic!("cannot stock {name} for {owner}: {e}"));
            stocked.push(item);
        }
        stocked
    }

    /// Close the pool and drop the database, kicking out stray sessions.
    pub async fn teardown(self) {
        self.pool.close().await;

        let mut admin = admin_connection().await;
        let _ = sqlx::query(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
             WHERE datname = $1 AND pid <> pg_backend_pid()",
        )
        .bind(&self.name)
        .execute(&mut admin)
        .await;
        let _ = admin
            .execute(format!("DROP DATABASE IF EXISTS {}", self.name).as_str())
            .await;
        let _ = admin.close().await;
    }
}
