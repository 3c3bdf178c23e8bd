//! Shared Postgres fixture for integration tests.
//!
//! Tests that need a database read `TEST_DATABASE_URL`; when it is unset
//! they return early, unless `REQUIRE_DB` is set, in which case they fail.
//! Each fixture works in its own schema so tests can run in parallel against
//! one database.

#![allow(dead_code)]

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use uuid::Uuid;

pub struct TestDb {
    pub pool: PgPool,
    admin: PgPool,
    schema: String,
}

/// Whether a `REQUIRE_DB` value asks for database tests to be mandatory.
pub fn flag_enabled(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        Some(v) => !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"),
        None => false,
    }
}

fn db_required() -> bool {
    flag_enabled(std::env::var("REQUIRE_DB").ok().as_deref())
}

/// A fresh, empty schema, or `None` when no test database is configured.
pub async fn test_db() -> Option<TestDb> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            if db_required() {
                panic!("REQUIRE_DB is set but TEST_DATABASE_URL is not");
            }
            eprintln!("skipping: TEST_DATABASE_URL not set");
            return None;
        }
    };

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");

    let schema = format!("poll_test_{}", Uuid::new_v4().simple());
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await
        .expect("failed to create test schema");

    let options = PgConnectOptions::from_str(&url)
        .expect("invalid TEST_DATABASE_URL")
        .options([("search_path", schema.as_str())]);
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .expect("failed to connect test pool");

    Some(TestDb {
        pool,
        admin,
        schema,
    })
}

/// A fresh schema with every migration applied.
pub async fn migrated_db() -> Option<TestDb> {
    let db = test_db().await?;
    poll_schema::schema::run(&db.pool)
        .await
        .expect("migrations failed");
    Some(db)
}

impl TestDb {
    pub async fn teardown(self) {
        self.pool.close().await;
        let _ = sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await;
        self.admin.close().await;
    }
}
