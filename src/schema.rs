// src/schema.rs
//! Embedded schema migrations.
//!
//! Migrations live in `migrations/` and are compiled into the binary. Each is
//! applied once, in ascending version order, inside its own transaction. The
//! ledger table `_sqlx_migrations` records what has been applied along with a
//! checksum of the script.

use std::collections::BTreeMap;
use std::fmt;

use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::SchemaError;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// A migration compiled into this binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownMigration {
    pub version: i64,
    pub description: String,
    pub checksum: Vec<u8>,
}

/// A row of the migration ledger.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub checksum: Vec<u8>,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Applied,
    Pending,
    /// Applied, but the embedded script no longer matches the recorded checksum.
    Modified,
    /// Applied in the database, absent from this binary.
    Unknown,
    /// Recorded as started but never completed.
    Failed,
}

impl MigrationState {
    pub fn is_drift(self) -> bool {
        matches!(
            self,
            MigrationState::Modified | MigrationState::Unknown | MigrationState::Failed
        )
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MigrationState::Applied => "applied",
            MigrationState::Pending => "pending",
            MigrationState::Modified => "modified",
            MigrationState::Unknown => "unknown",
            MigrationState::Failed => "failed",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub state: MigrationState,
}

pub fn migrator() -> &'static Migrator {
    &MIGRATOR
}

/// Up-migrations embedded in the binary, in version order.
pub fn known_migrations() -> Vec<KnownMigration> {
    migrations_of(migrator())
}

/// Up-migrations of any migrator, in version order.
pub fn migrations_of(migrator: &Migrator) -> Vec<KnownMigration> {
    let mut known: Vec<KnownMigration> = migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| KnownMigration {
            version: m.version,
            description: m.description.to_string(),
            checksum: m.checksum.to_vec(),
        })
        .collect();
    known.sort_by_key(|m| m.version);
    known
}

/// Compare embedded migrations against the ledger.
///
/// The result covers the union of both sides and is sorted by version.
pub fn reconcile(known: &[KnownMigration], applied: &[AppliedMigration]) -> Vec<MigrationStatus> {
    let applied_by_version: BTreeMap<i64, &AppliedMigration> =
        applied.iter().map(|a| (a.version, a)).collect();
    let mut statuses: BTreeMap<i64, MigrationStatus> = BTreeMap::new();

    for k in known {
        let state = match applied_by_version.get(&k.version) {
            None => MigrationState::Pending,
            Some(a) if !a.success => MigrationState::Failed,
            Some(a) if a.checksum != k.checksum => MigrationState::Modified,
            Some(_) => MigrationState::Applied,
        };
        statuses.insert(
            k.version,
            MigrationStatus {
                version: k.version,
                description: k.description.clone(),
                state,
            },
        );
    }

    for a in applied {
        statuses.entry(a.version).or_insert_with(|| MigrationStatus {
            version: a.version,
            description: a.description.clone(),
            state: MigrationState::Unknown,
        });
    }

    statuses.into_values().collect()
}

async fn ledger_exists(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Read the ledger. An uninitialised database has an empty ledger.
pub async fn applied_migrations(pool: &PgPool) -> Result<Vec<AppliedMigration>, sqlx::Error> {
    if !ledger_exists(pool).await? {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, AppliedMigration>(
        "SELECT version, description, checksum, success FROM _sqlx_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await
}

pub async fn status(pool: &PgPool) -> Result<Vec<MigrationStatus>, SchemaError> {
    status_with(migrator(), pool).await
}

pub async fn status_with(
    migrator: &Migrator,
    pool: &PgPool,
) -> Result<Vec<MigrationStatus>, SchemaError> {
    let applied = applied_migrations(pool).await?;
    Ok(reconcile(&migrations_of(migrator), &applied))
}

/// Apply every pending embedded migration and return the versions applied
/// by this call.
pub async fn run(pool: &PgPool) -> Result<Vec<i64>, SchemaError> {
    run_with(migrator(), pool).await
}

/// Apply `migrator`'s pending migrations.
///
/// Refuses to run when the ledger disagrees with the scripts. A migration
/// that fails leaves neither its changes nor a successful ledger row behind;
/// the ones before it stay applied.
pub async fn run_with(migrator: &Migrator, pool: &PgPool) -> Result<Vec<i64>, SchemaError> {
    let before = status_with(migrator, pool).await?;

    let drift: Vec<i64> = before
        .iter()
        .filter(|s| s.state.is_drift())
        .map(|s| s.version)
        .collect();
    if !drift.is_empty() {
        for s in before.iter().filter(|s| s.state.is_drift()) {
            warn!(version = s.version, state = %s.state, description = %s.description, "migration drift");
        }
        return Err(SchemaError::Drift(drift));
    }

    let pending: Vec<&MigrationStatus> = before
        .iter()
        .filter(|s| s.state == MigrationState::Pending)
        .collect();
    if pending.is_empty() {
        info!("schema is up to date");
        return Ok(Vec::new());
    }

    if let Err(e) = migrator.run(pool).await {
        warn!(error = %e, "migration failed");
        return Err(e.into());
    }

    for s in &pending {
        info!(version = s.version, description = %s.description, "applied migration");
    }
    Ok(pending.into_iter().map(|s| s.version).collect())
}
