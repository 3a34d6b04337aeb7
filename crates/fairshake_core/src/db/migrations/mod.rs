//! Numbered schema scripts for the assessment store.
//!
//! 1 creates authors, the catalog (projects, digital objects, rubrics,
//! metrics and their link tables), assessments and answers.
//! 2 adds assessment requests.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "catalog_and_assessments",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "assessment_requests",
        sql: include_str!("0002_assessment_requests.sql"),
    },
];

/// Highest schema version this build can create.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Version recorded in the store.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings the store up to [`latest_version`] in one transaction.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        let script = format!(
            "{}\nPRAGMA user_version = {};",
            migration.sql, migration.version
        );
        tx.execute_batch(&script)
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from={} to={} applied={}",
        from,
        latest,
        pending.len()
    );
    Ok(())
}
