//! `kv_store` schema migrations.
//!
//! Each migration runs in its own transaction together with the
//! `user_version` bump, so an interrupted upgrade resumes at the first
//! migration that did not commit.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "kv_store",
    sql: include_str!("0001_kv_store.sql"),
}];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the schema version stored in the connection's database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(DbError::SchemaRead)
}

/// Brings the schema up to `latest_version`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    for migration in MIGRATIONS.iter().filter(|migration| migration.version > found) {
        run_migration(conn, migration)?;
    }
    Ok(())
}

fn run_migration(conn: &mut Connection, migration: &Migration) -> DbResult<()> {
    let failed = |source| DbError::Migration {
        version: migration.version,
        name: migration.name,
        source,
    };

    let tx = conn.transaction().map_err(failed)?;
    tx.execute_batch(migration.sql).map_err(failed)?;
    tx.pragma_update(None, "user_version", migration.version)
        .map_err(failed)?;
    tx.commit().map_err(failed)?;

    info!(
        "event=db_migrate module=db status=ok version={} name={}",
        migration.version, migration.name
    );
    Ok(())
}
