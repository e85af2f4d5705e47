//! Document-store schema migrations.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - All pending steps commit together; the stored version only moves forward.

use crate::db::{BootstrapError, BootstrapResult};
use log::{debug, info};
use rusqlite::Connection;

/// One schema step, identified by the `user_version` it leaves behind.
struct SchemaStep {
    version: u32,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Returns the schema version this build writes and expects.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// A store already at the latest version is left untouched. A store newer
/// than this build is rejected without changes.
pub fn apply_migrations(conn: &mut Connection) -> BootstrapResult<()> {
    let found = current_user_version(conn).map_err(BootstrapError::SchemaVersion)?;
    let supported = latest_version();
    debug!("event=db_migrate module=db status=check found={found} supported={supported}");

    if found > supported {
        return Err(BootstrapError::SchemaTooNew { found, supported });
    }
    if found == supported {
        return Ok(());
    }

    let migrate_error =
        |version: u32| move |source: rusqlite::Error| BootstrapError::Migrate { version, source };
    let tx = conn.transaction().map_err(migrate_error(supported))?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > found) {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(migrate_error(step.version))?;
        debug!(
            "event=db_migrate module=db status=step version={}",
            step.version
        );
    }
    tx.commit().map_err(migrate_error(supported))?;

    info!("event=db_migrate module=db status=ok from={found} to={supported}");
    Ok(())
}

/// Reads the schema version recorded on the connection.
pub fn current_user_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
}
