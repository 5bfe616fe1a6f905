//! Schema versioning for the local store.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The schema version this build writes.
pub const CURRENT_VERSION: i32 = 1;

const VERSION_KEY: &str = "schema_version";

/// Create missing tables and bring the store up to [`CURRENT_VERSION`].
///
/// A store written by a newer build is refused rather than downgraded.
///
/// # Errors
///
/// Returns [`Error::DatabaseMigration`] for an unreadable or newer version.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let stored = stored_version(conn)?;
    match stored {
        v if v == CURRENT_VERSION => Ok(()),
        v if v > CURRENT_VERSION => Err(Error::DatabaseMigration {
            message: format!("store was written by schema version {v}, newest known is {CURRENT_VERSION}"),
        }),
        v => {
            for next in v + 1..=CURRENT_VERSION {
                migrate_to(conn, next)?;
            }
            debug!(from = v, to = CURRENT_VERSION, "Store schema upgraded");
            Ok(())
        }
    }
}

/// The recorded schema version; 0 for a fresh store.
fn stored_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    value.map_or(Ok(0), |v| {
        v.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("unreadable schema version '{v}'"),
        })
    })
}

fn record_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

fn migrate_to(conn: &Connection, version: i32) -> Result<()> {
    match version {
        // The settings table is created by SCHEMA_STATEMENTS.
        1 => record_version(conn, 1),
        _ => Err(Error::DatabaseMigration {
            message: format!("no migration to schema version {version}"),
        }),
    }
}
