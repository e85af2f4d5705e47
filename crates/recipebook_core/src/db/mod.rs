//! SQLite bootstrap for the bundled document store.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing document collections.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Collections must not read/write documents before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Failure to bring a document store connection to a usable state.
#[derive(Debug)]
pub enum BootstrapError {
    /// SQLite could not open or configure the connection.
    Connect {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// `PRAGMA user_version` could not be read.
    SchemaVersion(rusqlite::Error),
    /// Migration `version` failed; the store stays at its previous version.
    Migrate {
        version: u32,
        source: rusqlite::Error,
    },
    /// The store was written by a newer recipebook schema.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect { mode, source } => {
                write!(f, "failed to open {mode} document store: {source}")
            }
            Self::SchemaVersion(source) => {
                write!(f, "failed to read document store schema version: {source}")
            }
            Self::Migrate { version, source } => {
                write!(f, "document store migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "document store schema version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect { source, .. } | Self::Migrate { source, .. } => Some(source),
            Self::SchemaVersion(source) => Some(source),
            Self::SchemaTooNew { .. } => None,
        }
    }
}
