//! Account directory subsystem.
//!
//! The gateway never owns account data. It consumes a lookup capability
//! through the [`AccountDirectory`] trait and drives the backend's schema
//! migration and teardown from the lifecycle layer.
//!
//! # Data Flow
//! ```text
//! startup.rs  → migrate_to_latest() (runtime or privileged handle)
//! resolver    → get_account(identifier)   (concurrent, read-only)
//! shutdown.rs → close()                   (once)
//! ```

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryDirectory;

/// An account as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable, store-assigned identifier.
    pub did: String,
    /// Human-readable handle.
    pub handle: String,
}

/// Errors surfaced by a directory backend.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory schema has not been migrated")]
    NotMigrated,

    #[error("directory handle is closed")]
    Closed,

    #[error("migrations require a privileged handle")]
    Unprivileged,

    #[error("failed to load accounts: {0}")]
    Load(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Read capability over the external account store.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Look up an account by handle or did.
    async fn get_account(&self, identifier: &str) -> Result<Option<Account>, DirectoryError>;

    /// Bring the backing schema up to date.
    async fn migrate_to_latest(&self) -> Result<(), DirectoryError>;

    /// Release the handle. Lookups fail afterwards.
    async fn close(&self) -> Result<(), DirectoryError>;
}
