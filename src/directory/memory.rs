//! In-process account directory.
//!
//! Seeded once at startup from configuration and never mutated afterwards.
//! Mirrors the contract of a database-backed store closely enough for the
//! lifecycle to be exercised end to end: lookups are refused until the schema
//! is migrated and after the handle is closed.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::config::DirectoryConfig;
use crate::directory::{Account, AccountDirectory, DirectoryError};

/// Schema version this build expects.
pub const SCHEMA_VERSION: u32 = 1;

/// Shared storage behind every handle of one directory.
#[derive(Debug, Default)]
struct Storage {
    /// handle → account
    by_handle: DashMap<String, Account>,
    /// did → handle
    by_did: DashMap<String, String>,
    schema_version: AtomicU32,
}

/// A read-only directory held in memory.
#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    storage: Arc<Storage>,
    closed: Arc<AtomicBool>,
    privileged: bool,
    require_privileged: bool,
}

impl MemoryDirectory {
    /// Create a runtime handle over the given accounts.
    ///
    /// With `require_privileged`, only a handle from
    /// [`MemoryDirectory::migration_handle`] may run migrations.
    pub fn new(accounts: Vec<Account>, require_privileged: bool) -> Self {
        let storage = Storage::default();
        for account in accounts {
            if let Some(previous) = storage.by_handle.insert(account.handle.clone(), account.clone()) {
                tracing::warn!(
                    handle = %account.handle,
                    previous_did = %previous.did,
                    did = %account.did,
                    "Duplicate handle in directory seed, keeping the later record"
                );
                storage.by_did.remove(&previous.did);
            }
            storage.by_did.insert(account.did, account.handle);
        }

        Self {
            storage: Arc::new(storage),
            closed: Arc::new(AtomicBool::new(false)),
            privileged: false,
            require_privileged,
        }
    }

    /// Build a directory from configuration, reading `accounts_path` if set.
    pub fn from_config(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let mut accounts = match &config.accounts_path {
            Some(path) => load_accounts(Path::new(path))?,
            None => Vec::new(),
        };
        accounts.extend(config.accounts.iter().cloned());

        tracing::info!(
            accounts = accounts.len(),
            privileged_migrations = config.privileged_migrations,
            "Account directory loaded"
        );

        Ok(Self::new(accounts, config.privileged_migrations))
    }

    /// Open a separate, migration-privileged handle over the same storage.
    ///
    /// Closing it does not affect the runtime handle.
    pub fn migration_handle(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            closed: Arc::new(AtomicBool::new(false)),
            privileged: true,
            require_privileged: self.require_privileged,
        }
    }

    /// Whether migrations must go through a privileged handle.
    pub fn requires_privileged_migrations(&self) -> bool {
        self.require_privileged
    }

    /// Number of accounts held.
    pub fn len(&self) -> usize {
        self.storage.by_handle.len()
    }

    /// Whether the directory holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.storage.by_handle.is_empty()
    }

    /// Whether this handle has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), DirectoryError> {
        if self.is_closed() {
            Err(DirectoryError::Closed)
        } else {
            Ok(())
        }
    }
}

fn load_accounts(path: &Path) -> Result<Vec<Account>, DirectoryError> {
    let content = fs::read_to_string(path)
        .map_err(|e| DirectoryError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| DirectoryError::Load(format!("{}: {}", path.display(), e)))
}

#[async_trait]
impl AccountDirectory for MemoryDirectory {
    async fn get_account(&self, identifier: &str) -> Result<Option<Account>, DirectoryError> {
        self.ensure_open()?;
        if self.storage.schema_version.load(Ordering::SeqCst) != SCHEMA_VERSION {
            return Err(DirectoryError::NotMigrated);
        }

        if identifier.starts_with("did:") {
            let handle = match self.storage.by_did.get(identifier) {
                Some(handle) => handle.value().clone(),
                None => return Ok(None),
            };
            return Ok(self.storage.by_handle.get(&handle).map(|a| a.value().clone()));
        }

        Ok(self
            .storage
            .by_handle
            .get(identifier)
            .map(|a| a.value().clone()))
    }

    async fn migrate_to_latest(&self) -> Result<(), DirectoryError> {
        self.ensure_open()?;
        if self.require_privileged && !self.privileged {
            return Err(DirectoryError::Unprivileged);
        }

        let previous = self
            .storage
            .schema_version
            .swap(SCHEMA_VERSION, Ordering::SeqCst);
        if previous == SCHEMA_VERSION {
            tracing::debug!(version = SCHEMA_VERSION, "Directory schema already current");
        } else {
            tracing::info!(from = previous, to = SCHEMA_VERSION, "Directory schema migrated");
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), DirectoryError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(DirectoryError::Closed);
        }
        tracing::debug!(privileged = self.privileged, "Directory handle closed");
        Ok(())
    }
}
