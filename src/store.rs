use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::model::{
    BankAccount, BankTransaction, Group, Invitation, Settlement, Transaction, User,
};

/// The whole persisted state of the application. Missing collections in the
/// file deserialize to empty, unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Database {
    pub users: Vec<User>,
    pub transactions: Vec<Transaction>,
    pub groups: Vec<Group>,
    pub settlements: Vec<Settlement>,
    pub invitations: Vec<Invitation>,
    pub bank_accounts: Vec<BankAccount>,
    pub bank_transactions: Vec<BankTransaction>,
}

/// Flat JSON document store standing in for a real datastore. Every request
/// reads the file in full and writes it back in full. File access is
/// serialized so a write never interleaves with another; read-modify-write
/// cycles are not coordinated, so concurrent writers race and the last write
/// wins.
#[derive(Clone)]
pub struct Store {
    path: Arc<PathBuf>,
    file_lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            file_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data directory and an empty database file when missing.
    pub async fn init(&self) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        if !self.path.exists() {
            self.persist(&Database::default()).await?;
        }
        Ok(())
    }

    /// Read a full snapshot. A missing file is an empty database; a file
    /// that exists but does not parse is an error, not a silent reset.
    pub async fn read(&self) -> Result<Database> {
        let _guard = self.file_lock.lock().await;
        if !self.path.exists() {
            return Ok(Database::default());
        }
        let raw = tokio::fs::read_to_string(self.path.as_ref())
            .await
            .with_context(|| format!("read database file {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parse database file {}", self.path.display()))
    }

    /// Replace the database file with the given snapshot.
    pub async fn write(&self, db: &Database) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        self.persist(db).await
    }

    async fn persist(&self, db: &Database) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("create data directory {}", dir.display()))?;
            }
        }
        let raw = serde_json::to_string_pretty(db).context("serialize database")?;
        tokio::fs::write(self.path.as_ref(), raw)
            .await
            .with_context(|| format!("write database file {}", self.path.display()))
    }
}
