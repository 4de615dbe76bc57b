//! Audit Log Adapters
//!
//! Implements `AuditSink` as an in-memory document store and as a
//! JSON-lines file. Both store untyped documents and validate on load.

use crate::domain::{AuditRecord, LedgerError};
use crate::ports::outbound::AuditSink;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Parse stored documents, skipping malformed ones with a warning.
pub fn rehydrate(documents: &[Value]) -> Vec<AuditRecord> {
    documents
        .iter()
        .enumerate()
        .filter_map(|(pos, doc)| match AuditRecord::from_document(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("[ledger] skipping audit document {}: {}", pos, e);
                None
            }
        })
        .collect()
}

/// In-memory document collection.
#[derive(Default)]
pub struct InMemoryAuditLog {
    documents: RwLock<Vec<Value>>,
}

impl InMemoryAuditLog {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw document, bypassing validation.
    pub fn insert_document(&self, document: Value) {
        self.documents.write().push(document);
    }

    /// Number of stored documents, valid or not.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn record(&self, record: &AuditRecord) -> Result<(), LedgerError> {
        let doc = record.to_document()?;
        debug!("[ledger] audit record stored for {}", record.tx_id);
        self.documents.write().push(doc);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<AuditRecord>, LedgerError> {
        let docs = self.documents.read().clone();
        Ok(rehydrate(&docs))
    }
}

/// Append-only JSON-lines file, one document per line.
pub struct JsonLinesAuditLog {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonLinesAuditLog {
    /// Use `path`; the file is created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// File backing this log.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonLinesAuditLog {
    async fn record(&self, record: &AuditRecord) -> Result<(), LedgerError> {
        let mut line = serde_json::to_string(&record.to_document()?)
            .map_err(|e| LedgerError::Audit(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| LedgerError::Audit(format!("{}: {}", self.path.display(), e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| LedgerError::Audit(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| LedgerError::Audit(e.to_string()))?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<AuditRecord>, LedgerError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LedgerError::Audit(e.to_string())),
        };

        let mut documents = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(doc) => documents.push(doc),
                Err(e) => warn!(
                    "[ledger] skipping unparseable audit line {}: {}",
                    line_no + 1,
                    e
                ),
            }
        }
        Ok(rehydrate(&documents))
    }
}
