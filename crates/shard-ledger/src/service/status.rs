//! # Transaction Status Tracking
//!
//! Status map with forward-only transitions, a completion notifier and the
//! transaction id generator.

use crate::domain::{LedgerError, TxId, TxKind, TxStatus, TxStatusView};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::trace;

/// Issues `tx-<unix-nanos>` ids, strictly increasing within the process.
#[derive(Debug, Default)]
pub struct TxIdGenerator {
    last: AtomicU64,
}

impl TxIdGenerator {
    /// Create a generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id.
    pub fn next_id(&self) -> TxId {
        let now = chrono::Utc::now()
            .timestamp_nanos_opt()
            .map(|n| n.max(0) as u64)
            .unwrap_or(0);
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return format!("tx-{}", candidate),
                Err(actual) => last = actual,
            }
        }
    }
}

/// Who drives a transaction to its terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxOrigin {
    /// Queued by `submit_transaction` or a batch.
    Pipeline,
    /// Registered by its first caller-driven segment.
    Caller,
    /// Staged by the deadlock simulation; never finalized.
    Staged,
}

#[derive(Clone, Debug)]
struct StatusEntry {
    status: TxStatus,
    origin: TxOrigin,
    kind: Option<TxKind>,
    payload: Option<String>,
    registered_ms: u64,
    // First GC pass that saw the entry terminal.
    terminal_seen_ms: Option<u64>,
}

/// Per-transaction status.
///
/// Terminal entries are kept for at least the configured retention so
/// repeated queries return the same answer, then dropped by
/// [`StatusTracker::sweep_terminal`].
#[derive(Debug, Default)]
pub struct StatusTracker {
    entries: Mutex<HashMap<TxId, StatusEntry>>,
    terminal: Notify,
}

impl StatusTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tx_id` as pending. Returns false if it was already known.
    pub fn insert_pending(&self, tx_id: &str, origin: TxOrigin, now_ms: u64) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(tx_id) {
            return false;
        }
        entries.insert(
            tx_id.to_string(),
            StatusEntry {
                status: TxStatus::Pending,
                origin,
                kind: None,
                payload: None,
                registered_ms: now_ms,
                terminal_seen_ms: None,
            },
        );
        true
    }

    /// Drop an entry that never made it onto the queue.
    pub fn remove(&self, tx_id: &str) {
        self.entries.lock().remove(tx_id);
    }

    /// Whether `tx_id` is known.
    pub fn contains(&self, tx_id: &str) -> bool {
        self.entries.lock().contains_key(tx_id)
    }

    /// Current status, if known.
    pub fn status(&self, tx_id: &str) -> Option<TxStatus> {
        self.entries.lock().get(tx_id).map(|e| e.status)
    }

    /// Origin and current status, read together.
    pub fn origin_and_status(&self, tx_id: &str) -> Option<(TxOrigin, TxStatus)> {
        self.entries.lock().get(tx_id).map(|e| (e.origin, e.status))
    }

    /// Registration time in milliseconds.
    pub fn registered_at(&self, tx_id: &str) -> Option<u64> {
        self.entries.lock().get(tx_id).map(|e| e.registered_ms)
    }

    /// Apply a forward transition. Check and set happen under one lock.
    pub fn transition(&self, tx_id: &str, next: TxStatus) -> bool {
        let applied = {
            let mut entries = self.entries.lock();
            match entries.get_mut(tx_id) {
                Some(entry) if entry.status.can_transition_to(next) => {
                    trace!("[ledger] {} {} -> {}", tx_id, entry.status, next);
                    entry.status = next;
                    true
                }
                _ => false,
            }
        };
        if applied && next.is_terminal() {
            self.terminal.notify_waiters();
        }
        applied
    }

    /// Record the routing classification.
    pub fn set_kind(&self, tx_id: &str, kind: TxKind) {
        if let Some(entry) = self.entries.lock().get_mut(tx_id) {
            entry.kind = Some(kind);
        }
    }

    /// Mark completed with the final payload.
    pub fn complete(&self, tx_id: &str, kind: TxKind, payload: &str) -> bool {
        let applied = {
            let mut entries = self.entries.lock();
            match entries.get_mut(tx_id) {
                Some(entry) if entry.status.can_transition_to(TxStatus::Completed) => {
                    entry.status = TxStatus::Completed;
                    entry.kind = Some(kind);
                    entry.payload = Some(payload.to_string());
                    true
                }
                _ => false,
            }
        };
        if applied {
            self.terminal.notify_waiters();
        }
        applied
    }

    /// Mark failed.
    pub fn fail(&self, tx_id: &str) -> bool {
        self.transition(tx_id, TxStatus::Failed)
    }

    /// Status view; `NotFound` for unknown ids.
    pub fn view(&self, tx_id: &str) -> Result<TxStatusView, LedgerError> {
        let entries = self.entries.lock();
        let entry = entries
            .get(tx_id)
            .ok_or_else(|| LedgerError::tx_not_found(tx_id))?;
        Ok(TxStatusView {
            transaction_id: tx_id.to_string(),
            status: entry.status,
            kind: entry.kind,
            payload: match entry.status {
                TxStatus::Completed => entry.payload.clone(),
                _ => None,
            },
        })
    }

    /// Drop terminal entries older than `retention_ms`.
    ///
    /// The first pass that sees an entry terminal stamps it; a later pass at
    /// least `retention_ms` after the stamp removes it. Returns how many
    /// entries were dropped.
    pub fn sweep_terminal(&self, now_ms: u64, retention_ms: u64) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            if !entry.status.is_terminal() {
                return true;
            }
            match entry.terminal_seen_ms {
                None => {
                    entry.terminal_seen_ms = Some(now_ms);
                    true
                }
                Some(seen) => now_ms.saturating_sub(seen) < retention_ms,
            }
        });
        before - entries.len()
    }

    /// Counts per status.
    pub fn counts(&self) -> HashMap<TxStatus, usize> {
        let mut counts = HashMap::new();
        for entry in self.entries.lock().values() {
            *counts.entry(entry.status).or_insert(0) += 1;
        }
        counts
    }

    /// Wait until `tx_id` is terminal or `timeout` elapses, then return its
    /// current view.
    pub async fn await_terminal(
        &self,
        tx_id: &str,
        timeout: Duration,
    ) -> Result<TxStatusView, LedgerError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let mut notified = std::pin::pin!(self.terminal.notified());
            notified.as_mut().enable();

            let view = self.view(tx_id)?;
            if view.status.is_terminal() {
                return Ok(view);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.view(tx_id);
            }
        }
    }
}
