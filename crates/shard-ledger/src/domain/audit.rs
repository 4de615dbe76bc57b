//! # Audit Records
//!
//! Versioned, strongly typed audit documents emitted for every finalized
//! transaction.
//!
//! Two document shapes are accepted on load:
//! - schema v1 (this crate's own serialization)
//! - unversioned legacy documents with camelCase keys (`txID`, `execTime`,
//!   `finality`, `propagationLatency`, ...)
//!
//! Anything else is `MalformedRecord`.

use super::errors::{BlockIndex, LedgerError, TxId};
use super::value_objects::TxKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current audit schema version.
pub const AUDIT_SCHEMA_VERSION: u16 = 1;

/// One audit trail entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Schema version, always [`AUDIT_SCHEMA_VERSION`] when written.
    pub schema_version: u16,
    /// Transaction id.
    pub tx_id: TxId,
    /// Source block index.
    pub source: BlockIndex,
    /// Target block index.
    pub target: BlockIndex,
    /// Routing classification.
    pub kind: TxKind,
    /// Finalized payload.
    pub message: String,
    /// Measured processing time.
    pub exec_time_ms: f64,
    /// Synthetic finality estimate.
    pub finality_ms: f64,
    /// Synthetic propagation estimate.
    pub propagation_ms: f64,
    /// Synthetic throughput estimate.
    pub tps: f64,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
}

/// Unversioned document shape written by earlier deployments.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacyAuditDocument {
    #[serde(rename = "txID")]
    tx_id: String,
    source: BlockIndex,
    target: BlockIndex,
    message: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "execTime")]
    exec_time: f64,
    finality: f64,
    #[serde(rename = "propagationLatency")]
    propagation_latency: f64,
    tps: f64,
    timestamp: DateTime<Utc>,
}

impl AuditRecord {
    /// Serialize to a JSON document.
    pub fn to_document(&self) -> Result<Value, LedgerError> {
        serde_json::to_value(self).map_err(|e| LedgerError::Audit(e.to_string()))
    }

    /// Parse a stored document, validating its schema.
    pub fn from_document(doc: &Value) -> Result<Self, LedgerError> {
        let obj = doc
            .as_object()
            .ok_or_else(|| LedgerError::MalformedRecord("document is not an object".into()))?;

        match obj.get("schema_version") {
            Some(version) => {
                let version = version.as_u64().ok_or_else(|| {
                    LedgerError::MalformedRecord("schema_version is not an integer".into())
                })?;
                if version != u64::from(AUDIT_SCHEMA_VERSION) {
                    return Err(LedgerError::MalformedRecord(format!(
                        "unsupported schema_version {}",
                        version
                    )));
                }
                serde_json::from_value(doc.clone())
                    .map_err(|e| LedgerError::MalformedRecord(e.to_string()))
            }
            None => Self::from_legacy(doc),
        }
    }

    fn from_legacy(doc: &Value) -> Result<Self, LedgerError> {
        let legacy: LegacyAuditDocument = serde_json::from_value(doc.clone())
            .map_err(|e| LedgerError::MalformedRecord(format!("legacy document: {}", e)))?;
        let kind = TxKind::parse(&legacy.kind).ok_or_else(|| {
            LedgerError::MalformedRecord(format!("unknown transaction type {}", legacy.kind))
        })?;
        Ok(Self {
            schema_version: AUDIT_SCHEMA_VERSION,
            tx_id: legacy.tx_id,
            source: legacy.source,
            target: legacy.target,
            kind,
            message: legacy.message,
            exec_time_ms: legacy.exec_time,
            finality_ms: legacy.finality,
            propagation_ms: legacy.propagation_latency,
            tps: legacy.tps,
            timestamp: legacy.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> AuditRecord {
        AuditRecord {
            schema_version: AUDIT_SCHEMA_VERSION,
            tx_id: "tx-1".into(),
            source: 1,
            target: 2,
            kind: TxKind::Sharded,
            message: "hello".into(),
            exec_time_ms: 12.0,
            finality_ms: 100.0,
            propagation_ms: 30.0,
            tps: 10.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_document_roundtrip() {
        let record = sample();
        let doc = record.to_document().unwrap();
        assert_eq!(doc["schema_version"], 1);
        assert_eq!(doc["kind"], "Sharded");
        assert_eq!(AuditRecord::from_document(&doc).unwrap(), record);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut doc = sample().to_document().unwrap();
        doc["schema_version"] = json!(2);
        assert!(matches!(
            AuditRecord::from_document(&doc),
            Err(LedgerError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_mistyped_field_rejected() {
        let mut doc = sample().to_document().unwrap();
        doc["tps"] = json!("fast");
        assert!(AuditRecord::from_document(&doc).is_err());
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut doc = sample().to_document().unwrap();
        doc.as_object_mut().unwrap().remove("tx_id");
        assert!(AuditRecord::from_document(&doc).is_err());
        assert!(AuditRecord::from_document(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_legacy_document_accepted() {
        let doc = json!({
            "txID": "tx-77",
            "source": 3,
            "target": 8,
            "message": "payload",
            "type": "Non-Sharded",
            "execTime": 4000.0,
            "finality": 4500.0,
            "propagationLatency": 200.0,
            "tps": 0.22,
            "timestamp": "2024-01-01T00:00:00Z"
        });
        let record = AuditRecord::from_document(&doc).unwrap();
        assert_eq!(record.tx_id, "tx-77");
        assert_eq!(record.kind, TxKind::NonSharded);
        assert_eq!(record.propagation_ms, 200.0);
    }

    #[test]
    fn test_legacy_unknown_kind_rejected() {
        let doc = json!({
            "txID": "tx-77", "source": 3, "target": 8, "message": "m",
            "type": "Diagonal", "execTime": 1.0, "finality": 1.0,
            "propagationLatency": 1.0, "tps": 1.0,
            "timestamp": "2024-01-01T00:00:00Z"
        });
        assert!(AuditRecord::from_document(&doc).is_err());
    }
}
