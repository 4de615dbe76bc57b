//! Workload Source Adapter
//!
//! Static inventory standing in for the container runtime inspector.

use crate::domain::LedgerError;
use crate::ports::outbound::WorkloadSource;
use async_trait::async_trait;

/// Fixed list of workload ids.
#[derive(Clone, Debug, Default)]
pub struct StaticWorkloadSource {
    ids: Vec<String>,
}

impl StaticWorkloadSource {
    /// Create from a list of ids; blank entries are dropped.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids
                .into_iter()
                .map(Into::into)
                .map(|s: String| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }
}

#[async_trait]
impl WorkloadSource for StaticWorkloadSource {
    async fn list_workloads(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self.ids.clone())
    }
}
