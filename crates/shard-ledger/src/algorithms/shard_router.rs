//! # Shard Router
//!
//! Deterministic identifier-to-shard mapping.
//!
//! Precedence: tenant prefix, then numeric locality, then content hash.
//!
//! ```text
//! ""            -> 0              (warn)
//! "org1-..."    -> tenant shard
//! "42"          -> 42 mod N
//! "3f9c..."     -> sha256(id)[0] mod N
//! ```

use crate::domain::{
    BlockIndex, LedgerConfig, LedgerError, RoutingDecision, ShardId, TenantRule, TxKind,
    MIN_SHARD_COUNT,
};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Routes identifiers to shards. Pure for a fixed shard count.
#[derive(Clone, Debug)]
pub struct ShardRouter {
    shard_count: ShardId,
    tenants: Vec<TenantRule>,
}

impl ShardRouter {
    /// Create a router.
    pub fn new(shard_count: ShardId, tenants: Vec<TenantRule>) -> Result<Self, LedgerError> {
        if shard_count < MIN_SHARD_COUNT {
            return Err(LedgerError::InvalidInput(format!(
                "shard_count must be >= {}",
                MIN_SHARD_COUNT
            )));
        }
        Ok(Self {
            shard_count,
            tenants,
        })
    }

    /// Create a router from ledger configuration.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        Self::new(config.shard_count, config.tenants.clone())
    }

    /// Configured shard count.
    pub fn shard_count(&self) -> ShardId {
        self.shard_count
    }

    /// Map an identifier to a shard in `[0, shard_count)`.
    pub fn route(&self, identifier: &str) -> ShardId {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            warn!("[ledger] empty identifier routed to shard 0");
            return 0;
        }

        if let Some(rule) = self
            .tenants
            .iter()
            .find(|rule| trimmed.starts_with(rule.prefix.as_str()))
        {
            return rule.shard_id % self.shard_count;
        }

        if let Ok(value) = trimmed.parse::<i128>() {
            return value.rem_euclid(i128::from(self.shard_count)) as ShardId;
        }

        let digest = Sha256::digest(trimmed.as_bytes());
        ShardId::from(digest[0]) % self.shard_count
    }

    /// Route a block index through its decimal string form.
    pub fn route_block(&self, index: BlockIndex) -> ShardId {
        self.route(&index.to_string())
    }

    /// Classify a transaction between two blocks.
    pub fn classify(&self, source: BlockIndex, target: BlockIndex) -> RoutingDecision {
        let source_shard = self.route_block(source);
        let target_shard = self.route_block(target);
        RoutingDecision {
            source_shard,
            target_shard,
            kind: TxKind::from_shards(source_shard, target_shard),
        }
    }

    /// Check a caller-supplied shard id.
    pub fn check_shard(&self, shard_id: i64) -> Result<ShardId, LedgerError> {
        if shard_id < 0 || shard_id >= i64::from(self.shard_count) {
            return Err(LedgerError::InvalidShard {
                shard_id,
                shard_count: self.shard_count,
            });
        }
        Ok(shard_id as ShardId)
    }
}

impl Default for ShardRouter {
    fn default() -> Self {
        let config = LedgerConfig::default();
        Self {
            shard_count: config.shard_count,
            tenants: config.tenants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invariant_deterministic_routing;

    #[test]
    fn test_empty_routes_to_zero() {
        let router = ShardRouter::default();
        assert_eq!(router.route(""), 0);
        assert_eq!(router.route("   "), 0);
    }

    #[test]
    fn test_tenant_prefix_wins() {
        let router = ShardRouter::default();
        assert_eq!(router.route("org1-container"), 0);
        assert_eq!(router.route("org2-container"), 1);
        assert_eq!(router.route("org2"), 1);
    }

    #[test]
    fn test_tenant_shard_taken_modulo() {
        let router = ShardRouter::new(2, vec![TenantRule::new("acme", 5)]).unwrap();
        assert_eq!(router.route("acme-1"), 1);
    }

    #[test]
    fn test_numeric_locality() {
        let router = ShardRouter::new(4, Vec::new()).unwrap();
        assert_eq!(router.route("7"), 3);
        assert_eq!(router.route("8"), 0);
        assert_eq!(router.route("-1"), 3);
        assert_eq!(router.route_block(10), 2);
    }

    #[test]
    fn test_content_hash_fallback() {
        let router = ShardRouter::new(2, Vec::new()).unwrap();
        let digest = Sha256::digest(b"abc");
        assert_eq!(router.route("abc"), u32::from(digest[0]) % 2);
    }

    #[test]
    fn test_route_in_range_and_pure() {
        let router = ShardRouter::new(3, Vec::new()).unwrap();
        for id in ["a", "b", "zz-top", "99", "org1", "4f2e"] {
            assert!(router.route(id) < 3);
            assert!(invariant_deterministic_routing(|s| router.route(s), id));
        }
    }

    #[test]
    fn test_classify() {
        let router = ShardRouter::default();
        let decision = router.classify(1, 2);
        assert_eq!(decision.source_shard, 1);
        assert_eq!(decision.target_shard, 0);
        assert_eq!(decision.kind, TxKind::Sharded);
        assert_eq!(router.classify(2, 4).kind, TxKind::NonSharded);
    }

    #[test]
    fn test_check_shard() {
        let router = ShardRouter::default();
        assert_eq!(router.check_shard(1).unwrap(), 1);
        assert!(matches!(
            router.check_shard(2),
            Err(LedgerError::InvalidShard { shard_id: 2, shard_count: 2 })
        ));
        assert!(router.check_shard(-1).is_err());
    }

    #[test]
    fn test_zero_shards_rejected() {
        assert!(ShardRouter::new(0, Vec::new()).is_err());
    }
}
