//! Random transaction generation for the scenario drivers.

use rand::distributions::Alphanumeric;
use rand::Rng;
use shard_ledger::TransactionRequest;

use crate::container::ScenarioConfig;

/// Draws random source/target pairs and alphanumeric payloads.
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    source_range: (u64, u64),
    target_range: (u64, u64),
    payload_len: usize,
}

impl WorkloadGenerator {
    /// Generator for a scenario plan.
    pub fn new(config: &ScenarioConfig) -> Self {
        Self {
            source_range: config.source_range,
            target_range: config.target_range,
            payload_len: config.payload_len.max(1),
        }
    }

    fn pick<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (u64, u64)) -> u64 {
        rng.gen_range(lo..=hi.max(lo))
    }

    /// One request.
    pub fn request<R: Rng + ?Sized>(&self, rng: &mut R, sharded: bool) -> TransactionRequest {
        let payload: String = (0..self.payload_len)
            .map(|_| char::from(rng.sample(Alphanumeric)))
            .collect();
        let request = TransactionRequest::new(
            Self::pick(rng, self.source_range),
            Self::pick(rng, self.target_range),
            payload,
        );
        if sharded {
            request.sharded()
        } else {
            request
        }
    }

    /// `count` requests drawn from the thread-local RNG.
    pub fn batch(&self, count: usize, sharded: bool) -> Vec<TransactionRequest> {
        let mut rng = rand::thread_rng();
        (0..count).map(|_| self.request(&mut rng, sharded)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_requests_stay_in_range() {
        let generator = WorkloadGenerator::new(&ScenarioConfig::default());
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let request = generator.request(&mut rng, false);
            assert!((1..=5).contains(&request.source));
            assert!((6..=10).contains(&request.target));
            assert_eq!(request.payload.len(), 50);
            assert!(request.payload.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(!request.sharded_hint);
        }
    }

    #[test]
    fn test_batch_sets_hint() {
        let generator = WorkloadGenerator::new(&ScenarioConfig::default());
        let batch = generator.batch(5, true);
        assert_eq!(batch.len(), 5);
        assert!(batch.iter().all(|r| r.sharded_hint));
    }
}
