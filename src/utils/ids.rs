//! # Identifier Generator
//!
//! Short random tokens for container names, database names and generated
//! passwords. Tokens are the base-36 encoding of a random 63-bit value.
//!
//! The process-wide generator is seeded exactly once; every call draws from
//! the same stream, so two calls in the same nanosecond never share a seed.

use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Mask keeping the low 63 bits of a random `u64`
const U63_MASK: u64 = u64::MAX >> 1;

/// Source of random identifiers
pub trait IdGenerator: Send + Sync {
    /// Next random value in `0..2^63`
    fn next_u63(&self) -> u64;

    /// Next identifier token
    fn generate(&self) -> String {
        encode_base36(self.next_u63())
    }
}

/// Encode `value` in lower-case base 36
pub fn encode_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(13);
    while value > 0 {
        digits.push(BASE36_ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    // Alphabet is ASCII
    digits.into_iter().map(char::from).collect()
}

/// Process-wide generator backed by a `fastrand::Rng` seeded once
#[derive(Debug)]
pub struct ProcessIdGenerator {
    rng: Mutex<fastrand::Rng>,
}

static GLOBAL_IDS: OnceLock<Arc<ProcessIdGenerator>> = OnceLock::new();

impl ProcessIdGenerator {
    /// Create a generator with its own randomly seeded stream
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// The shared generator for this process
    pub fn global() -> Arc<ProcessIdGenerator> {
        GLOBAL_IDS
            .get_or_init(|| Arc::new(ProcessIdGenerator::new()))
            .clone()
    }
}

impl Default for ProcessIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for ProcessIdGenerator {
    fn next_u63(&self) -> u64 {
        self.rng.lock().u64(..) & U63_MASK
    }
}

/// Deterministic generator for tests
///
/// Two generators built from the same seed yield the same sequence.
#[derive(Debug)]
pub struct SeededIdGenerator {
    rng: Mutex<fastrand::Rng>,
}

impl SeededIdGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl IdGenerator for SeededIdGenerator {
    fn next_u63(&self) -> u64 {
        self.rng.lock().u64(..) & U63_MASK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_encode_base36_known_values() {
        assert_eq!(encode_base36(0), "0");
        assert_eq!(encode_base36(35), "z");
        assert_eq!(encode_base36(36), "10");
        assert_eq!(encode_base36(U63_MASK), "1y2p0ij32e8e7");
    }

    #[test]
    fn test_process_generator_does_not_repeat() {
        let ids = ProcessIdGenerator::global();
        let tokens: HashSet<String> = (0..10_000).map(|_| ids.generate()).collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[test]
    fn test_global_generator_is_shared() {
        let a = ProcessIdGenerator::global();
        let b = ProcessIdGenerator::global();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_seeded_generator_is_deterministic() {
        let a = SeededIdGenerator::new(42);
        let b = SeededIdGenerator::new(42);
        let first: Vec<String> = (0..5).map(|_| a.generate()).collect();
        let second: Vec<String> = (0..5).map(|_| b.generate()).collect();
        assert_eq!(first, second);

        let c = SeededIdGenerator::new(43);
        assert_ne!(first[0], c.generate());
    }

    #[test]
    fn test_concurrent_generation_is_unique() {
        let ids = ProcessIdGenerator::global();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = ids.clone();
                std::thread::spawn(move || (0..500).map(|_| ids.generate()).collect::<Vec<_>>())
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                assert!(all.insert(token), "duplicate token generated");
            }
        }
    }

    proptest! {
        #[test]
        fn prop_base36_round_trips_through_parse(value in 0u64..=U63_MASK) {
            let encoded = encode_base36(value);
            prop_assert!(encoded.len() <= 13);
            prop_assert!(encoded.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
            prop_assert_eq!(u64::from_str_radix(&encoded, 36).unwrap(), value);
        }

        #[test]
        fn prop_generated_values_fit_in_63_bits(seed in any::<u64>()) {
            let ids = SeededIdGenerator::new(seed);
            for _ in 0..16 {
                prop_assert!(ids.next_u63() <= U63_MASK);
            }
        }
    }
}
