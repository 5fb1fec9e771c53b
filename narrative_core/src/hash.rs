//! Stable, non-cryptographic hashing used for deterministic selection and
//! graph fingerprints.

/// 32-bit rolling hash (`h = h * 31 + c`, wrapping).
pub fn stable_hash(input: &str) -> i32 {
    input
        .chars()
        .fold(0i32, |hash, c| hash.wrapping_mul(31).wrapping_add(c as i32))
}

/// Map a key to a seed in `[0, 1)`.
pub fn selection_seed(key: &str) -> f64 {
    f64::from(stable_hash(key) as u32) / 4_294_967_296.0
}

/// Index into a collection of `len` items using a seed in `[0, 1)`.
pub fn seeded_index(seed: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    ((seed * len as f64).floor() as usize).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_hash_is_stable() {
        assert_eq!(stable_hash(""), 0);
        assert_eq!(stable_hash("a"), 97);
        assert_eq!(stable_hash("ab"), 97 * 31 + 98);
        assert_eq!(stable_hash("start"), stable_hash("start"));
        assert_ne!(stable_hash("start"), stable_hash("strat"));
    }

    #[test]
    fn test_seed_range() {
        for key in ["start", "intro", "gate", "a-very-long-node-identifier-with-many-chars"] {
            let seed = selection_seed(key);
            assert!((0.0..1.0).contains(&seed), "seed {} out of range for {}", seed, key);
        }
    }

    #[test]
    fn test_seeded_index_bounds() {
        assert_eq!(seeded_index(0.0, 3), 0);
        assert_eq!(seeded_index(0.5, 3), 1);
        assert_eq!(seeded_index(0.999, 3), 2);
        assert_eq!(seeded_index(0.5, 0), 0);
    }
}
