//! Deterministic names for generated tags.

use sha2::{Digest, Sha256};

/// Number of digest bytes kept in a tag hash (hex encoded to twice as many chars).
const HASH_BYTES: usize = 20;

/// Hash a value on behalf of an owner (the kind of rewrite requesting it).
///
/// The result is stable across runs and processes, so regenerating the same
/// source configuration always yields the same tags.
pub fn hash(owner: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(owner.as_bytes());
    hasher.update(b":");
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();

    hex::encode(&digest[..HASH_BYTES])
}

/// Replace every character that cannot appear in a tag part with `-`.
pub fn make_safe_name(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash("detexc", "kube.ns.**"), hash("detexc", "kube.ns.**"));
    }

    #[test]
    fn test_hash_shape() {
        let h = hash("detexc", "kube.monitoring.**");
        assert_eq!(h.len(), 40);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_known_value() {
        let expected = {
            let digest = Sha256::digest(b"a:b");
            hex::encode(&digest[..20])
        };
        assert_eq!(hash("a", "b"), expected);
    }

    #[test]
    fn test_hash_distinguishes_owner_and_value() {
        assert_ne!(hash("detexc", "x"), hash("share", "x"));
        assert_ne!(hash("detexc", "x"), hash("detexc", "y"));
    }

    #[test]
    fn test_hash_no_collisions_in_corpus() {
        let mut seen = HashSet::new();
        for owner in ["detexc", "share", "labels"] {
            for i in 0..2000 {
                let value = format!("kube.ns-{}.*.*._labels.app-{}", i % 37, i);
                assert!(seen.insert(hash(owner, &value)));
            }
        }
    }

    #[test]
    fn test_make_safe_name() {
        assert_eq!(make_safe_name("jpetstore"), "jpetstore");
        assert_eq!(make_safe_name("app.kubernetes.io/name"), "app-kubernetes-io-name");
        assert_eq!(make_safe_name("a_b-c"), "a_b-c");
        assert_eq!(make_safe_name("x y"), "x-y");
    }
}
