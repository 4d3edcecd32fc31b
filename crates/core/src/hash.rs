//! Fingerprint construction and composition
//!
//! Every fingerprint in weft comes out of [`TaskHasher`]: a SHA-256 stream
//! truncated to 128 bits. Variable-length inputs are length-prefixed so that
//! `("ab", "c")` and `("a", "bc")` never collide. Composition of a task
//! group's fingerprint is the same hasher fed with the member fingerprints
//! in submission order, which makes it order-sensitive.

use crate::errors::Result;
use crate::types::Fingerprint;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Incremental builder for a [`Fingerprint`]
#[derive(Debug, Clone, Default)]
pub struct TaskHasher {
    hasher: Sha256,
}

impl TaskHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes
    pub fn update_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
        self
    }

    /// Feed a string, e.g. a task script
    pub fn update_str(&mut self, value: &str) -> &mut Self {
        self.update_bytes(value.as_bytes())
    }

    /// Feed another fingerprint
    pub fn update_fingerprint(&mut self, fingerprint: &Fingerprint) -> &mut Self {
        self.hasher.update(fingerprint.as_bytes());
        self
    }

    /// Feed any serializable value through its JSON rendering
    pub fn update_serialized<T: Serialize>(&mut self, value: &T) -> Result<&mut Self> {
        let serialized = serde_json::to_vec(value)?;
        Ok(self.update_bytes(&serialized))
    }

    /// Finish and produce the fingerprint
    pub fn finish(self) -> Fingerprint {
        let digest = self.hasher.finalize();
        let mut bytes = [0u8; Fingerprint::LEN];
        bytes.copy_from_slice(&digest[..Fingerprint::LEN]);
        Fingerprint::from_bytes(bytes)
    }
}

/// Combine an ordered sequence of fingerprints into one
///
/// Permuting the input changes the output unless the permutation swaps equal
/// elements.
pub fn combine<'a, I>(fingerprints: I) -> Fingerprint
where
    I: IntoIterator<Item = &'a Fingerprint>,
{
    let mut hasher = TaskHasher::new();
    for fingerprint in fingerprints {
        hasher.update_fingerprint(fingerprint);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fp(seed: &str) -> Fingerprint {
        let mut hasher = TaskHasher::new();
        hasher.update_str(seed);
        hasher.finish()
    }

    #[test]
    fn test_combine_is_deterministic() {
        let members = [fp("a"), fp("b"), fp("c")];
        assert_eq!(combine(&members), combine(&members));
    }

    #[test]
    fn test_reversing_two_members_changes_result() {
        let a = fp("a");
        let b = fp("b");
        assert_ne!(combine(&[a, b]), combine(&[b, a]));
    }

    #[test]
    fn test_length_prefix_prevents_concatenation_collisions() {
        let mut left = TaskHasher::new();
        left.update_str("ab").update_str("c");
        let mut right = TaskHasher::new();
        right.update_str("a").update_str("bc");
        assert_ne!(left.finish(), right.finish());
    }

    #[test]
    fn test_group_of_one_differs_from_member() {
        let a = fp("a");
        assert_ne!(combine(&[a]), a);
    }

    #[test]
    fn test_update_serialized() {
        let mut first = TaskHasher::new();
        first.update_serialized(&vec!["cpus", "4"]).unwrap();
        let mut second = TaskHasher::new();
        second.update_serialized(&vec!["cpus", "8"]).unwrap();
        assert_ne!(first.finish(), second.finish());
    }

    proptest! {
        #[test]
        fn prop_swapping_distinct_members_changes_fingerprint(
            seeds in prop::collection::vec("[a-z]{1,8}", 2..12),
            i in any::<prop::sample::Index>(),
            j in any::<prop::sample::Index>(),
        ) {
            let members: Vec<Fingerprint> = seeds.iter().map(|s| fp(s)).collect();
            let (i, j) = (i.index(members.len()), j.index(members.len()));
            prop_assume!(members[i] != members[j]);

            let mut swapped = members.clone();
            swapped.swap(i, j);
            prop_assert_ne!(combine(&members), combine(&swapped));
        }
    }
}
