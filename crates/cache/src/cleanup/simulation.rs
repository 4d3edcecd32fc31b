//! Dry-run projection of ref-count decrements

use std::collections::HashMap;
use weft_core::Fingerprint;

/// Simulated remaining references for one cleanup invocation
///
/// Seeded lazily from the persisted count the first time a fingerprint is
/// seen; each later visit counts down by one. Never persisted.
#[derive(Debug, Default)]
pub struct DryRunLedger {
    remaining: HashMap<Fingerprint, u32>,
}

impl DryRunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reference being dropped; true when it was the last one
    pub fn visit(&mut self, fingerprint: Fingerprint, persisted: u32) -> bool {
        let count = self.remaining.get(&fingerprint).copied().unwrap_or(persisted);
        if count <= 1 {
            self.remaining.remove(&fingerprint);
            return true;
        }
        self.remaining.insert(fingerprint, count - 1);
        false
    }

    /// Fingerprints still carrying simulated references
    pub fn pending(&self) -> usize {
        self.remaining.len()
    }
}
