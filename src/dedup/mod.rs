//! Near-duplicate detection
//!
//! Pages are reduced to a 32-bit weighted fingerprint of their tokens. A
//! page is a near-duplicate when its fingerprint lies within the configured
//! normalized Hamming distance of any fingerprint retained so far.

mod fingerprint;

pub use fingerprint::{Fingerprint, FINGERPRINT_BITS};

use std::sync::Mutex;

/// Shared set of retained fingerprints
///
/// The membership test and the insertion of a new fingerprint happen under
/// one lock, so two pages processed concurrently can never both pass
/// against each other. The set only grows and every check scans it
/// linearly.
#[derive(Debug)]
pub struct DuplicateDetector {
    threshold: f64,
    retained: Mutex<Vec<Fingerprint>>,
}

impl DuplicateDetector {
    /// Creates an empty detector
    ///
    /// # Arguments
    ///
    /// * `threshold` - Normalized distance strictly below which two
    ///   fingerprints are near-duplicates
    pub fn new(threshold: f64) -> Self {
        Self::with_retained(threshold, Vec::new())
    }

    /// Creates a detector seeded with fingerprints from a previous run
    pub fn with_retained(threshold: f64, retained: Vec<Fingerprint>) -> Self {
        Self {
            threshold,
            retained: Mutex::new(retained),
        }
    }

    /// Returns true if the fingerprint is a near-duplicate of a retained one
    ///
    /// A fingerprint that is not a duplicate is retained before the lock is
    /// released.
    pub fn check_and_insert(&self, fingerprint: Fingerprint) -> bool {
        let mut retained = self
            .retained
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let duplicate = retained
            .iter()
            .any(|seen| seen.distance(&fingerprint) < self.threshold);

        if !duplicate {
            retained.push(fingerprint);
        }
        duplicate
    }

    /// Number of retained fingerprints
    pub fn len(&self) -> usize {
        self.retained
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
