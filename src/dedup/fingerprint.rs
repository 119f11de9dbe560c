use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Width of a fingerprint in bits
pub const FINGERPRINT_BITS: u32 = 32;

/// A 32-bit weighted-majority fingerprint of a page's token content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u32);

impl Fingerprint {
    /// Wraps a raw fingerprint value
    pub fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// The raw fingerprint value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Computes the fingerprint of a token sequence
    ///
    /// Each distinct token is hashed with SHA-256 and the lowest 32 bits of
    /// the digest vote on the fingerprint's bits, weighted by the token's
    /// frequency. Bit `i` is set when its weighted vote is positive.
    pub fn compute<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut frequencies: HashMap<&str, i64> = HashMap::new();
        for token in tokens {
            *frequencies.entry(token.as_ref()).or_insert(0) += 1;
        }

        let mut votes = [0i64; FINGERPRINT_BITS as usize];
        for (token, weight) in frequencies {
            let bits = low_bits(token);
            for (i, vote) in votes.iter_mut().enumerate() {
                if bits & (1 << i) != 0 {
                    *vote += weight;
                } else {
                    *vote -= weight;
                }
            }
        }

        let value = votes
            .iter()
            .enumerate()
            .filter(|(_, vote)| **vote > 0)
            .fold(0u32, |acc, (i, _)| acc | (1 << i));

        Self(value)
    }

    /// Number of bit positions in which two fingerprints differ
    pub fn hamming(&self, other: &Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Hamming distance divided by the fingerprint width
    pub fn distance(&self, other: &Fingerprint) -> f64 {
        self.hamming(other) as f64 / FINGERPRINT_BITS as f64
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowest 32 bits of the token's SHA-256 digest read as a big-endian integer
fn low_bits(token: &str) -> u32 {
    let digest = Sha256::digest(token.as_bytes());
    let tail = &digest[digest.len() - 4..];
    u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]])
}
