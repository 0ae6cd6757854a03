//! Digest primitives shared by script matching, inscription
//! deduplication, and the oracle reconciliation matcher.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// `HASH160 = RIPEMD160(SHA256(data))`.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = sha256(data);
    let mut hasher = Ripemd160::new();
    hasher.update(sha);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash160_of_empty_matches_known_vector() {
        // HASH160("") = b472a266d0bd89c13706a4132ccfb16f7c3b9fcb
        assert_eq!(hex::encode(hash160(b"")), "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb");
    }

    #[test]
    fn sha256d_is_sha256_applied_twice() {
        let once = sha256(b"hello");
        let twice = sha256(&once);
        assert_eq!(sha256d(b"hello"), twice);
    }
}
