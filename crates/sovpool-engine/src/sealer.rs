//! # Merkle Sealer
//!
//! Computes the commitment of a sealing pool from its ordered leaves using
//! the canonical tree in `sovpool-crypto`.

use sovpool_core::PoolId;
use sovpool_crypto::{merkle_root, CryptoError, MerkleRoot};

use crate::error::PoolingError;

/// Deterministic root computation over a pool's leaf sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct MerkleSealer;

impl MerkleSealer {
    /// Root and leaf count over `leaves` in order. An empty sequence is
    /// [`PoolingError::EmptyPool`].
    pub fn seal(&self, pool_id: PoolId, leaves: &[String]) -> Result<MerkleRoot, PoolingError> {
        merkle_root(leaves).map_err(|e| match e {
            CryptoError::EmptyTree => PoolingError::EmptyPool { pool_id },
            other => PoolingError::IntegrityCorruption {
                pool_id,
                detail: other.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: u8) -> Vec<String> {
        (1..=n).map(|b| format!("{b:02x}").repeat(32)).collect()
    }

    #[test]
    fn same_leaves_same_root() {
        let pool_id = PoolId::new();
        let a = MerkleSealer.seal(pool_id, &leaves(5)).unwrap();
        let b = MerkleSealer.seal(pool_id, &leaves(5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.leaf_count, 5);
        assert_ne!(MerkleSealer.seal(pool_id, &leaves(4)).unwrap(), a);
    }

    #[test]
    fn empty_pool_never_produces_a_root() {
        let pool_id = PoolId::new();
        assert_eq!(
            MerkleSealer.seal(pool_id, &[]).unwrap_err(),
            PoolingError::EmptyPool { pool_id }
        );
    }

    #[test]
    fn malformed_leaf_is_integrity_error() {
        let err = MerkleSealer.seal(PoolId::new(), &["xyz".into()]).unwrap_err();
        assert_eq!(err.kind(), "integrity_corruption");
    }
}
