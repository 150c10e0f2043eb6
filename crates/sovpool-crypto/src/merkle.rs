//! # Canonical Merkle Tree
//!
//! Binary Merkle tree over the ordered evidence hashes of a pool.
//!
//! ## Hashing (Domain Separation)
//!
//! - Leaf: `SHA256(0x00 || leaf_bytes)` where `leaf_bytes` is the 32-byte
//!   evidence hash of an admitted signature.
//! - Node: `SHA256(0x01 || left_hash || right_hash)`.
//!
//! ## Padding
//!
//! When a layer has an odd number of nodes, the last node is paired with
//! itself. Duplicate-last padding makes `[a, b, c]` and `[a, b, c, c]`
//! share a root, so a root is never meaningful without its leaf count:
//! [`MerkleRoot`] carries both and every comparison checks both.
//!
//! Leaf order is admission order. Reordering the leaves changes the root.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_32(context: &'static str, s: &str) -> Result<[u8; 32], CryptoError> {
    let invalid = || CryptoError::InvalidHex {
        context,
        value: s.to_string(),
    };
    let s = s.trim();
    if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
    }
    Ok(out)
}

fn hash_leaf(leaf: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(leaf);
    hasher.finalize().into()
}

fn hash_node(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

fn next_layer(layer: &[[u8; 32]]) -> Vec<[u8; 32]> {
    layer
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_node(left, right)
        })
        .collect()
}

fn hashed_leaves(leaves_hex: &[String]) -> Result<Vec<[u8; 32]>, CryptoError> {
    leaves_hex
        .iter()
        .map(|leaf| decode_32("leaf hash", leaf).map(|bytes| hash_leaf(&bytes)))
        .collect()
}

/// Leaf hash of a 64-hex evidence digest.
pub fn leaf_hash(leaf_hex: &str) -> Result<String, CryptoError> {
    Ok(to_hex(&hash_leaf(&decode_32("leaf hash", leaf_hex)?)))
}

/// Parent hash of two 64-hex child hashes.
pub fn node_hash(left_hex: &str, right_hex: &str) -> Result<String, CryptoError> {
    let left = decode_32("left child", left_hex)?;
    let right = decode_32("right child", right_hex)?;
    Ok(to_hex(&hash_node(&left, &right)))
}

/// A Merkle root paired with the number of leaves it commits to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleRoot {
    /// Root hash, 64 lowercase hex chars.
    pub root: String,
    /// Number of leaves under the root.
    pub leaf_count: usize,
}

/// Compute the canonical root over `leaves_hex` in the given order.
///
/// # Errors
///
/// [`CryptoError::EmptyTree`] for an empty slice; sealing an empty pool is
/// never valid. [`CryptoError::InvalidHex`] if any leaf is malformed.
pub fn merkle_root(leaves_hex: &[String]) -> Result<MerkleRoot, CryptoError> {
    if leaves_hex.is_empty() {
        return Err(CryptoError::EmptyTree);
    }
    let mut layer = hashed_leaves(leaves_hex)?;
    while layer.len() > 1 {
        layer = next_layer(&layer);
    }
    Ok(MerkleRoot {
        root: to_hex(&layer[0]),
        leaf_count: leaves_hex.len(),
    })
}

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Sibling is hashed on the left.
    Left,
    /// Sibling is hashed on the right.
    Right,
}

/// One sibling on the path from a leaf to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub side: Side,
    /// Sibling hash (64 hex chars).
    pub hash: String,
}

/// Everything a third party needs to check that one evidence hash is
/// committed to by a published root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    pub leaf_count: usize,
    pub root: String,
    pub leaf_index: usize,
    /// The evidence hash being proved.
    pub leaf: String,
    /// `SHA256(0x00 || leaf)`.
    pub leaf_hash: String,
    /// Siblings from the bottom layer up.
    pub path: Vec<PathStep>,
}

/// Build the inclusion proof for `leaf_index`.
pub fn build_inclusion_proof(
    leaves_hex: &[String],
    leaf_index: usize,
) -> Result<InclusionProof, CryptoError> {
    if leaves_hex.is_empty() {
        return Err(CryptoError::EmptyTree);
    }
    if leaf_index >= leaves_hex.len() {
        return Err(CryptoError::IndexOutOfRange {
            index: leaf_index,
            leaf_count: leaves_hex.len(),
        });
    }

    let mut layer = hashed_leaves(leaves_hex)?;
    let leaf_hash = to_hex(&layer[leaf_index]);
    let mut pos = leaf_index;
    let mut path = Vec::new();

    while layer.len() > 1 {
        let sibling = pos ^ 1;
        let (side, hash) = if sibling < pos {
            (Side::Left, layer[sibling])
        } else if sibling < layer.len() {
            (Side::Right, layer[sibling])
        } else {
            // Last node of an odd layer is its own sibling.
            (Side::Right, layer[pos])
        };
        path.push(PathStep {
            side,
            hash: to_hex(&hash),
        });
        layer = next_layer(&layer);
        pos /= 2;
    }

    Ok(InclusionProof {
        leaf_count: leaves_hex.len(),
        root: to_hex(&layer[0]),
        leaf_index,
        leaf: leaves_hex[leaf_index].trim().to_ascii_lowercase(),
        leaf_hash,
        path,
    })
}

/// Verify an inclusion proof.
///
/// Besides folding the path, the shape of the path is checked against
/// `leaf_index` and `leaf_count`: one step per layer, the side dictated by
/// the index parity, and a self-sibling exactly where padding applies.
/// Returns `false` on any malformed field.
pub fn verify_inclusion_proof(proof: &InclusionProof) -> bool {
    if proof.leaf_count == 0 || proof.leaf_index >= proof.leaf_count {
        return false;
    }
    let Ok(leaf) = decode_32("leaf hash", &proof.leaf) else {
        return false;
    };
    let Ok(claimed_root) = decode_32("root", &proof.root) else {
        return false;
    };
    let mut cur = hash_leaf(&leaf);
    match decode_32("leaf hash", &proof.leaf_hash) {
        Ok(claimed) if claimed == cur => {}
        _ => return false,
    }

    let mut pos = proof.leaf_index;
    let mut width = proof.leaf_count;
    let mut steps = proof.path.iter();
    while width > 1 {
        let Some(step) = steps.next() else {
            return false;
        };
        let Ok(sibling) = decode_32("sibling", &step.hash) else {
            return false;
        };
        let expected_side = if pos % 2 == 1 { Side::Left } else { Side::Right };
        if step.side != expected_side {
            return false;
        }
        let padded = pos % 2 == 0 && pos + 1 == width;
        if padded && sibling != cur {
            return false;
        }
        cur = match step.side {
            Side::Left => hash_node(&sibling, &cur),
            Side::Right => hash_node(&cur, &sibling),
        };
        pos /= 2;
        width = width.div_ceil(2);
    }
    steps.next().is_none() && cur == claimed_root
}
