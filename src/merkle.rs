//! Merkle inclusion proofs over double-SHA256 trees

use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};

use crate::constants::MAX_MERKLE_PROOF_DEPTH;
use crate::error::{Result, VerificationError};
use crate::types::{Hash, Natural};

/// Prove: (leaf, root, siblings, index) → {true, false}
///
/// Walk the concatenated sibling hashes from the leaf up to the root; the
/// index bit at each level decides whether the running hash is the left or
/// the right child. An empty proof is the single-transaction block case,
/// where the leaf must itself be the root.
pub fn verify_merkle_proof(leaf: Hash, root: Hash, proof: &[u8], index: Natural) -> Result<bool> {
    if proof.len() % 32 != 0 {
        return Err(VerificationError::InvalidFormat(
            "merkle proof is not a whole number of 32-byte hashes".to_string(),
        ));
    }
    let depth = proof.len() / 32;
    if depth > MAX_MERKLE_PROOF_DEPTH {
        return Err(VerificationError::InvalidFormat(format!(
            "merkle proof depth {} exceeds the {} limit",
            depth, MAX_MERKLE_PROOF_DEPTH
        )));
    }

    if proof.is_empty() {
        return Ok(leaf == root);
    }
    // An index with bits above the proof depth addresses no leaf
    if index >> depth != 0 {
        return Ok(false);
    }

    let mut current = leaf;
    let mut idx = index;
    for sibling in proof.chunks(32) {
        current = if idx & 1 == 0 {
            parent(&current, sibling)
        } else {
            parent(sibling, &current)
        };
        idx >>= 1;
    }
    Ok(current == root)
}

/// Hash a left/right node pair into their parent.
fn parent(left: &[u8], right: &[u8]) -> Hash {
    let mut engine = sha256d::Hash::engine();
    engine.input(left);
    engine.input(right);
    sha256d::Hash::from_engine(engine).into_inner()
}
