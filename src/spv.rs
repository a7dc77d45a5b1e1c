//! SPV proof validation and the composite custody checks

use sha2::{Digest, Sha256};

use crate::constants::*;
use crate::error::{Result, VerificationError};
use crate::merkle::verify_merkle_proof;
use crate::pow::{self, U256};
use crate::relay::DifficultyOracle;
use crate::script::{verify_input_ownership, verify_op_return_payload, verify_payment_output};
use crate::transaction::{transaction_id, validate_vin, validate_vout};
use crate::types::{Address, Hash, Natural, RawTransaction, SpvProof};

/// ValidateProof: (𝒯𝒳, proof, oracle, factor) → txid
///
/// 1. Both transaction vectors must be self-consistent
/// 2. txid = SHA256(SHA256(version ‖ vin ‖ vout ‖ locktime))
/// 3. Transaction and coinbase proofs must describe trees of equal depth
/// 4. The merkle root comes from the first supplied header
/// 5. The transaction proves at its claimed index against that root
/// 6. The coinbase (single-SHA256 of its preimage) proves at index 0,
///    anchoring the header to the chain it claims to extend
/// 7. The header chain carries enough work relative to the oracle's epochs
///
/// Returns the computed txid so callers can key their own bookkeeping on a
/// value this validator derived rather than one the prover claimed.
pub fn validate_proof(
    tx: &RawTransaction,
    proof: &SpvProof,
    oracle: &dyn DifficultyOracle,
    difficulty_factor: Natural,
) -> Result<Hash> {
    // 1. Structural validation
    validate_vin(&tx.input_vector)?;
    validate_vout(&tx.output_vector)?;

    // 2. Transaction id
    let txid = transaction_id(
        &tx.version,
        &tx.input_vector,
        &tx.output_vector,
        &tx.locktime,
    );

    // 3. Equal proof depth
    if proof.merkle_proof.len() != proof.coinbase_proof.len() {
        return Err(VerificationError::MerkleTreeLevelMismatch);
    }

    // 4. Merkle root of the first header
    if proof.bitcoin_headers.len() < HEADER_LENGTH {
        return Err(VerificationError::InvalidHeaderChain(
            "proof carries no complete header".to_string(),
        ));
    }
    let root = pow::extract_merkle_root(&proof.bitcoin_headers[..HEADER_LENGTH]);

    // 5. Transaction inclusion
    if !verify_merkle_proof(txid, root, &proof.merkle_proof, proof.tx_index_in_block)? {
        return Err(VerificationError::InvalidTxMerkleProof);
    }

    // 6. Coinbase inclusion
    let coinbase_hash: Hash = Sha256::digest(proof.coinbase_preimage).into();
    if !verify_merkle_proof(coinbase_hash, root, &proof.coinbase_proof, 0)? {
        return Err(VerificationError::InvalidCoinbaseMerkleProof);
    }

    // 7. Difficulty evaluation
    evaluate_proof_difficulty(&proof.bitcoin_headers, oracle, difficulty_factor)?;

    Ok(txid)
}

/// The first header's difficulty must equal one of the two oracle epochs;
/// the whole chain must then accumulate at least requested × factor work.
pub fn evaluate_proof_difficulty(
    headers: &[u8],
    oracle: &dyn DifficultyOracle,
    difficulty_factor: Natural,
) -> Result<()> {
    if headers.len() < HEADER_LENGTH {
        return Err(VerificationError::InvalidHeaderChain(
            "proof carries no complete header".to_string(),
        ));
    }
    let first_target = pow::expand_target(pow::extract_bits(&headers[..HEADER_LENGTH]))?;
    let first_difficulty = pow::difficulty_of(&first_target)?;

    let current = oracle.current_epoch_difficulty()?;
    let previous = oracle.previous_epoch_difficulty()?;
    let requested = if first_difficulty == U256::from_u64(current) {
        current
    } else if first_difficulty == U256::from_u64(previous) {
        previous
    } else {
        return Err(VerificationError::NotAtCurrentOrPreviousDifficulty);
    };

    let accumulated = pow::validate_header_chain(headers)?;
    if !pow::meets_required_difficulty(&accumulated, requested, difficulty_factor) {
        return Err(VerificationError::InsufficientAccumulatedDifficulty);
    }
    Ok(())
}

/// VerifyWalletControl: the proof holds, the transaction broadcasts the
/// expected OP_RETURN challenge, and one of its inputs is spent from the
/// claimed address. Short-circuits on the first failed sub-check.
pub fn verify_wallet_control(
    address: &Address,
    challenge: &Hash,
    tx: &RawTransaction,
    proof: &SpvProof,
    oracle: &dyn DifficultyOracle,
    difficulty_factor: Natural,
) -> Result<bool> {
    validate_proof(tx, proof, oracle, difficulty_factor)?;
    if !verify_op_return_payload(&tx.output_vector, challenge)? {
        return Ok(false);
    }
    verify_input_ownership(&tx.input_vector, address)
}

/// VerifyRedemptionFulfillment: the proof holds and some output pays at
/// least `amount` to the claimed address.
pub fn verify_redemption_fulfillment(
    address: &Address,
    amount: Natural,
    tx: &RawTransaction,
    proof: &SpvProof,
    oracle: &dyn DifficultyOracle,
    difficulty_factor: Natural,
) -> Result<bool> {
    validate_proof(tx, proof, oracle, difficulty_factor)?;
    verify_payment_output(&tx.output_vector, address, amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::EpochDifficulty;

    const GENESIS: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c";
    const BLOCK1: &str = "010000006fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000982051fd1e4ba744bbbe680e1fee14677ba1a3c3540bf7b1cdb606e857233e0e61bc6649ffff001d01e36299";
    const BLOCK2: &str = "010000004860eb18bf1b1620e37e9490fc8a427514416fd75159ab86688e9a8300000000d5fdcc541e25de1c7a5addedf24858b8bb665c9f36ef744ee42c316022c90f9bb0bc6649ffff001d08d2bd61";
    const GENESIS_COINBASE: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

    struct DownOracle;

    impl DifficultyOracle for DownOracle {
        fn current_epoch_difficulty(&self) -> Result<Natural> {
            Err(VerificationError::OracleUnavailable(
                "relay offline".to_string(),
            ))
        }

        fn previous_epoch_difficulty(&self) -> Result<Natural> {
            Err(VerificationError::OracleUnavailable(
                "relay offline".to_string(),
            ))
        }
    }

    fn genesis_proof() -> (RawTransaction, SpvProof) {
        let tx = RawTransaction::from_bytes(&hex::decode(GENESIS_COINBASE).unwrap()).unwrap();

        // The genesis block holds a single transaction, so both proofs are
        // empty and the coinbase preimage is the single SHA256 of the tx
        let preimage: Hash = Sha256::digest(hex::decode(GENESIS_COINBASE).unwrap()).into();
        let mut headers = hex::decode(GENESIS).unwrap();
        headers.extend_from_slice(&hex::decode(BLOCK1).unwrap());
        headers.extend_from_slice(&hex::decode(BLOCK2).unwrap());

        let proof = SpvProof {
            merkle_proof: vec![],
            tx_index_in_block: 0,
            bitcoin_headers: headers,
            coinbase_preimage: preimage,
            coinbase_proof: vec![],
        };
        (tx, proof)
    }

    fn epoch_one() -> EpochDifficulty {
        EpochDifficulty {
            current: 1,
            previous: 1,
        }
    }

    #[test]
    fn test_validate_proof_genesis_chain() {
        let (tx, proof) = genesis_proof();
        let txid = validate_proof(&tx, &proof, &epoch_one(), 3).unwrap();
        assert_eq!(
            txid.to_vec(),
            hex::decode("3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a")
                .unwrap()
        );
    }

    #[test]
    fn test_accumulated_difficulty_boundary() {
        let (tx, proof) = genesis_proof();
        // Three difficulty-1 headers: a factor of 3 is exactly met
        assert!(validate_proof(&tx, &proof, &epoch_one(), 3).is_ok());
        assert_eq!(
            validate_proof(&tx, &proof, &epoch_one(), 4).unwrap_err(),
            VerificationError::InsufficientAccumulatedDifficulty
        );
    }

    #[test]
    fn test_difficulty_must_match_an_epoch() {
        let (tx, proof) = genesis_proof();
        let oracle = EpochDifficulty {
            current: 5,
            previous: 7,
        };
        assert_eq!(
            validate_proof(&tx, &proof, &oracle, 1).unwrap_err(),
            VerificationError::NotAtCurrentOrPreviousDifficulty
        );
    }

    #[test]
    fn test_previous_epoch_is_accepted() {
        let (tx, proof) = genesis_proof();
        let oracle = EpochDifficulty {
            current: 5,
            previous: 1,
        };
        assert!(validate_proof(&tx, &proof, &oracle, 3).is_ok());
    }

    #[test]
    fn test_proof_depth_mismatch_rejected() {
        let (tx, mut proof) = genesis_proof();
        proof.merkle_proof = vec![0u8; 32];
        assert_eq!(
            validate_proof(&tx, &proof, &epoch_one(), 1).unwrap_err(),
            VerificationError::MerkleTreeLevelMismatch
        );
    }

    #[test]
    fn test_corrupted_coinbase_preimage_rejected() {
        let (tx, mut proof) = genesis_proof();
        proof.coinbase_preimage[0] ^= 0x01;
        assert_eq!(
            validate_proof(&tx, &proof, &epoch_one(), 1).unwrap_err(),
            VerificationError::InvalidCoinbaseMerkleProof
        );
    }

    #[test]
    fn test_missing_headers_rejected() {
        let (tx, mut proof) = genesis_proof();
        proof.bitcoin_headers.clear();
        assert!(matches!(
            validate_proof(&tx, &proof, &epoch_one(), 1),
            Err(VerificationError::InvalidHeaderChain(_))
        ));
    }

    #[test]
    fn test_unavailable_oracle_fails_closed() {
        let (tx, proof) = genesis_proof();
        assert!(matches!(
            validate_proof(&tx, &proof, &DownOracle, 1),
            Err(VerificationError::OracleUnavailable(_))
        ));
    }
}
