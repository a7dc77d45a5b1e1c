//! Error types for address decoding and SPV proof verification

use thiserror::Error;

/// Every failure is a caller-recoverable validation outcome. Nothing here is
/// retried internally and no check ever degrades to a silent default.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Malformed address: {0}")]
    InvalidFormat(String),

    #[error("Character not in encoding alphabet: {0:?}")]
    InvalidCharacter(char),

    #[error("Decoded value exceeds the fixed working buffer")]
    Overflow,

    #[error("Checksum mismatch: {0}")]
    ChecksumMismatch(String),

    #[error("Mixed-case encoding is not permitted")]
    MixedCase,

    #[error("Unsupported address type: {0}")]
    UnsupportedType(String),

    #[error("Unsupported witness program: {0}")]
    UnsupportedWitnessProgram(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Malformed input vector: {0}")]
    InvalidInputVector(String),

    #[error("Malformed output vector: {0}")]
    InvalidOutputVector(String),

    #[error("Transaction and coinbase merkle proofs differ in depth")]
    MerkleTreeLevelMismatch,

    #[error("Transaction merkle proof does not resolve to the header root")]
    InvalidTxMerkleProof,

    #[error("Coinbase merkle proof does not resolve to the header root")]
    InvalidCoinbaseMerkleProof,

    #[error("Invalid header chain: {0}")]
    InvalidHeaderChain(String),

    #[error("Header difficulty matches neither the current nor the previous epoch")]
    NotAtCurrentOrPreviousDifficulty,

    #[error("Accumulated difficulty is below the requested threshold")]
    InsufficientAccumulatedDifficulty,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Difficulty oracle unavailable: {0}")]
    OracleUnavailable(String),
}

pub type Result<T> = std::result::Result<T, VerificationError>;
