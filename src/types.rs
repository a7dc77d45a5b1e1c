//! Core types shared by the address codec and the SPV proof validator

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerificationError};

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// 160-bit hash, the payload of P2PKH/P2SH/P2WPKH addresses
pub type Hash160 = [u8; 20];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// The four standard locking-script families this core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
}

impl ScriptType {
    /// Length of the script hash carried by an address of this type.
    pub fn hash_len(&self) -> usize {
        match self {
            ScriptType::P2pkh | ScriptType::P2sh | ScriptType::P2wpkh => 20,
            ScriptType::P2wsh => 32,
        }
    }
}

/// Canonical decoded address: a script family plus its hash payload.
///
/// Immutable once constructed; the constructor enforces the 20/32-byte
/// hash-length invariant so every downstream consumer can rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    script_type: ScriptType,
    script_hash: ByteString,
}

impl Address {
    pub fn new(script_type: ScriptType, script_hash: ByteString) -> Result<Self> {
        if script_hash.len() != script_type.hash_len() {
            return Err(VerificationError::InvalidFormat(format!(
                "{:?} requires a {}-byte hash, got {}",
                script_type,
                script_type.hash_len(),
                script_hash.len()
            )));
        }
        Ok(Address {
            script_type,
            script_hash,
        })
    }

    pub fn script_type(&self) -> ScriptType {
        self.script_type
    }

    pub fn script_hash(&self) -> &[u8] {
        &self.script_hash
    }
}

/// Legacy (non-segwit) Bitcoin transaction, split at its wire-format seams.
///
/// The input and output vectors keep their leading VarInt counts; both must
/// parse to exactly their own length (no overrun, no trailing garbage),
/// which `transaction::validate_vin`/`validate_vout` enforce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub version: [u8; 4],
    pub input_vector: ByteString,
    pub output_vector: ByteString,
    pub locktime: [u8; 4],
}

/// SPV proof bundle: everything needed to tie a transaction to a buried
/// Bitcoin block without running a node.
///
/// `merkle_proof` and `coinbase_proof` are concatenated 32-byte sibling
/// hashes; they must describe trees of the same depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpvProof {
    pub merkle_proof: ByteString,
    pub tx_index_in_block: Natural,
    pub bitcoin_headers: ByteString,
    pub coinbase_preimage: Hash,
    pub coinbase_proof: ByteString,
}
