//! # Custody-Proof
//!
//! Bitcoin fact verification for an on-chain custodial protocol, without a
//! Bitcoin node.
//!
//! This crate provides pure, side-effect-free functions that decode Bitcoin
//! addresses (Base58Check and Bech32, four script types) and validate SPV
//! proofs: transaction-hash computation, Merkle inclusion, coinbase
//! inclusion, retarget-aware difficulty evaluation, and script-level
//! payment/ownership matching. Custodian bookkeeping, consensus between
//! attesters, and permissioning all live outside; they consume the verified
//! facts this core produces.
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every check is deterministic and side-effect-free;
//!    the difficulty oracle is the single external capability
//! 2. **Byte-for-byte Formats**: address encodings and proof layouts
//!    reproduce the Bitcoin consensus formats exactly
//! 3. **Exact Version Pinning**: consensus-critical cryptography is pinned
//!    to exact versions
//! 4. **Fail Closed**: every failure is a typed error; no check ever
//!    defaults to "verified"
//!
//! ## Usage
//!
//! ```rust
//! use custody_proof::CustodyProof;
//! use custody_proof::types::ScriptType;
//!
//! let core = CustodyProof::new();
//! let address = core.decode_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2").unwrap();
//! assert_eq!(address.script_type(), ScriptType::P2pkh);
//! ```

pub mod address;
pub mod base58;
pub mod bech32;
pub mod constants;
pub mod error;
pub mod merkle;
pub mod pow;
pub mod relay;
pub mod script;
pub mod spv;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use constants::*;
pub use error::{Result, VerificationError};
pub use types::*;

use relay::DifficultyOracle;

/// The capability surface exposed to the rest of the protocol.
///
/// # Examples
///
/// ```
/// use custody_proof::CustodyProof;
///
/// let core = CustodyProof::new();
/// assert!(core.validate_address_format("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").is_ok());
/// ```
pub struct CustodyProof;

impl CustodyProof {
    /// Create a new verification core
    pub fn new() -> Self {
        Self
    }

    /// Decode and classify a Bitcoin address string
    ///
    /// # Examples
    ///
    /// ```
    /// use custody_proof::CustodyProof;
    /// use custody_proof::types::ScriptType;
    ///
    /// let core = CustodyProof::new();
    /// let address = core
    ///     .decode_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4")
    ///     .unwrap();
    /// assert_eq!(address.script_type(), ScriptType::P2wpkh);
    /// assert_eq!(address.script_hash().len(), 20);
    /// ```
    pub fn decode_address(&self, text: &str) -> Result<Address> {
        address::decode_address(text)
    }

    /// Cheap structural address check, no checksum work
    pub fn validate_address_format(&self, text: &str) -> Result<()> {
        address::validate_address_format(text)
    }

    /// Derive the mainnet P2WPKH address controlled by an uncompressed
    /// public key
    ///
    /// # Examples
    ///
    /// ```
    /// use custody_proof::CustodyProof;
    ///
    /// // The secp256k1 generator point
    /// let mut pubkey = [0u8; 64];
    /// pubkey[..32].copy_from_slice(
    ///     &hex::decode("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
    ///         .unwrap(),
    /// );
    /// pubkey[32..].copy_from_slice(
    ///     &hex::decode("483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8")
    ///         .unwrap(),
    /// );
    ///
    /// let core = CustodyProof::new();
    /// let address = core.derive_address_from_public_key(&pubkey).unwrap();
    /// assert_eq!(address, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
    /// ```
    pub fn derive_address_from_public_key(&self, uncompressed_pubkey: &[u8; 64]) -> Result<String> {
        address::derive_p2wpkh_address(uncompressed_pubkey)
    }

    /// Build the exact locking-script bytes for a decoded address
    pub fn build_locking_script(&self, address: &Address) -> ByteString {
        script::build_locking_script(address)
    }

    /// Validate an SPV proof against a difficulty oracle, returning the
    /// verified transaction id
    pub fn validate_proof(
        &self,
        tx: &RawTransaction,
        proof: &SpvProof,
        oracle: &dyn DifficultyOracle,
        difficulty_factor: Natural,
    ) -> Result<Hash> {
        spv::validate_proof(tx, proof, oracle, difficulty_factor)
    }

    /// Prove a wallet controls an address: SPV proof plus OP_RETURN
    /// challenge plus input ownership
    pub fn verify_wallet_control(
        &self,
        address: &Address,
        challenge: &Hash,
        tx: &RawTransaction,
        proof: &SpvProof,
        oracle: &dyn DifficultyOracle,
        difficulty_factor: Natural,
    ) -> Result<bool> {
        spv::verify_wallet_control(address, challenge, tx, proof, oracle, difficulty_factor)
    }

    /// Prove a redemption was fulfilled: SPV proof plus a payment output of
    /// at least `amount` to the address
    pub fn verify_redemption_fulfillment(
        &self,
        address: &Address,
        amount: Natural,
        tx: &RawTransaction,
        proof: &SpvProof,
        oracle: &dyn DifficultyOracle,
        difficulty_factor: Natural,
    ) -> Result<bool> {
        spv::verify_redemption_fulfillment(address, amount, tx, proof, oracle, difficulty_factor)
    }
}

impl Default for CustodyProof {
    fn default() -> Self {
        Self::new()
    }
}
