//! Bitcoin format constants and explicit compute bounds

/// Maximum accepted address length (BIP-173 total-length ceiling)
pub const MAX_ADDRESS_LENGTH: usize = 90;

/// Base58Check decoded length: 1 version + 20 payload + 4 checksum
pub const BASE58_CHECKED_LENGTH: usize = 25;

/// Fixed big-integer working buffer for Base58 decoding.
/// Deliberate bound: anything wider than 32 bytes is rejected as overflow.
pub const BASE58_BUFFER_LENGTH: usize = 32;

/// Trailing checksum bytes of a Base58Check string
pub const CHECKSUM_LENGTH: usize = 4;

/// Base58Check version byte: mainnet pay-to-pubkey-hash
pub const P2PKH_VERSION_MAINNET: u8 = 0x00;

/// Base58Check version byte: testnet pay-to-pubkey-hash
pub const P2PKH_VERSION_TESTNET: u8 = 0x6f;

/// Base58Check version byte: mainnet pay-to-script-hash
pub const P2SH_VERSION_MAINNET: u8 = 0x05;

/// Base58Check version byte: testnet pay-to-script-hash
pub const P2SH_VERSION_TESTNET: u8 = 0xc4;

/// Bech32 human-readable part: mainnet
pub const HRP_MAINNET: &str = "bc";

/// Bech32 human-readable part: testnet
pub const HRP_TESTNET: &str = "tb";

/// The only witness version this system accepts
pub const WITNESS_VERSION_0: u8 = 0;

/// Bech32 checksum length in 5-bit symbols
pub const BECH32_CHECKSUM_LENGTH: usize = 6;

// Script opcodes used by the four standard templates
pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;

/// OP_RETURN challenge payloads are exactly 32 bytes (push-32 data)
pub const OP_RETURN_PAYLOAD_LENGTH: usize = 32;

/// Serialized Bitcoin block header length
pub const HEADER_LENGTH: usize = 80;

/// Byte offset of the merkle root inside an 80-byte header
pub const MERKLE_ROOT_OFFSET: usize = 36;

/// Byte offset of the compact difficulty bits inside an 80-byte header
pub const TARGET_BITS_OFFSET: usize = 72;

/// Compact bits of the difficulty-1 target (Bitcoin genesis difficulty)
pub const DIFF1_BITS: u32 = 0x1d00ffff;

/// Maximum number of inputs per transaction
pub const MAX_INPUTS: u64 = 1000;

/// Maximum number of outputs per transaction
pub const MAX_OUTPUTS: u64 = 1000;

/// Maximum script length
pub const MAX_SCRIPT_SIZE: u64 = 10_000;

/// Maximum merkle proof depth (a 2^32-leaf block is already impossible)
pub const MAX_MERKLE_PROOF_DEPTH: usize = 32;

/// Maximum header-chain length accepted in one proof: one retarget epoch.
/// A longer chain cannot be difficulty-consistent under a two-epoch oracle.
pub const MAX_PROOF_HEADERS: usize = 2016;

/// Default proof-of-work multiplier applied to the requested difficulty
pub const DEFAULT_DIFFICULTY_FACTOR: u64 = 6;

/// SEC1 prefix for an even-Y compressed public key
pub const COMPRESSED_PREFIX_EVEN: u8 = 0x02;

/// SEC1 prefix for an odd-Y compressed public key
pub const COMPRESSED_PREFIX_ODD: u8 = 0x03;

/// SEC1 prefix for an uncompressed public key
pub const UNCOMPRESSED_PREFIX: u8 = 0x04;
