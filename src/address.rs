//! Address decoding, classification, and public-key address derivation

use ripemd::Ripemd160;
use secp256k1::PublicKey;
use sha2::{Digest, Sha256};

use crate::base58;
use crate::bech32;
use crate::constants::*;
use crate::error::{Result, VerificationError};
use crate::types::{Address, Hash160, ScriptType};

/// DecodeAddress: 𝕊 → 𝒜
///
/// Classification comes before decoding: an address whose 3rd character is
/// '1' and whose first two characters case-insensitively spell a known HRP
/// (`bc`/`tb`) is Bech32; everything else goes through Base58Check.
///
/// Base58Check version bytes map 0x00/0x6F → P2PKH and 0x05/0xC4 → P2SH;
/// any other version is an unsupported type. Bech32 witness programs map
/// by length, 20 bytes → P2WPKH and 32 bytes → P2WSH.
pub fn decode_address(text: &str) -> Result<Address> {
    if text.is_empty() {
        return Err(VerificationError::InvalidFormat(
            "empty address".to_string(),
        ));
    }

    if is_bech32_candidate(text) {
        let (_, program) = bech32::decode_witness_program(text)?;
        let script_type = if program.len() == 20 {
            ScriptType::P2wpkh
        } else {
            ScriptType::P2wsh
        };
        Address::new(script_type, program)
    } else {
        let (version, payload) = base58::decode_checked(text)?;
        let script_type = match version {
            P2PKH_VERSION_MAINNET | P2PKH_VERSION_TESTNET => ScriptType::P2pkh,
            P2SH_VERSION_MAINNET | P2SH_VERSION_TESTNET => ScriptType::P2sh,
            other => {
                return Err(VerificationError::UnsupportedType(format!(
                    "version byte 0x{:02x}",
                    other
                )))
            }
        };
        Address::new(script_type, payload.to_vec())
    }
}

/// Cheap structural pre-check, no checksum work.
///
/// Catches empty/oversized strings and characters outside the relevant
/// alphabet so callers can reject garbage before paying for a full decode.
pub fn validate_address_format(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(VerificationError::InvalidFormat(
            "empty address".to_string(),
        ));
    }
    if text.len() > MAX_ADDRESS_LENGTH {
        return Err(VerificationError::InvalidFormat(format!(
            "address of {} characters exceeds the {} limit",
            text.len(),
            MAX_ADDRESS_LENGTH
        )));
    }

    if is_bech32_candidate(text) {
        let has_lower = text.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = text.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper {
            return Err(VerificationError::MixedCase);
        }
        for c in text.chars().skip(3) {
            if c != '1' && !bech32::is_valid_char(c) {
                return Err(VerificationError::InvalidCharacter(c));
            }
        }
    } else {
        for c in text.chars() {
            base58::digit_value(c)?;
        }
    }
    Ok(())
}

/// DeriveP2WPKHAddress: 64-byte public key → mainnet Bech32 string
///
/// The exact inverse of decoding: compress the key (0x02/0x03 by Y parity,
/// then the X coordinate), HASH160 the compressed key, encode the 20-byte
/// program with HRP "bc" and witness version 0. Binding the address to the
/// key here is what closes the signature-substitution hole: a signature
/// check alone never proves the claimed address belongs to the signer.
pub fn derive_p2wpkh_address(uncompressed_pubkey: &[u8; 64]) -> Result<String> {
    let compressed = compress_public_key(uncompressed_pubkey)?;
    let program = hash160(&compressed);
    bech32::encode_witness_program(HRP_MAINNET, WITNESS_VERSION_0, &program)
}

/// Compress a 64-byte X ‖ Y public key to SEC1 form.
///
/// The key must be a valid curve point; a fabricated key is rejected
/// rather than hashed.
pub fn compress_public_key(uncompressed: &[u8; 64]) -> Result<[u8; 33]> {
    let mut sec1 = [0u8; 65];
    sec1[0] = UNCOMPRESSED_PREFIX;
    sec1[1..].copy_from_slice(uncompressed);
    PublicKey::from_slice(&sec1)
        .map_err(|e| VerificationError::InvalidPublicKey(e.to_string()))?;

    let mut compressed = [0u8; 33];
    compressed[0] = if uncompressed[63] & 1 == 0 {
        COMPRESSED_PREFIX_EVEN
    } else {
        COMPRESSED_PREFIX_ODD
    };
    compressed[1..].copy_from_slice(&uncompressed[..32]);
    Ok(compressed)
}

/// HASH160: RIPEMD160(SHA256(x))
pub fn hash160(data: &[u8]) -> Hash160 {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

fn is_bech32_candidate(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() > 3
        && b[2] == b'1'
        && (b[..2].eq_ignore_ascii_case(HRP_MAINNET.as_bytes())
            || b[..2].eq_ignore_ascii_case(HRP_TESTNET.as_bytes()))
}
