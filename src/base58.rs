//! Base58Check codec for legacy Bitcoin addresses

use sha2::{Digest, Sha256};

use crate::constants::*;
use crate::error::{Result, VerificationError};
use crate::types::{ByteString, Hash160};

/// The 58-symbol alphabet; `0`, `O`, `I` and `l` are excluded.
const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Decode: 𝕊 → 𝔹*
///
/// For a Base58 string s:
/// 1. Leading '1' characters decode to leading zero bytes verbatim
/// 2. Remaining characters accumulate via repeated multiply-by-58-add-digit
///    into a fixed 32-byte buffer
/// 3. Any carry out of the buffer is an overflow, any character outside the
///    alphabet is rejected
/// 4. Result = zero bytes ++ minimal-length significant bytes
pub fn decode(source: &str) -> Result<ByteString> {
    if source.is_empty() {
        return Err(VerificationError::InvalidFormat(
            "empty Base58 string".to_string(),
        ));
    }
    if source.len() > MAX_ADDRESS_LENGTH {
        return Err(VerificationError::InvalidFormat(format!(
            "Base58 string of {} characters exceeds the {} limit",
            source.len(),
            MAX_ADDRESS_LENGTH
        )));
    }

    // 1. Leading '1's are zero bytes
    let zeros = source.chars().take_while(|&c| c == '1').count();

    // 2. Big-integer accumulation, most significant byte at buf[0]
    let mut buf = [0u8; BASE58_BUFFER_LENGTH];
    for c in source.chars().skip(zeros) {
        let mut carry = digit_value(c)? as u32;
        for b in buf.iter_mut().rev() {
            carry += (*b as u32) * 58;
            *b = (carry & 0xff) as u8;
            carry >>= 8;
        }
        // 3. The accumulated value no longer fits the working buffer
        if carry != 0 {
            return Err(VerificationError::Overflow);
        }
    }

    // 4. Strip buffer padding, re-attach the leading zeros
    let first = buf
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(BASE58_BUFFER_LENGTH);
    let mut out = vec![0u8; zeros];
    out.extend_from_slice(&buf[first..]);
    Ok(out)
}

/// DecodeChecked: 𝕊 → (version, payload)
///
/// Requires the decoded length to be exactly 25 bytes
/// (1 version + 20 payload + 4 checksum) and the trailing 4 bytes to equal
/// the first 4 bytes of SHA256(SHA256(version ‖ payload)).
pub fn decode_checked(source: &str) -> Result<(u8, Hash160)> {
    let decoded = decode(source)?;
    if decoded.len() != BASE58_CHECKED_LENGTH {
        return Err(VerificationError::InvalidFormat(format!(
            "checked Base58 payload must be {} bytes, got {}",
            BASE58_CHECKED_LENGTH,
            decoded.len()
        )));
    }

    let body = &decoded[..BASE58_CHECKED_LENGTH - CHECKSUM_LENGTH];
    let checksum = &decoded[BASE58_CHECKED_LENGTH - CHECKSUM_LENGTH..];
    let expected = double_sha256(body);
    if checksum != &expected[..CHECKSUM_LENGTH] {
        return Err(VerificationError::ChecksumMismatch(
            "Base58Check double-SHA256 mismatch".to_string(),
        ));
    }

    let mut payload = [0u8; 20];
    payload.copy_from_slice(&body[1..]);
    Ok((body[0], payload))
}

/// Encode bytes as a Base58 string, leading zeros rendered as '1's.
pub fn encode(payload: &[u8]) -> String {
    let zeros = payload.iter().take_while(|&&b| b == 0).count();

    // Least significant digit at index 0, grown as carries spill over
    let mut digits = vec![0u8; payload.len() * 138 / 100 + 1];
    let mut length = 0usize;
    for &byte in &payload[zeros..] {
        let mut carry = byte as u32;
        for d in digits[..length].iter_mut() {
            carry += (*d as u32) << 8;
            *d = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits[length] = (carry % 58) as u8;
            length += 1;
            carry /= 58;
        }
    }

    let mut out = String::with_capacity(zeros + length);
    for _ in 0..zeros {
        out.push('1');
    }
    for &d in digits[..length].iter().rev() {
        out.push(ALPHABET[d as usize] as char);
    }
    out
}

/// Encode a version byte and 20-byte payload with the 4-byte checksum.
pub fn encode_checked(version: u8, payload: &Hash160) -> String {
    let mut body = Vec::with_capacity(BASE58_CHECKED_LENGTH);
    body.push(version);
    body.extend_from_slice(payload);
    let checksum = double_sha256(&body);
    body.extend_from_slice(&checksum[..CHECKSUM_LENGTH]);
    encode(&body)
}

pub(crate) fn digit_value(c: char) -> Result<u8> {
    if !c.is_ascii() {
        return Err(VerificationError::InvalidCharacter(c));
    }
    ALPHABET
        .iter()
        .position(|&a| a == c as u8)
        .map(|p| p as u8)
        .ok_or(VerificationError::InvalidCharacter(c))
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}
