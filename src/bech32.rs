//! Bech32 codec (BIP-173) for native SegWit addresses

use crate::constants::*;
use crate::error::{Result, VerificationError};
use crate::types::ByteString;

/// Bech32 character set
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Reverse lookup table for Bech32 characters (both cases)
const CHARSET_REV: [i8; 128] = [
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    15, -1, 10, 17, 21, 20, 26, 30,  7,  5, -1, -1, -1, -1, -1, -1,
    -1, 29, -1, 24, 13, 25,  9,  8, 23, -1, 18, 22, 31, 27, 19, -1,
     1,  0,  3, 16, 11, 28, 12, 14,  6,  4,  2, -1, -1, -1, -1, -1,
    -1, 29, -1, 24, 13, 25,  9,  8, 23, -1, 18, 22, 31, 27, 19, -1,
     1,  0,  3, 16, 11, 28, 12, 14,  6,  4,  2, -1, -1, -1, -1, -1,
];

/// One step of the BIP-173 generator-polynomial checksum
#[inline]
fn polymod_step(pre: u32) -> u32 {
    let b = pre >> 25;
    ((pre & 0x1ff_ffff) << 5)
        ^ (if b & 1 != 0 { 0x3b6a_57b2 } else { 0 })
        ^ (if b & 2 != 0 { 0x2650_8e6d } else { 0 })
        ^ (if b & 4 != 0 { 0x1ea1_19fa } else { 0 })
        ^ (if b & 8 != 0 { 0x3d42_33dd } else { 0 })
        ^ (if b & 16 != 0 { 0x2a14_62b3 } else { 0 })
}

/// Fold the polymod over the expanded HRP followed by the data values.
fn polymod(hrp: &str, data: &[u8]) -> u32 {
    let mut chk = 1u32;
    for c in hrp.bytes() {
        chk = polymod_step(chk) ^ ((c >> 5) as u32);
    }
    chk = polymod_step(chk);
    for c in hrp.bytes() {
        chk = polymod_step(chk) ^ ((c & 0x1f) as u32);
    }
    for &d in data {
        chk = polymod_step(chk) ^ (d as u32);
    }
    chk
}

/// Decode: 𝕊 → (hrp, d*) where d ∈ [0, 32)
///
/// For an address string a:
/// 1. Reject anything over 90 characters, under 8, or outside printable ASCII
/// 2. Reject mixed upper/lower case, then fold to lowercase
/// 3. Split at the last '1'; HRP must be non-empty, data part at least 6
/// 4. Map data characters through the 32-symbol charset
/// 5. The running polymod over HRP + data must equal 1
///
/// Returns the lowercase HRP and the data values with the 6 checksum
/// symbols already stripped.
pub fn decode(address: &str) -> Result<(String, Vec<u8>)> {
    // 1. Length and character-range bounds
    if address.len() > MAX_ADDRESS_LENGTH {
        return Err(VerificationError::InvalidFormat(format!(
            "address of {} characters exceeds the {} limit",
            address.len(),
            MAX_ADDRESS_LENGTH
        )));
    }
    if address.len() < 8 {
        return Err(VerificationError::InvalidFormat(
            "address too short for an HRP, separator and checksum".to_string(),
        ));
    }
    for c in address.chars() {
        if !(33..=126).contains(&(c as u32)) {
            return Err(VerificationError::InvalidCharacter(c));
        }
    }

    // 2. BIP-173 mandates a single case
    let has_lower = address.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = address.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(VerificationError::MixedCase);
    }
    let folded = address.to_ascii_lowercase();

    // 3. Split at the last separator
    let sep = folded
        .rfind('1')
        .ok_or_else(|| VerificationError::InvalidFormat("missing '1' separator".to_string()))?;
    if sep == 0 {
        return Err(VerificationError::InvalidFormat(
            "empty human-readable part".to_string(),
        ));
    }
    let (hrp, data_part) = (&folded[..sep], &folded[sep + 1..]);
    if data_part.len() < BECH32_CHECKSUM_LENGTH {
        return Err(VerificationError::InvalidFormat(
            "data part shorter than the checksum".to_string(),
        ));
    }

    // 4. Charset mapping
    let mut data = Vec::with_capacity(data_part.len());
    for c in data_part.chars() {
        let v = CHARSET_REV[c as usize];
        if v < 0 {
            return Err(VerificationError::InvalidCharacter(c));
        }
        data.push(v as u8);
    }

    // 5. Checksum
    if polymod(hrp, &data) != 1 {
        return Err(VerificationError::ChecksumMismatch(
            "Bech32 polymod is not 1".to_string(),
        ));
    }

    data.truncate(data.len() - BECH32_CHECKSUM_LENGTH);
    Ok((hrp.to_string(), data))
}

/// Encode 5-bit data values under the given HRP, appending the checksum.
pub fn encode(hrp: &str, data: &[u8]) -> String {
    let target = polymod_step_n(polymod(hrp, data)) ^ 1;
    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + BECH32_CHECKSUM_LENGTH);
    out.push_str(hrp);
    out.push('1');
    for &d in data {
        out.push(CHARSET[d as usize] as char);
    }
    for i in 0..BECH32_CHECKSUM_LENGTH {
        out.push(CHARSET[((target >> (5 * (5 - i))) & 0x1f) as usize] as char);
    }
    out
}

/// Six zero-feeds of the polymod, closing the checksum computation.
fn polymod_step_n(mut chk: u32) -> u32 {
    for _ in 0..BECH32_CHECKSUM_LENGTH {
        chk = polymod_step(chk);
    }
    chk
}

/// ConvertBits: regroup values between bit widths.
///
/// Encoding pads the final incomplete group with zero bits; decoding
/// (pad = false) rejects a leftover group that is too large or non-zero.
pub fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<ByteString> {
    let mut acc = 0u32;
    let mut bits = 0u32;
    let maxv = (1u32 << to) - 1;
    let mut out = Vec::with_capacity((data.len() * from as usize + to as usize - 1) / to as usize);

    for &v in data {
        if (v as u32) >> from != 0 {
            return Err(VerificationError::InvalidFormat(format!(
                "value {} does not fit in {} bits",
                v, from
            )));
        }
        acc = (acc << from) | v as u32;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & maxv) as u8);
        }
    }

    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & maxv) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & maxv) != 0 {
        return Err(VerificationError::InvalidFormat(
            "non-zero or oversized padding in 5-bit regrouping".to_string(),
        ));
    }

    Ok(out)
}

/// Whether a character belongs to the Bech32 charset (either case).
pub fn is_valid_char(c: char) -> bool {
    c.is_ascii() && CHARSET_REV[c as usize] >= 0
}

/// AddressToWitnessProgram: decode, then split version and program.
///
/// The first data value is the witness version, which must be 0 here; the
/// rest regroups 5→8 bits with no padding allowed. Only 20- and 32-byte
/// programs are meaningful to this system.
pub fn decode_witness_program(address: &str) -> Result<(u8, ByteString)> {
    let (_, data) = decode(address)?;
    if data.is_empty() {
        return Err(VerificationError::InvalidFormat(
            "empty data section".to_string(),
        ));
    }
    let version = data[0];
    if version != WITNESS_VERSION_0 {
        return Err(VerificationError::UnsupportedWitnessProgram(format!(
            "witness version {}",
            version
        )));
    }
    let program = convert_bits(&data[1..], 5, 8, false)?;
    if program.len() != 20 && program.len() != 32 {
        return Err(VerificationError::UnsupportedWitnessProgram(format!(
            "{}-byte program",
            program.len()
        )));
    }
    Ok((version, program))
}

/// Inverse of `decode_witness_program`: render a witness program under the
/// given HRP. Only called with version 0 inside this crate, but validated
/// for the full BIP-173 range.
pub fn encode_witness_program(hrp: &str, version: u8, program: &[u8]) -> Result<String> {
    if version > 16 {
        return Err(VerificationError::UnsupportedWitnessProgram(format!(
            "witness version {}",
            version
        )));
    }
    if program.len() < 2 || program.len() > 40 {
        return Err(VerificationError::UnsupportedWitnessProgram(format!(
            "{}-byte program",
            program.len()
        )));
    }
    let mut data = Vec::with_capacity(1 + (program.len() * 8 + 4) / 5);
    data.push(version);
    data.extend_from_slice(&convert_bits(program, 8, 5, true)?);
    Ok(encode(hrp, &data))
}
