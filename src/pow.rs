//! Proof-of-work evaluation: target arithmetic and header-chain validation

use sha2::{Digest, Sha256};

use crate::constants::*;
use crate::error::{Result, VerificationError};
use crate::types::{Hash, Natural};

/// 256-bit integer for Bitcoin target and difficulty calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct U256([u64; 4]); // 4 * 64 = 256 bits, least significant word first

/// The difficulty-1 target, 0xffff << 208 (compact form 0x1d00ffff)
pub const DIFF1_TARGET: U256 = U256([0, 0, 0, 0x0000_0000_ffff_0000]);

impl U256 {
    pub fn zero() -> Self {
        U256([0; 4])
    }

    pub fn from_u64(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    /// Interpret 32 bytes as a little-endian 256-bit integer, the byte
    /// order Bitcoin uses when comparing header digests against targets.
    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let start = i * 8;
            *word = u64::from_le_bytes([
                bytes[start],
                bytes[start + 1],
                bytes[start + 2],
                bytes[start + 3],
                bytes[start + 4],
                bytes[start + 5],
                bytes[start + 6],
                bytes[start + 7],
            ]);
        }
        U256(words)
    }

    fn bit(&self, i: usize) -> bool {
        (self.0[i / 64] >> (i % 64)) & 1 == 1
    }

    fn set_bit(&mut self, i: usize) {
        self.0[i / 64] |= 1 << (i % 64);
    }

    fn shl(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::zero();
        }

        let mut result = U256::zero();
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in 0..4 {
            if i + word_shift < 4 {
                result.0[i + word_shift] |= self.0[i] << bit_shift;
                if bit_shift > 0 && i + word_shift + 1 < 4 {
                    result.0[i + word_shift + 1] |= self.0[i] >> (64 - bit_shift);
                }
            }
        }

        result
    }

    fn shr(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::zero();
        }

        let mut result = U256::zero();
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in 0..4 {
            if i >= word_shift {
                result.0[i - word_shift] |= self.0[i] >> bit_shift;
                if bit_shift > 0 && i - word_shift + 1 < 4 {
                    result.0[i - word_shift + 1] |= self.0[i] << (64 - bit_shift);
                }
            }
        }

        result
    }

    /// Addition saturating at 2^256 - 1; accumulated work past that point
    /// is unrepresentable and compares correctly anyway.
    pub fn saturating_add(&self, other: &U256) -> Self {
        let mut out = [0u64; 4];
        let mut carry = 0u64;
        for i in 0..4 {
            let (s1, c1) = self.0[i].overflowing_add(other.0[i]);
            let (s2, c2) = s1.overflowing_add(carry);
            out[i] = s2;
            carry = (c1 as u64) | (c2 as u64);
        }
        if carry != 0 {
            U256([u64::MAX; 4])
        } else {
            U256(out)
        }
    }

    /// Saturating scalar multiplication.
    pub fn mul_u64(&self, rhs: u64) -> Self {
        let mut out = [0u64; 4];
        let mut carry = 0u128;
        for i in 0..4 {
            let product = self.0[i] as u128 * rhs as u128 + carry;
            out[i] = product as u64;
            carry = product >> 64;
        }
        if carry != 0 {
            U256([u64::MAX; 4])
        } else {
            U256(out)
        }
    }

    fn sub(&self, other: &U256) -> Self {
        let mut out = [0u64; 4];
        let mut borrow = 0u64;
        for i in 0..4 {
            let (d1, b1) = self.0[i].overflowing_sub(other.0[i]);
            let (d2, b2) = d1.overflowing_sub(borrow);
            out[i] = d2;
            borrow = (b1 as u64) | (b2 as u64);
        }
        U256(out)
    }

    /// Truncating long division. The divisor must be non-zero; callers get
    /// their targets from `expand_target`, which rejects a zero mantissa.
    fn div(&self, divisor: &U256) -> Self {
        let mut quotient = U256::zero();
        let mut remainder = U256::zero();
        for i in (0..256).rev() {
            remainder = remainder.shl(1);
            if self.bit(i) {
                remainder.0[0] |= 1;
            }
            if remainder >= *divisor {
                remainder = remainder.sub(divisor);
                quotient.set_bit(i);
            }
        }
        quotient
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        for (a, b) in self.0.iter().rev().zip(other.0.iter().rev()) {
            match a.cmp(b) {
                std::cmp::Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        std::cmp::Ordering::Equal
    }
}

/// Expand a compact difficulty target.
///
/// The compact form 0xEEMMMMMM encodes mantissa * 2^(8 * (exponent - 3)).
/// The sign bit (0x00800000) and a zero mantissa never occur in a real
/// header and are rejected; exponents cover the format's full 1..=32 range
/// so low-difficulty test-network headers still expand.
pub fn expand_target(bits: u32) -> Result<U256> {
    let exponent = (bits >> 24) as u8;
    let mantissa = bits & 0x00ff_ffff;

    if !(1..=32).contains(&exponent) {
        return Err(VerificationError::InvalidHeaderChain(format!(
            "target exponent {} out of range",
            exponent
        )));
    }
    if mantissa == 0 {
        return Err(VerificationError::InvalidHeaderChain(
            "zero target mantissa".to_string(),
        ));
    }
    if mantissa & 0x0080_0000 != 0 {
        return Err(VerificationError::InvalidHeaderChain(
            "negative compact target".to_string(),
        ));
    }

    let mantissa = U256::from_u64(mantissa as u64);
    if exponent <= 3 {
        Ok(mantissa.shr(8 * (3 - exponent) as u32))
    } else {
        Ok(mantissa.shl(8 * (exponent - 3) as u32))
    }
}

/// Difficulty of a target: DIFF1_TARGET / target, truncating.
pub fn difficulty_of(target: &U256) -> Result<U256> {
    if target.is_zero() {
        return Err(VerificationError::InvalidHeaderChain(
            "zero target has no difficulty".to_string(),
        ));
    }
    Ok(DIFF1_TARGET.div(target))
}

/// Double-SHA256 of an 80-byte serialized header.
pub fn header_hash(header: &[u8]) -> Hash {
    let first = Sha256::digest(header);
    Sha256::digest(first).into()
}

/// Merkle root field at its fixed offset within the 80-byte header.
pub fn extract_merkle_root(header: &[u8]) -> Hash {
    let mut root = [0u8; 32];
    root.copy_from_slice(&header[MERKLE_ROOT_OFFSET..MERKLE_ROOT_OFFSET + 32]);
    root
}

/// Previous-block hash field (bytes 4..36).
pub fn extract_prev_hash(header: &[u8]) -> Hash {
    let mut prev = [0u8; 32];
    prev.copy_from_slice(&header[4..36]);
    prev
}

/// Compact difficulty bits, little-endian at bytes 72..76.
pub fn extract_bits(header: &[u8]) -> u32 {
    u32::from_le_bytes([
        header[TARGET_BITS_OFFSET],
        header[TARGET_BITS_OFFSET + 1],
        header[TARGET_BITS_OFFSET + 2],
        header[TARGET_BITS_OFFSET + 3],
    ])
}

/// ValidateHeaderChain: 𝔹* → accumulated difficulty
///
/// For a buffer of concatenated 80-byte headers:
/// 1. The buffer must hold 1..=2016 whole headers
/// 2. Every header after the first must reference the double-SHA256 of its
///    predecessor
/// 3. Every header's digest, read as a little-endian integer, must not
///    exceed its own expanded target
/// 4. The sum of per-header difficulties is returned
pub fn validate_header_chain(headers: &[u8]) -> Result<U256> {
    if headers.is_empty() || headers.len() % HEADER_LENGTH != 0 {
        return Err(VerificationError::InvalidHeaderChain(format!(
            "{} bytes is not a whole number of {}-byte headers",
            headers.len(),
            HEADER_LENGTH
        )));
    }
    let count = headers.len() / HEADER_LENGTH;
    if count > MAX_PROOF_HEADERS {
        return Err(VerificationError::InvalidHeaderChain(format!(
            "{} headers exceed the {} limit",
            count, MAX_PROOF_HEADERS
        )));
    }

    let mut accumulated = U256::zero();
    let mut previous_digest: Option<Hash> = None;
    for header in headers.chunks(HEADER_LENGTH) {
        let target = expand_target(extract_bits(header))?;

        if let Some(prev) = previous_digest {
            if extract_prev_hash(header) != prev {
                return Err(VerificationError::InvalidHeaderChain(
                    "header does not reference its predecessor".to_string(),
                ));
            }
        }

        let digest = header_hash(header);
        if U256::from_le_bytes(&digest) > target {
            return Err(VerificationError::InvalidHeaderChain(
                "header digest exceeds its target".to_string(),
            ));
        }

        accumulated = accumulated.saturating_add(&difficulty_of(&target)?);
        previous_digest = Some(digest);
    }

    Ok(accumulated)
}

/// Whether the accumulated work clears requested × factor. Equality passes.
pub fn meets_required_difficulty(
    accumulated: &U256,
    requested: Natural,
    factor: Natural,
) -> bool {
    *accumulated >= U256::from_u64(requested).mul_u64(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mainnet headers 0, 1, 2 - all at difficulty 1
    const GENESIS: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c";
    const BLOCK1: &str = "010000006fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000982051fd1e4ba744bbbe680e1fee14677ba1a3c3540bf7b1cdb606e857233e0e61bc6649ffff001d01e36299";
    const BLOCK2: &str = "010000004860eb18bf1b1620e37e9490fc8a427514416fd75159ab86688e9a8300000000d5fdcc541e25de1c7a5addedf24858b8bb665c9f36ef744ee42c316022c90f9bb0bc6649ffff001d08d2bd61";

    fn chain() -> Vec<u8> {
        let mut headers = hex::decode(GENESIS).unwrap();
        headers.extend_from_slice(&hex::decode(BLOCK1).unwrap());
        headers.extend_from_slice(&hex::decode(BLOCK2).unwrap());
        headers
    }

    #[test]
    fn test_expand_target_diff1() {
        assert_eq!(expand_target(DIFF1_BITS).unwrap(), DIFF1_TARGET);
    }

    #[test]
    fn test_expand_target_small_exponents() {
        // exponent 3: mantissa verbatim
        assert_eq!(expand_target(0x03123456).unwrap(), U256::from_u64(0x123456));
        // exponent 2: one byte shifted off
        assert_eq!(expand_target(0x02123456).unwrap(), U256::from_u64(0x1234));
    }

    #[test]
    fn test_expand_target_rejects_bad_compacts() {
        assert!(expand_target(0x00ffffff).is_err()); // exponent too small
        assert!(expand_target(0x21ffffff).is_err()); // exponent too large
        assert!(expand_target(0x1d000000).is_err()); // zero mantissa
        assert!(expand_target(0x1d800000).is_err()); // sign bit set
    }

    #[test]
    fn test_difficulty_of_diff1_is_one() {
        assert_eq!(difficulty_of(&DIFF1_TARGET).unwrap(), U256::from_u64(1));
    }

    #[test]
    fn test_difficulty_truncates() {
        // A target twice DIFF1 has difficulty 0 after truncation
        let easy = DIFF1_TARGET.shl(1);
        assert_eq!(difficulty_of(&easy).unwrap(), U256::zero());
    }

    #[test]
    fn test_u256_division() {
        let a = U256::from_u64(1_000_000);
        assert_eq!(a.div(&U256::from_u64(7)), U256::from_u64(142_857));
        assert_eq!(DIFF1_TARGET.div(&DIFF1_TARGET), U256::from_u64(1));
        assert_eq!(U256::from_u64(3).div(&U256::from_u64(5)), U256::zero());
    }

    #[test]
    fn test_u256_mul_and_add() {
        assert_eq!(U256::from_u64(6).mul_u64(7), U256::from_u64(42));
        assert_eq!(
            U256::from_u64(40).saturating_add(&U256::from_u64(2)),
            U256::from_u64(42)
        );
        assert_eq!(
            U256([u64::MAX; 4]).saturating_add(&U256::from_u64(1)),
            U256([u64::MAX; 4])
        );
    }

    #[test]
    fn test_u256_ordering_across_words() {
        let low = U256([u64::MAX, 0, 0, 0]);
        let high = U256([0, 1, 0, 0]);
        assert!(low < high);
        assert!(DIFF1_TARGET > U256::from_u64(u64::MAX));
    }

    #[test]
    fn test_header_field_extraction() {
        let genesis = hex::decode(GENESIS).unwrap();
        assert_eq!(
            extract_merkle_root(&genesis).to_vec(),
            hex::decode("3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a")
                .unwrap()
        );
        assert_eq!(extract_prev_hash(&genesis), [0u8; 32]);
        assert_eq!(extract_bits(&genesis), DIFF1_BITS);
    }

    #[test]
    fn test_validate_real_genesis_chain() {
        let accumulated = validate_header_chain(&chain()).unwrap();
        // Three difficulty-1 headers
        assert_eq!(accumulated, U256::from_u64(3));
    }

    #[test]
    fn test_validate_rejects_broken_linkage() {
        let mut headers = chain();
        // Corrupt block 1's prev-hash field
        headers[80 + 4] ^= 0x01;
        assert!(matches!(
            validate_header_chain(&headers),
            Err(VerificationError::InvalidHeaderChain(_))
        ));
    }

    #[test]
    fn test_validate_rejects_insufficient_work() {
        let mut headers = chain();
        // Corrupt the genesis nonce; its digest will not meet the target
        headers[76] ^= 0x01;
        assert!(matches!(
            validate_header_chain(&headers),
            Err(VerificationError::InvalidHeaderChain(_))
        ));
    }

    #[test]
    fn test_validate_rejects_ragged_buffer() {
        let mut headers = chain();
        headers.pop();
        assert!(validate_header_chain(&headers).is_err());
        assert!(validate_header_chain(&[]).is_err());
    }

    #[test]
    fn test_meets_required_difficulty_boundary() {
        let accumulated = U256::from_u64(12);
        assert!(meets_required_difficulty(&accumulated, 2, 6)); // exactly equal
        assert!(meets_required_difficulty(&accumulated, 2, 5)); // above
        assert!(!meets_required_difficulty(&U256::from_u64(11), 2, 6)); // one below
    }
}
