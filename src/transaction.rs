//! Legacy transaction wire-format parsing and identification

use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};

use crate::constants::*;
use crate::error::{Result, VerificationError};
use crate::types::{ByteString, Hash, RawTransaction};

/// One parsed output, borrowing its script from the output vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutput<'a> {
    pub value: u64,
    pub script: &'a [u8],
}

/// One parsed input, borrowing its scriptSig from the input vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxInput<'a> {
    pub prevout_hash: Hash,
    pub prevout_index: u32,
    pub script_sig: &'a [u8],
    pub sequence: u32,
}

/// Read a Bitcoin VarInt at `offset`: 1, 3, 5, or 9 bytes little-endian.
/// `None` on truncation.
pub fn read_varint(data: &[u8], offset: usize) -> Option<(u64, usize)> {
    let tag = *data.get(offset)?;
    match tag {
        0xfd => {
            let b: [u8; 2] = data.get(offset + 1..offset + 3)?.try_into().ok()?;
            Some((u16::from_le_bytes(b) as u64, 3))
        }
        0xfe => {
            let b: [u8; 4] = data.get(offset + 1..offset + 5)?.try_into().ok()?;
            Some((u32::from_le_bytes(b) as u64, 5))
        }
        0xff => {
            let b: [u8; 8] = data.get(offset + 1..offset + 9)?.try_into().ok()?;
            Some((u64::from_le_bytes(b), 9))
        }
        v => Some((v as u64, 1)),
    }
}

/// ValidateVin: 𝔹* → ℕ
///
/// The vector is well-formed iff its VarInt count times well-formed inputs
/// (36-byte outpoint, VarInt script length, script, 4-byte sequence)
/// consumes exactly the provided bytes. Returns the input count.
pub fn validate_vin(vin: &[u8]) -> Result<u64> {
    let (count, end) = walk_inputs(vin).ok_or_else(|| {
        VerificationError::InvalidInputVector("truncated or malformed input entry".to_string())
    })?;
    if count == 0 {
        return Err(VerificationError::InvalidInputVector(
            "no inputs".to_string(),
        ));
    }
    if count > MAX_INPUTS {
        return Err(VerificationError::InvalidInputVector(format!(
            "{} inputs exceed the {} limit",
            count, MAX_INPUTS
        )));
    }
    if end != vin.len() {
        return Err(VerificationError::InvalidInputVector(format!(
            "{} trailing bytes after the last input",
            vin.len() - end
        )));
    }
    Ok(count)
}

/// ValidateVout: 𝔹* → ℕ
///
/// Same exact-consumption rule over outputs (8-byte value, VarInt script
/// length, script). Returns the output count.
pub fn validate_vout(vout: &[u8]) -> Result<u64> {
    let (count, end) = walk_outputs(vout).ok_or_else(|| {
        VerificationError::InvalidOutputVector("truncated or malformed output entry".to_string())
    })?;
    if count == 0 {
        return Err(VerificationError::InvalidOutputVector(
            "no outputs".to_string(),
        ));
    }
    if count > MAX_OUTPUTS {
        return Err(VerificationError::InvalidOutputVector(format!(
            "{} outputs exceed the {} limit",
            count, MAX_OUTPUTS
        )));
    }
    if end != vout.len() {
        return Err(VerificationError::InvalidOutputVector(format!(
            "{} trailing bytes after the last output",
            vout.len() - end
        )));
    }
    Ok(count)
}

/// Enumerate an output vector, applying the same rules as `validate_vout`.
pub fn parse_outputs(vout: &[u8]) -> Result<Vec<TxOutput<'_>>> {
    let count = validate_vout(vout)?;

    let mut outputs = Vec::with_capacity(count as usize);
    let mut offset = match read_varint(vout, 0) {
        Some((_, varint_len)) => varint_len,
        None => return Err(VerificationError::InvalidOutputVector("empty".to_string())),
    };
    for _ in 0..count {
        let value_bytes: [u8; 8] = vout
            .get(offset..offset + 8)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                VerificationError::InvalidOutputVector("truncated output value".to_string())
            })?;
        offset += 8;
        let (script_len, varint_len) = read_varint(vout, offset).ok_or_else(|| {
            VerificationError::InvalidOutputVector("truncated script length".to_string())
        })?;
        offset += varint_len;
        let script = vout
            .get(offset..offset + script_len as usize)
            .ok_or_else(|| {
                VerificationError::InvalidOutputVector("truncated output script".to_string())
            })?;
        offset += script_len as usize;
        outputs.push(TxOutput {
            value: u64::from_le_bytes(value_bytes),
            script,
        });
    }
    Ok(outputs)
}

/// Enumerate an input vector, applying the same rules as `validate_vin`.
pub fn parse_inputs(vin: &[u8]) -> Result<Vec<TxInput<'_>>> {
    let count = validate_vin(vin)?;

    let mut inputs = Vec::with_capacity(count as usize);
    let mut offset = match read_varint(vin, 0) {
        Some((_, varint_len)) => varint_len,
        None => return Err(VerificationError::InvalidInputVector("empty".to_string())),
    };
    for _ in 0..count {
        let outpoint = vin.get(offset..offset + 36).ok_or_else(|| {
            VerificationError::InvalidInputVector("truncated outpoint".to_string())
        })?;
        let mut prevout_hash = [0u8; 32];
        prevout_hash.copy_from_slice(&outpoint[..32]);
        let prevout_index =
            u32::from_le_bytes([outpoint[32], outpoint[33], outpoint[34], outpoint[35]]);
        offset += 36;
        let (script_len, varint_len) = read_varint(vin, offset).ok_or_else(|| {
            VerificationError::InvalidInputVector("truncated script length".to_string())
        })?;
        offset += varint_len;
        let script_sig = vin
            .get(offset..offset + script_len as usize)
            .ok_or_else(|| {
                VerificationError::InvalidInputVector("truncated scriptSig".to_string())
            })?;
        offset += script_len as usize;
        let sequence_bytes: [u8; 4] = vin
            .get(offset..offset + 4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                VerificationError::InvalidInputVector("truncated sequence".to_string())
            })?;
        offset += 4;
        inputs.push(TxInput {
            prevout_hash,
            prevout_index,
            script_sig,
            sequence: u32::from_le_bytes(sequence_bytes),
        });
    }
    Ok(inputs)
}

/// Scan for the first OP_RETURN output carrying a 32-byte push and return
/// its payload. The vector must already be structurally valid.
pub fn extract_op_return_payload(vout: &[u8]) -> Result<Option<Hash>> {
    for output in parse_outputs(vout)? {
        let script = output.script;
        if script.len() == 2 + OP_RETURN_PAYLOAD_LENGTH
            && script[0] == OP_RETURN
            && script[1] == OP_RETURN_PAYLOAD_LENGTH as u8
        {
            let mut payload = [0u8; OP_RETURN_PAYLOAD_LENGTH];
            payload.copy_from_slice(&script[2..]);
            return Ok(Some(payload));
        }
    }
    Ok(None)
}

/// TransactionId: SHA256(SHA256(version ‖ vin ‖ vout ‖ locktime))
///
/// Internal byte order; reverse for the display convention explorers use.
pub fn transaction_id(
    version: &[u8; 4],
    vin: &[u8],
    vout: &[u8],
    locktime: &[u8; 4],
) -> Hash {
    let mut engine = sha256d::Hash::engine();
    engine.input(version);
    engine.input(vin);
    engine.input(vout);
    engine.input(locktime);
    sha256d::Hash::from_engine(engine).into_inner()
}

impl RawTransaction {
    /// Split a serialized legacy transaction into its four fields,
    /// validating both vectors along the way.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < 4 + 1 + 1 + 4 {
            return Err(VerificationError::InvalidFormat(
                "transaction shorter than any legal serialization".to_string(),
            ));
        }

        let version = [raw[0], raw[1], raw[2], raw[3]];

        let (_, vin_end) = walk_inputs(&raw[4..]).ok_or_else(|| {
            VerificationError::InvalidInputVector("truncated or malformed input entry".to_string())
        })?;
        let input_vector = raw[4..4 + vin_end].to_vec();

        let vout_start = 4 + vin_end;
        let (_, vout_end) = walk_outputs(&raw[vout_start..]).ok_or_else(|| {
            VerificationError::InvalidOutputVector(
                "truncated or malformed output entry".to_string(),
            )
        })?;
        let output_vector = raw[vout_start..vout_start + vout_end].to_vec();

        let locktime_start = vout_start + vout_end;
        if locktime_start + 4 != raw.len() {
            return Err(VerificationError::InvalidFormat(
                "transaction does not end at its locktime".to_string(),
            ));
        }
        let locktime = [
            raw[locktime_start],
            raw[locktime_start + 1],
            raw[locktime_start + 2],
            raw[locktime_start + 3],
        ];

        let tx = RawTransaction {
            version,
            input_vector,
            output_vector,
            locktime,
        };
        validate_vin(&tx.input_vector)?;
        validate_vout(&tx.output_vector)?;
        Ok(tx)
    }

    /// Re-serialize into the legacy wire format.
    pub fn to_bytes(&self) -> ByteString {
        let mut out = Vec::with_capacity(
            4 + self.input_vector.len() + self.output_vector.len() + 4,
        );
        out.extend_from_slice(&self.version);
        out.extend_from_slice(&self.input_vector);
        out.extend_from_slice(&self.output_vector);
        out.extend_from_slice(&self.locktime);
        out
    }

    /// Double-SHA256 transaction id (internal byte order).
    pub fn txid(&self) -> Hash {
        transaction_id(
            &self.version,
            &self.input_vector,
            &self.output_vector,
            &self.locktime,
        )
    }
}

/// Walk the input vector; `Some((count, end_offset))` if every entry is in
/// bounds, `None` on any truncation or oversized script.
fn walk_inputs(data: &[u8]) -> Option<(u64, usize)> {
    let (count, mut offset) = read_varint(data, 0)?;
    for _ in 0..count {
        offset = offset.checked_add(36)?;
        let (script_len, varint_len) = read_varint(data, offset)?;
        if script_len > MAX_SCRIPT_SIZE {
            return None;
        }
        offset = offset
            .checked_add(varint_len)?
            .checked_add(script_len as usize)?
            .checked_add(4)?;
        if offset > data.len() {
            return None;
        }
    }
    Some((count, offset))
}

/// Walk the output vector under the same rules.
fn walk_outputs(data: &[u8]) -> Option<(u64, usize)> {
    let (count, mut offset) = read_varint(data, 0)?;
    for _ in 0..count {
        offset = offset.checked_add(8)?;
        let (script_len, varint_len) = read_varint(data, offset)?;
        if script_len > MAX_SCRIPT_SIZE {
            return None;
        }
        offset = offset
            .checked_add(varint_len)?
            .checked_add(script_len as usize)?;
        if offset > data.len() {
            return None;
        }
    }
    Some((count, offset))
}
