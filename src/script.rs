//! Locking-script construction and transaction-side matching

use crate::address::hash160;
use crate::constants::*;
use crate::error::{Result, VerificationError};
use crate::transaction::{extract_op_return_payload, parse_inputs, parse_outputs};
use crate::types::{Address, ByteString, Hash, ScriptType};

/// BuildLockingScript: 𝒜 → 𝕊
///
/// | type   | template                               |
/// |--------|----------------------------------------|
/// | P2PKH  | 76 a9 14 <20-byte hash> 88 ac          |
/// | P2SH   | a9 14 <20-byte hash> 87                |
/// | P2WPKH | 00 14 <20-byte hash>                   |
/// | P2WSH  | 00 20 <32-byte hash>                   |
pub fn build_locking_script(address: &Address) -> ByteString {
    let hash = address.script_hash();
    let mut script = Vec::with_capacity(hash.len() + 5);
    match address.script_type() {
        ScriptType::P2pkh => {
            script.extend_from_slice(&[OP_DUP, OP_HASH160, hash.len() as u8]);
            script.extend_from_slice(hash);
            script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        }
        ScriptType::P2sh => {
            script.extend_from_slice(&[OP_HASH160, hash.len() as u8]);
            script.extend_from_slice(hash);
            script.push(OP_EQUAL);
        }
        ScriptType::P2wpkh | ScriptType::P2wsh => {
            script.extend_from_slice(&[WITNESS_VERSION_0, hash.len() as u8]);
            script.extend_from_slice(hash);
        }
    }
    script
}

/// VerifyPaymentOutput: does any output pay at least `min_amount` to the
/// exact locking script of `address`?
pub fn verify_payment_output(
    output_vector: &[u8],
    address: &Address,
    min_amount: u64,
) -> Result<bool> {
    let template = build_locking_script(address);
    for output in parse_outputs(output_vector)? {
        if output.script == template.as_slice() && output.value >= min_amount {
            return Ok(true);
        }
    }
    Ok(false)
}

/// VerifyInputOwnership: is any input spent from `address`?
///
/// P2PKH inputs carry `<sig> <pubkey>`; the pubkey hashes back to the
/// address payload. P2SH inputs carry the redeem script as their last data
/// push; hashing it gives the address payload. That last-push rule is the
/// standard-spend convention and can be fooled by non-standard redeem
/// scripts. Witness types keep an empty scriptSig, so there is nothing to
/// match against and the check fails closed.
pub fn verify_input_ownership(input_vector: &[u8], address: &Address) -> Result<bool> {
    match address.script_type() {
        ScriptType::P2wpkh | ScriptType::P2wsh => {
            Err(VerificationError::UnsupportedOperation(
                "witness inputs carry no scriptSig to match".to_string(),
            ))
        }
        ScriptType::P2pkh => {
            for input in parse_inputs(input_vector)? {
                if let Some(pushes) = data_pushes(input.script_sig) {
                    if pushes.len() == 2 && hash160(pushes[1]).as_slice() == address.script_hash() {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        }
        ScriptType::P2sh => {
            for input in parse_inputs(input_vector)? {
                if let Some(pushes) = data_pushes(input.script_sig) {
                    if let Some(redeem_script) = pushes.last() {
                        if hash160(redeem_script).as_slice() == address.script_hash() {
                            return Ok(true);
                        }
                    }
                }
            }
            Ok(false)
        }
    }
}

/// VerifyOpReturnPayload: does the transaction broadcast the expected
/// 32-byte challenge in an OP_RETURN output?
pub fn verify_op_return_payload(output_vector: &[u8], expected: &Hash) -> Result<bool> {
    Ok(matches!(
        extract_op_return_payload(output_vector)?,
        Some(payload) if payload == *expected
    ))
}

/// Split a scriptSig into its data pushes. Standard spend scripts consist
/// only of pushes; any other opcode makes the script non-standard and the
/// result `None`.
fn data_pushes(script: &[u8]) -> Option<Vec<&[u8]>> {
    let mut pushes = Vec::new();
    let mut i = 0usize;
    while i < script.len() {
        let (len, skip) = match script[i] {
            0x00 => (0usize, 1usize),
            op @ 0x01..=0x4b => (op as usize, 1),
            OP_PUSHDATA1 => (*script.get(i + 1)? as usize, 2),
            OP_PUSHDATA2 => {
                let lo = *script.get(i + 1)? as usize;
                let hi = *script.get(i + 2)? as usize;
                (lo | (hi << 8), 3)
            }
            _ => return None,
        };
        let data = script.get(i + skip..i + skip + len)?;
        pushes.push(data);
        i += skip + len;
    }
    Some(pushes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::decode_address;

    const TX5_VOUT: &str = "0400e6e849000000001976a91472d52e2f5b88174c35ee29844cce0d6d24b921ef88ac20aaa72e000000001976a914c15b731d0116ef8192f240d4397a8cdbce5fe8bc88acf02cfa51000000001976a914c7ee32e6945d7de5a4541dd2580927128c11517488acf012e39b000000001976a9140a59837ccd4df25adc31cdad39be6a8d97557ed688ac";
    const P2PKH_VIN: &str = "012c90289bb8cd178cba83cebcd2fdd47c5e35100aa9029172f160725ad1bda23b000000006b483045022100bcdf40fb3b5ebfa2c158ac8d1a41c03eb3dba4e180b00e81836bafd56d946efd022005cc40e35022b614275c1e485c409599667cbd41f6e5d78f421cb260a020a24f01210255ea3f53ce3ed1ad2c08dfc23b211b15b852afb819492a9a0f3f99e5747cb5f0ffffffff";

    #[test]
    fn test_p2pkh_template() {
        let addr = decode_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2").unwrap();
        assert_eq!(
            build_locking_script(&addr),
            hex::decode("76a91477bff20c60e522dfaa3350c39b030a5d004e839a88ac").unwrap()
        );
    }

    #[test]
    fn test_p2sh_template() {
        let addr = decode_address("3MaB7QVq3k4pQx3BhsvEADgzQonLSBwMdj").unwrap();
        assert_eq!(
            build_locking_script(&addr),
            hex::decode("a914da1745e9b549bd0bfa1a569971c77eba30cd5a4b87").unwrap()
        );
    }

    #[test]
    fn test_witness_templates() {
        let p2wpkh = decode_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").unwrap();
        assert_eq!(
            build_locking_script(&p2wpkh),
            hex::decode("0014751e76e8199196d454941c45d1b3a323f1433bd6").unwrap()
        );

        let p2wsh = decode_address(
            "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3",
        )
        .unwrap();
        assert_eq!(
            build_locking_script(&p2wsh),
            hex::decode("00201863143c14c5166804bd19203356da136c985678cd4d27a1b8c6329604903262")
                .unwrap()
        );
    }

    #[test]
    fn test_payment_output_match_and_amount_boundary() {
        let vout = hex::decode(TX5_VOUT).unwrap();
        // Output 0 pays 1_240_000_000 sat to this address
        let addr = decode_address("1BUBQuPV3gEV7P2XLNuAJQjf5t265Yyj9t").unwrap();

        assert!(verify_payment_output(&vout, &addr, 1_240_000_000).unwrap());
        assert!(verify_payment_output(&vout, &addr, 1).unwrap());
        // One satoshi above the paid amount must not match
        assert!(!verify_payment_output(&vout, &addr, 1_240_000_001).unwrap());
    }

    #[test]
    fn test_payment_output_wrong_address() {
        let vout = hex::decode(TX5_VOUT).unwrap();
        let other = decode_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2").unwrap();
        assert!(!verify_payment_output(&vout, &other, 1).unwrap());
    }

    #[test]
    fn test_input_ownership_p2pkh() {
        let vin = hex::decode(P2PKH_VIN).unwrap();
        // The spending pubkey hashes to this address
        let owner = decode_address("157HqdxdT8dxTjeRLVT5HPtFc1LH4CeuVC").unwrap();
        assert!(verify_input_ownership(&vin, &owner).unwrap());

        let stranger = decode_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2").unwrap();
        assert!(!verify_input_ownership(&vin, &stranger).unwrap());
    }

    #[test]
    fn test_input_ownership_p2sh_last_push() {
        // scriptSig: OP_0 then a pushed one-byte redeem script {OP_1}
        let script_sig = [0x00u8, 0x01, 0x51];
        let mut vin = vec![0x01];
        vin.extend_from_slice(&[0u8; 36]);
        vin.push(script_sig.len() as u8);
        vin.extend_from_slice(&script_sig);
        vin.extend_from_slice(&[0xff; 4]);

        let owner = decode_address("3MaB7QVq3k4pQx3BhsvEADgzQonLSBwMdj").unwrap();
        assert!(verify_input_ownership(&vin, &owner).unwrap());
    }

    #[test]
    fn test_input_ownership_witness_types_fail_closed() {
        let vin = hex::decode(P2PKH_VIN).unwrap();
        let addr = decode_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").unwrap();
        assert!(matches!(
            verify_input_ownership(&vin, &addr),
            Err(VerificationError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_data_pushes_rejects_non_push_opcodes() {
        // OP_DUP is not a push
        assert!(data_pushes(&[OP_DUP]).is_none());
        // Truncated push
        assert!(data_pushes(&[0x02, 0xaa]).is_none());
        // OP_PUSHDATA1
        let pushes = data_pushes(&[OP_PUSHDATA1, 2, 0xaa, 0xbb]).unwrap();
        assert_eq!(pushes, vec![&[0xaa, 0xbb][..]]);
    }

    #[test]
    fn test_op_return_challenge() {
        let challenge: Hash =
            hex::decode("57dda09ad2e827c8773dea96b37ab9da38dccfa47f85f81e9cbcb6d27a0f5ac7")
                .unwrap()
                .try_into()
                .unwrap();
        let vout = hex::decode("03a0860100000000001976a91472d52e2f5b88174c35ee29844cce0d6d24b921ef88ac0000000000000000226a2057dda09ad2e827c8773dea96b37ab9da38dccfa47f85f81e9cbcb6d27a0f5ac750c3000000000000160014751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();

        assert!(verify_op_return_payload(&vout, &challenge).unwrap());
        let wrong = [0u8; 32];
        assert!(!verify_op_return_payload(&vout, &wrong).unwrap());
    }
}
