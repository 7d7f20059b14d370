use crate::types::SignedUserOperation;
use anyhow::{anyhow, bail, Result};
use ethers::types::{Address, Bytes, H256};
use ethers::utils::to_checksum;

pub fn fmt_address(addr: Address) -> String {
    format!("0x{}", hex::encode(addr.as_bytes()))
}

pub fn fmt_h256(h: H256) -> String {
    format!("0x{}", hex::encode(h.as_bytes()))
}

pub fn fmt_bytes(b: &Bytes) -> String {
    format!("0x{}", hex::encode(b.as_ref()))
}

/// Shape expected by `eth_sendUserOperation` / `eth_estimateUserOperationGas`:
/// camelCase keys, hex quantities, `0x`-prefixed byte strings.
pub fn user_op_to_json(signed: &SignedUserOperation) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(signed)
}

/// 20-byte hex address. All-lowercase or all-uppercase input is accepted as
/// is; mixed case must be a valid EIP-55 checksum.
pub fn parse_address(s: &str) -> Result<Address> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| anyhow!("address {s:?} is missing the 0x prefix"))?;
    let bytes = hex::decode(digits).map_err(|e| anyhow!("address {s:?}: {e}"))?;
    if bytes.len() != 20 {
        bail!("address {s:?} is {} bytes, expected 20", bytes.len());
    }
    let addr = Address::from_slice(&bytes);

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&addr, None) != s {
        bail!("address {s:?} has an invalid EIP-55 checksum");
    }
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Domain;
    use crate::types::{UserOperation, UserOperationBuilder};
    use ethers::signers::LocalWallet;
    use ethers::types::U256;
    use serde_json::json;

    #[test]
    fn bundler_json_uses_rpc_encodings() {
        let wallet: LocalWallet =
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".parse().unwrap();
        let domain = Domain::new(Address::repeat_byte(0xe4), 1u64);
        let signed = UserOperation::builder()
            .sender(Address::repeat_byte(0x11))
            .nonce(U256::zero())
            .call_data(Bytes::from(vec![0xde, 0xad]))
            .max_fee_per_gas(U256::from(255))
            .build()
            .unwrap()
            .sign(&wallet, &domain)
            .unwrap();

        let v = user_op_to_json(&signed).unwrap();
        assert_eq!(v, serde_json::to_value(&signed).unwrap());

        let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 11);
        assert_eq!(v["sender"], json!(fmt_address(Address::repeat_byte(0x11))));
        assert_eq!(v["nonce"], json!("0x0"));
        assert_eq!(v["maxFeePerGas"], json!("0xff"));
        assert_eq!(v["initCode"], json!("0x"));
        assert_eq!(v["callData"], json!("0xdead"));
        assert_eq!(v["paymasterAndData"], json!("0x"));
        assert_eq!(v["signature"], json!(fmt_bytes(signed.signature())));
    }

    #[test]
    fn bundler_json_reads_back_into_the_same_operation() {
        let wallet: LocalWallet =
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".parse().unwrap();
        let domain = Domain::new(Address::repeat_byte(0xe4), 1u64);
        let signed = UserOperation::builder()
            .sender(Address::repeat_byte(0x11))
            .nonce(U256::from(9))
            .init_code(Bytes::from(vec![1; 24]))
            .build()
            .unwrap()
            .sign(&wallet, &domain)
            .unwrap();

        let v = user_op_to_json(&signed).unwrap();
        let again = serde_json::from_value::<UserOperationBuilder>(v)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(&again, signed.operation());
    }

    #[test]
    fn parse_address_checks_length_and_checksum() {
        let good = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
        assert_eq!(parse_address(good).unwrap(), good.parse::<Address>().unwrap());
        assert!(parse_address(&good.to_lowercase()).is_ok());

        // one letter flipped to lowercase
        let bad = "0x5ff137D4b0FDCD49DcA30c7CF57E578a026d2789";
        assert!(parse_address(bad).is_err());

        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789").is_err());
    }
}
