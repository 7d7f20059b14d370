//! userOpHash derivation (EntryPoint v0.6).
//!
//! `keccak256(abi.encode(keccak256(pack(op)), entryPoint, chainId))`, where
//! `pack` replaces every dynamic field by its keccak256 and drops the signature.

use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;

use crate::abi::{address_word, uint_word, WORD};
use crate::types::UserOperation;

/// Size of [`pack`]'s output: ten static words.
pub const PACKED_LEN: usize = 10 * WORD;

/// The verifying context a userOpHash is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Domain {
    pub entry_point: Address,
    pub chain_id: U256,
}

impl Domain {
    pub fn new(entry_point: Address, chain_id: impl Into<U256>) -> Self {
        Self {
            entry_point,
            chain_id: chain_id.into(),
        }
    }

    pub fn user_op_hash(&self, op: &UserOperation) -> H256 {
        user_op_hash(op, self.entry_point, self.chain_id)
    }
}

/// Static 320-byte stand-in for `op`.
pub fn pack(op: &UserOperation) -> Vec<u8> {
    let words = [
        address_word(op.sender),
        uint_word(op.nonce),
        keccak256(&op.init_code),
        keccak256(&op.call_data),
        uint_word(op.call_gas_limit),
        uint_word(op.verification_gas_limit),
        uint_word(op.pre_verification_gas),
        uint_word(op.max_fee_per_gas),
        uint_word(op.max_priority_fee_per_gas),
        keccak256(&op.paymaster_and_data),
    ];
    words.concat()
}

pub fn user_op_hash(op: &UserOperation, entry_point: Address, chain_id: U256) -> H256 {
    let inner = keccak256(pack(op));

    let mut outer = Vec::with_capacity(3 * WORD);
    outer.extend_from_slice(&inner);
    outer.extend_from_slice(&address_word(entry_point));
    outer.extend_from_slice(&uint_word(chain_id));

    let hash = H256::from(keccak256(outer));
    tracing::debug!(sender = ?op.sender, %chain_id, user_op_hash = ?hash, "computed userOpHash");
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::{encode, Token};
    use ethers::types::Bytes;

    const ENTRY_POINT_V06: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";

    // keccak256(pack(zero_op()))
    const ZERO_OP_PACK_HASH: &str =
        "c17e00cf62b8bb8ddde6432f06a5180222980bfb4be8c88ba699e0581e272e1f";
    // userOpHash of zero_op() for the v0.6 EntryPoint on chain 1 and on Sepolia
    const ZERO_OP_HASH_MAINNET: &str =
        "0342b31d1183615a9c97b6467f315aabc1ccdf8575cd79c2bf1478ac4ffe6d11";
    const ZERO_OP_HASH_SEPOLIA: &str =
        "56509faa8f1d44020285909af71e8a00d4d334548dccf85d83d8768904697506";

    fn entry_point() -> Address {
        ENTRY_POINT_V06.parse().unwrap()
    }

    fn zero_op() -> UserOperation {
        UserOperation::builder()
            .sender(Address::from_low_u64_be(1))
            .nonce(U256::zero())
            .build()
            .unwrap()
    }

    fn busy_op() -> UserOperation {
        UserOperation::builder()
            .sender(Address::repeat_byte(0xab))
            .nonce(U256::from(7))
            .init_code(Bytes::from(vec![0x11; 88]))
            .call_data(Bytes::from(vec![0x22; 100]))
            .call_gas_limit(U256::from(100_000))
            .verification_gas_limit(U256::from(200_000))
            .pre_verification_gas(U256::from(50_000))
            .max_fee_per_gas(U256::from(3_000_000_000u64))
            .max_priority_fee_per_gas(U256::from(1_000_000_000u64))
            .paymaster_and_data(Bytes::from(vec![0x33; 20]))
            .build()
            .unwrap()
    }

    #[test]
    fn pack_is_ten_static_words() {
        assert_eq!(pack(&zero_op()).len(), PACKED_LEN);
        assert_eq!(pack(&busy_op()).len(), PACKED_LEN);
    }

    #[test]
    fn pack_of_zero_op_hashes_empty_fields() {
        let packed = pack(&zero_op());
        let empty = keccak256(b"");

        assert_eq!(packed[31], 1);
        assert!(packed[..31].iter().all(|b| *b == 0));
        assert!(packed[32..64].iter().all(|b| *b == 0));
        assert_eq!(&packed[64..96], &empty);
        assert_eq!(&packed[96..128], &empty);
        assert!(packed[128..288].iter().all(|b| *b == 0));
        assert_eq!(&packed[288..320], &empty);

        assert_eq!(hex::encode(keccak256(&packed)), ZERO_OP_PACK_HASH);
    }

    #[test]
    fn zero_op_hash_regression() {
        let op = zero_op();
        assert_eq!(
            hex::encode(user_op_hash(&op, entry_point(), U256::one())),
            ZERO_OP_HASH_MAINNET
        );
        let sepolia = Domain::new(entry_point(), 11155111u64);
        assert_eq!(hex::encode(sepolia.user_op_hash(&op)), ZERO_OP_HASH_SEPOLIA);
    }

    #[test]
    fn pack_matches_reference_encoder() {
        let op = busy_op();
        let reference = encode(&[
            Token::Address(op.sender),
            Token::Uint(op.nonce),
            Token::FixedBytes(keccak256(&op.init_code).to_vec()),
            Token::FixedBytes(keccak256(&op.call_data).to_vec()),
            Token::Uint(op.call_gas_limit),
            Token::Uint(op.verification_gas_limit),
            Token::Uint(op.pre_verification_gas),
            Token::Uint(op.max_fee_per_gas),
            Token::Uint(op.max_priority_fee_per_gas),
            Token::FixedBytes(keccak256(&op.paymaster_and_data).to_vec()),
        ]);
        assert_eq!(pack(&op), reference);

        let outer = encode(&[
            Token::FixedBytes(keccak256(&reference).to_vec()),
            Token::Address(entry_point()),
            Token::Uint(U256::from(10)),
        ]);
        assert_eq!(
            user_op_hash(&op, entry_point(), U256::from(10)),
            H256::from(keccak256(outer))
        );
    }

    #[test]
    fn any_call_data_byte_changes_the_hash() {
        let domain = Domain::new(entry_point(), 1u64);
        let base = busy_op();
        let base_hash = domain.user_op_hash(&base);

        let mut seen = std::collections::HashSet::new();
        seen.insert(base_hash);
        for i in 0..base.call_data.len() {
            let mut data = base.call_data.to_vec();
            data[i] ^= 0x01;
            let mut op = base.clone();
            op.call_data = Bytes::from(data);
            assert!(seen.insert(domain.user_op_hash(&op)), "collision at byte {i}");
        }
    }

    #[test]
    fn dynamic_field_contents_are_distinguished() {
        let domain = Domain::new(entry_point(), 1u64);
        let mut a = zero_op();
        let mut b = zero_op();
        a.init_code = Bytes::from(vec![1]);
        b.paymaster_and_data = Bytes::from(vec![1]);
        assert_ne!(domain.user_op_hash(&a), domain.user_op_hash(&b));
        assert_ne!(domain.user_op_hash(&a), domain.user_op_hash(&zero_op()));
    }

    #[test]
    fn domain_separates_chain_and_entry_point() {
        let op = busy_op();
        let base = Domain::new(entry_point(), 1u64).user_op_hash(&op);
        let other_chain = Domain::new(entry_point(), 10u64).user_op_hash(&op);
        let other_entry_point =
            Domain::new(Address::from_low_u64_be(0xe4), 1u64).user_op_hash(&op);

        assert_ne!(base, other_chain);
        assert_ne!(base, other_entry_point);
        assert_ne!(other_chain, other_entry_point);
    }
}
