//! SimpleAccount / SimpleAccountFactory call data.

use ethers::types::{Address, Bytes, U256};

use crate::abi::{AbiType, AbiValue, Function};
use crate::error::EncodingError;

/// `initCode` for a not-yet-deployed account: the factory address followed by
/// `createAccount(owner, salt)` call data.
pub fn init_code(factory: Address, owner: Address, salt: U256) -> Result<Bytes, EncodingError> {
    let create_account = Function::new("createAccount", vec![AbiType::Address, AbiType::Uint256]);
    let create_calldata =
        create_account.encode_call(&[AbiValue::Address(owner), AbiValue::Uint(salt)])?;

    let mut v = Vec::with_capacity(20 + create_calldata.len());
    v.extend_from_slice(factory.as_bytes());
    v.extend_from_slice(create_calldata.as_ref());
    Ok(Bytes::from(v))
}

/// `execute(address dest, uint256 value, bytes func)`
pub fn execute_calldata(dest: Address, value: U256, func: Bytes) -> Result<Bytes, EncodingError> {
    Function::new(
        "execute",
        vec![AbiType::Address, AbiType::Uint256, AbiType::Bytes],
    )
    .encode_call(&[
        AbiValue::Address(dest),
        AbiValue::Uint(value),
        AbiValue::Bytes(func),
    ])
}
