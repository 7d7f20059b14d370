//! Call payloads for the v0.6 EntryPoint contract.

use ethers::types::{Address, Bytes};

use crate::abi::{AbiType, AbiValue, Function};
use crate::error::{EncodingError, Error};
use crate::hash::Domain;
use crate::signer::UserOpSigner;
use crate::types::{
    user_operation_fields, user_operation_type, SignedUserOperation, UserOperationBuilder,
};

/// `handleOps(UserOperation[] ops, address payable beneficiary)`
pub fn handle_ops_function() -> Function {
    Function::new(
        "handleOps",
        vec![AbiType::TupleArray(user_operation_fields()), AbiType::Address],
    )
}

/// `getUserOpHash(UserOperation userOp) view returns (bytes32)`
pub fn get_user_op_hash_function() -> Function {
    Function::new("getUserOpHash", vec![user_operation_type()])
}

pub fn handle_ops_calldata(
    ops: &[SignedUserOperation],
    beneficiary: Address,
) -> Result<Bytes, EncodingError> {
    let ops = ops.iter().map(SignedUserOperation::as_abi_value).collect();
    handle_ops_function().encode_call(&[AbiValue::Array(ops), AbiValue::Address(beneficiary)])
}

/// Builds, signs and encodes a whole bundle in order. Stops at the first
/// operation that is incomplete or that the signer rejects.
pub fn bundle<S>(
    ops: Vec<UserOperationBuilder>,
    signer: &S,
    domain: &Domain,
    beneficiary: Address,
) -> Result<(Vec<SignedUserOperation>, Bytes), Error>
where
    S: UserOpSigner + ?Sized,
{
    let signed = ops
        .into_iter()
        .map(|op| Ok(op.build()?.sign(signer, domain)?))
        .collect::<Result<Vec<_>, Error>>()?;
    let calldata = handle_ops_calldata(&signed, beneficiary)?;
    Ok((signed, calldata))
}

/// Lets the on-chain EntryPoint recompute the hash of `op` for comparison.
pub fn get_user_op_hash_calldata(op: &SignedUserOperation) -> Result<Bytes, EncodingError> {
    get_user_op_hash_function().encode_call(&[op.as_abi_value()])
}
