use ethers::types::{Address, Bytes, H256, U256};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::abi::{AbiType, AbiValue};
use crate::error::{HashingError, SigningError};
use crate::hash::Domain;
use crate::signer::UserOpSigner;

/// ERC-4337 UserOperation (EntryPoint v0.6 layout), before it carries a signature.
///
/// Note: EntryPoint v0.7 uses a *different* packed struct layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
}

impl UserOperation {
    pub fn builder() -> UserOperationBuilder {
        UserOperationBuilder::default()
    }

    pub fn hash(&self, domain: &Domain) -> H256 {
        domain.user_op_hash(self)
    }

    /// Hashes the operation for `domain` and has `signer` sign it. This is the
    /// only way to obtain a [`SignedUserOperation`].
    pub fn sign<S>(self, signer: &S, domain: &Domain) -> Result<SignedUserOperation, SigningError>
    where
        S: UserOpSigner + ?Sized,
    {
        let user_op_hash = self.hash(domain);
        let signature = signer.sign_user_op_hash(user_op_hash)?;
        tracing::debug!(
            sender = ?self.sender,
            user_op_hash = ?user_op_hash,
            signature_len = signature.len(),
            "signed user operation"
        );
        Ok(SignedUserOperation {
            op: self,
            signature,
        })
    }
}

/// Collects UserOperation fields. `sender` and `nonce` are mandatory; every
/// other field defaults to zero or empty.
///
/// Deserializes from the camelCase JSON bundlers use. A `signature` key is
/// accepted and ignored; any other unknown key is an error.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct UserOperationBuilder {
    sender: Option<Address>,
    nonce: Option<U256>,
    init_code: Bytes,
    call_data: Bytes,
    call_gas_limit: U256,
    verification_gas_limit: U256,
    pre_verification_gas: U256,
    max_fee_per_gas: U256,
    max_priority_fee_per_gas: U256,
    paymaster_and_data: Bytes,
    #[allow(dead_code)]
    signature: Option<IgnoredAny>,
}

impl UserOperationBuilder {
    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn init_code(mut self, init_code: Bytes) -> Self {
        self.init_code = init_code;
        self
    }

    pub fn call_data(mut self, call_data: Bytes) -> Self {
        self.call_data = call_data;
        self
    }

    pub fn call_gas_limit(mut self, call_gas_limit: U256) -> Self {
        self.call_gas_limit = call_gas_limit;
        self
    }

    pub fn verification_gas_limit(mut self, verification_gas_limit: U256) -> Self {
        self.verification_gas_limit = verification_gas_limit;
        self
    }

    pub fn pre_verification_gas(mut self, pre_verification_gas: U256) -> Self {
        self.pre_verification_gas = pre_verification_gas;
        self
    }

    pub fn max_fee_per_gas(mut self, max_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = max_fee_per_gas;
        self
    }

    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: U256) -> Self {
        self.max_priority_fee_per_gas = max_priority_fee_per_gas;
        self
    }

    pub fn paymaster_and_data(mut self, paymaster_and_data: Bytes) -> Self {
        self.paymaster_and_data = paymaster_and_data;
        self
    }

    pub fn build(self) -> Result<UserOperation, HashingError> {
        Ok(UserOperation {
            sender: self.sender.ok_or(HashingError::MissingField("sender"))?,
            nonce: self.nonce.ok_or(HashingError::MissingField("nonce"))?,
            init_code: self.init_code,
            call_data: self.call_data,
            call_gas_limit: self.call_gas_limit,
            verification_gas_limit: self.verification_gas_limit,
            pre_verification_gas: self.pre_verification_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            paymaster_and_data: self.paymaster_and_data,
        })
    }
}

/// A UserOperation whose signature has been filled in. Read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUserOperation {
    #[serde(flatten)]
    op: UserOperation,
    signature: Bytes,
}

impl SignedUserOperation {
    pub fn operation(&self) -> &UserOperation {
        &self.op
    }

    pub fn signature(&self) -> &Bytes {
        &self.signature
    }

    pub fn hash(&self, domain: &Domain) -> H256 {
        self.op.hash(domain)
    }

    /// Value tree matching [`user_operation_type`], suitable for passing the
    /// operation to EntryPoint functions.
    pub fn as_abi_value(&self) -> AbiValue {
        let op = &self.op;
        AbiValue::Tuple(vec![
            AbiValue::Address(op.sender),
            AbiValue::Uint(op.nonce),
            AbiValue::Bytes(op.init_code.clone()),
            AbiValue::Bytes(op.call_data.clone()),
            AbiValue::Uint(op.call_gas_limit),
            AbiValue::Uint(op.verification_gas_limit),
            AbiValue::Uint(op.pre_verification_gas),
            AbiValue::Uint(op.max_fee_per_gas),
            AbiValue::Uint(op.max_priority_fee_per_gas),
            AbiValue::Bytes(op.paymaster_and_data.clone()),
            AbiValue::Bytes(self.signature.clone()),
        ])
    }
}

/// Field layout of the v0.6 `UserOperation` struct.
pub fn user_operation_fields() -> Vec<AbiType> {
    vec![
        AbiType::Address, // sender
        AbiType::Uint256, // nonce
        AbiType::Bytes,   // initCode
        AbiType::Bytes,   // callData
        AbiType::Uint256, // callGasLimit
        AbiType::Uint256, // verificationGasLimit
        AbiType::Uint256, // preVerificationGas
        AbiType::Uint256, // maxFeePerGas
        AbiType::Uint256, // maxPriorityFeePerGas
        AbiType::Bytes,   // paymasterAndData
        AbiType::Bytes,   // signature
    ]
}

pub fn user_operation_type() -> AbiType {
    AbiType::Tuple(user_operation_fields())
}
