use ethers::signers::LocalWallet;
use ethers::types::{Bytes, H256};
use ethers::utils::hash_message;

use crate::error::SigningError;

/// Produces the `signature` field for a userOpHash.
///
/// Key handling lives entirely behind this trait.
pub trait UserOpSigner {
    fn sign_user_op_hash(&self, user_op_hash: H256) -> Result<Bytes, SigningError>;
}

/// SimpleAccount-style owner signature: ECDSA over the EIP-191 personal
/// message hash of the userOpHash, encoded as 65 bytes `r || s || v`.
impl UserOpSigner for LocalWallet {
    fn sign_user_op_hash(&self, user_op_hash: H256) -> Result<Bytes, SigningError> {
        let sig = self
            .sign_hash(hash_message(user_op_hash))
            .map_err(SigningError::new)?;
        Ok(Bytes::from(sig.to_vec()))
    }
}
