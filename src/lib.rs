//! ERC-4337 UserOperation (EntryPoint v0.6) ABI encoding and userOpHash
//! derivation.
//!
//! An operation is built with [`UserOperation::builder`], hashed against a
//! [`Domain`] (EntryPoint address + chain id), signed through a
//! [`UserOpSigner`], and finally encoded into `handleOps` call data.

pub mod abi;
pub mod account;
pub mod config;
pub mod encoding;
pub mod entrypoint;
pub mod error;
pub mod hash;
pub mod signer;
pub mod types;

pub use error::{EncodingError, Error, HashingError, SigningError};
pub use hash::{user_op_hash, Domain};
pub use signer::UserOpSigner;
pub use types::{SignedUserOperation, UserOperation, UserOperationBuilder};
