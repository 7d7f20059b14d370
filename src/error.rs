use thiserror::Error;

/// Failures while turning a value tree into ABI bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("value out of range for {ty}: {reason}")]
    ValueOutOfRange { ty: &'static str, reason: String },

    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),

    #[error("unsupported ABI type `{0}`")]
    UnsupportedType(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashingError {
    #[error("missing required UserOperation field `{0}`")]
    MissingField(&'static str),
}

/// Whatever the external signer reported, passed through as-is.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct SigningError(#[from] Box<dyn std::error::Error + Send + Sync + 'static>);

impl SigningError {
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(err))
    }
}

/// Any failure of the build -> hash -> sign -> encode pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Hashing(#[from] HashingError),

    #[error(transparent)]
    Signing(#[from] SigningError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("device unplugged")]
    struct DeviceError;

    #[test]
    fn signing_error_keeps_signer_message() {
        let err = SigningError::new(DeviceError);
        assert_eq!(err.to_string(), "device unplugged");

        let err: Error = err.into();
        assert_eq!(err.to_string(), "device unplugged");
    }

    #[test]
    fn missing_field_names_the_field() {
        let err = HashingError::MissingField("sender");
        assert_eq!(
            err.to_string(),
            "missing required UserOperation field `sender`"
        );
    }
}
