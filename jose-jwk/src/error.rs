/// Errors raised by the key model: malformed PEM/DER, or a key-set
/// invariant violation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum KeyError {
    /// A key with this `kid` is already present in the set.
    #[error("duplicate key id: {0}")]
    DuplicateKid(alloc::string::String),

    /// The PEM or DER input did not parse as a supported key structure.
    #[cfg(feature = "pem")]
    #[error("invalid PEM/DER key encoding: {0}")]
    Encoding(alloc::string::String),

    /// The key type or curve is not one this crate can convert to/from PEM.
    #[cfg(feature = "pem")]
    #[error("unsupported key for PEM conversion")]
    UnsupportedForPem,
}
