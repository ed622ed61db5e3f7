/// Errors producing or consuming a JWE.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The compact or JSON serialization did not parse.
    #[error("malformed JWE: {0}")]
    Malformed(alloc::string::String),

    /// A `crit` header parameter named an extension this implementation
    /// does not understand (RFC7516 §4.1.13).
    #[error("unsupported critical header parameter: {0}")]
    UnsupportedCritical(alloc::string::String),

    /// A header parameter required by `alg` was missing or malformed (e.g.
    /// `epk` for ECDH-ES, `iv`/`tag` for an AES-GCM key wrap).
    #[error("missing or invalid header parameter: {0}")]
    InvalidParameter(alloc::string::String),

    /// No algorithm handler is compiled in, or the algorithm identifier is
    /// not recognized at all, or a cryptographic primitive failed.
    #[error(transparent)]
    Handler(#[from] jose_jwa::HandlerError),

    /// No key in the supplied set satisfied the header's `alg` (and, if
    /// present, `kid`).
    #[error("no suitable key found")]
    KeyNotFound,

    /// Key unwrapping or content decryption failed integrity checking.
    #[error("decryption failed")]
    DecryptionFailed,
}
