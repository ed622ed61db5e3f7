/// Errors producing or consuming a JWS.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The compact or JSON serialization did not parse.
    #[error("malformed JWS: {0}")]
    Malformed(alloc::string::String),

    /// A `crit` header parameter named an extension this implementation
    /// does not understand (RFC7515 §4.1.11).
    #[error("unsupported critical header parameter: {0}")]
    UnsupportedCritical(alloc::string::String),

    /// No algorithm handler is compiled in, or the algorithm identifier is
    /// not recognized at all.
    #[error(transparent)]
    Handler(#[from] jose_jwa::HandlerError),

    /// No key in the supplied set satisfied the header's `alg` (and, if
    /// present, `kid`).
    #[error("no suitable key found")]
    KeyNotFound,

    /// Every candidate key was tried and every one failed verification.
    #[error("signature verification failed")]
    VerificationFailed,
}
