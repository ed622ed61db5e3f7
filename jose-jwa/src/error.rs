/// Failure of a single algorithm handler: signing, verification, key wrap or
/// unwrap, or content encryption/decryption.
///
/// This is deliberately flatter than the RFC's own error taxonomy -- the
/// facade crate maps every variant here onto one of its stable error kinds,
/// and a handler never needs to know which kind it will become.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum HandlerError {
    /// The `alg`/`enc` identifier has no handler compiled in (feature-gated
    /// out) or recognized at all.
    #[error("algorithm {0} is not supported")]
    Unsupported(alloc::string::String),

    /// The candidate key's type, curve, or length doesn't match what this
    /// algorithm requires.
    #[error("key is not suitable for this algorithm: {0}")]
    KeyMismatch(alloc::string::String),

    /// MAC, signature, or authenticated-encryption tag verification failed.
    #[error("verification failed")]
    VerificationFailed,

    /// Decryption (AEAD open, key unwrap) failed.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Well-formed input, but a parameter takes a value this handler
    /// rejects (e.g. a PBES2 iteration count of zero).
    #[error("invalid parameter: {0}")]
    InvalidParameter(alloc::string::String),

    /// An underlying crypto library reported a failure unrelated to
    /// attacker-controlled input (RNG exhaustion, internal invariant).
    #[error("cryptographic library error: {0}")]
    Library(alloc::string::String),
}
