/// Errors producing or consuming a JWT, or validating its temporal claims.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The claim set did not serialize, or the payload did not parse as one.
    #[error("malformed claim set: {0}")]
    Malformed(alloc::string::String),

    /// Producing or consuming the enclosing JWS failed.
    #[error(transparent)]
    Jws(#[from] jose_jws::Error),

    /// Producing or consuming the enclosing JWE failed.
    #[error(transparent)]
    Jwe(#[from] jose_jwe::Error),

    /// `nbf` is in the future: the token is not yet valid.
    ///
    /// Corresponds to `TOO_EARLY_ERROR`. The core token engine never raises
    /// this itself — `nbf`/`exp` are reported verbatim on every successful
    /// verification — it is only raised by [`crate::Claims::validate_temporal`],
    /// which a caller invokes explicitly.
    #[error("token is not valid until {0}")]
    TooEarly(i64),

    /// `exp` is in the past: the token has expired.
    ///
    /// Corresponds to `TOO_LATE_ERROR`, raised under the same conditions as
    /// [`Error::TooEarly`].
    #[error("token expired at {0}")]
    TooLate(i64),
}
