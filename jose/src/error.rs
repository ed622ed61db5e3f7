//! The unified error taxonomy every sub-crate's own error maps into.
//!
//! A handler failure for one recipient of a multi-recipient token is never
//! distinguishable, from the outside, from any other candidate's failure:
//! [`ErrorKind::SignatureVerification`] and [`ErrorKind::Decryption`] are
//! raised only once every candidate has been exhausted, and never say which
//! one or why (RFC7515/RFC7516 give no oracle for "right key, wrong
//! signature" vs. "wrong key entirely").

use core::fmt;

/// A stable, wire-observable classification of why a JOSE operation failed.
///
/// The numeric codes are stable; keep them even if new kinds are added
/// (`#[non_exhaustive]` permits that without breaking callers who match on
/// a specific code).
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed token: unknown serialization, missing `alg`, invalid
    /// base64url/JSON.
    TokenParse,
    /// Algorithm identifier not recognized, or `crit` names an extension
    /// this implementation doesn't understand.
    Unsupported,
    /// No recipient's signature verified.
    SignatureVerification,
    /// No recipient's key unwrap + content decryption succeeded.
    Decryption,
    /// No key in the supplied set satisfied the header's selection
    /// criteria.
    KeyNotFound,
    /// A structural error inside a handler unrelated to verification (a
    /// malformed `epk`, an RSA key too small for its padding scheme, ...).
    InvalidData,
    /// An integrity check distinct from final signature/decryption
    /// success — AES-KW's recovered IV, OAEP's recovered `lHash` — failed.
    ValidationFailed,
    /// The underlying cryptographic primitive itself reported failure
    /// (RNG exhaustion, an internal invariant), not attacker-controlled
    /// input.
    SystemLibrary,
    /// `nbf` is in the future. Never raised by the token engines
    /// themselves; only by [`jose_jwt::Claims::validate_temporal`].
    TooEarly,
    /// `exp` is in the past. Same caveat as [`ErrorKind::TooEarly`].
    TooLate,
}

impl ErrorKind {
    /// The stable numeric code for this kind, where spec §7 assigns one.
    pub fn code(self) -> Option<u16> {
        match self {
            ErrorKind::TokenParse => Some(0),
            ErrorKind::Unsupported => Some(1),
            ErrorKind::SignatureVerification => Some(16),
            ErrorKind::Decryption => Some(17),
            ErrorKind::TooEarly => Some(256),
            ErrorKind::TooLate => Some(257),
            ErrorKind::KeyNotFound
            | ErrorKind::InvalidData
            | ErrorKind::ValidationFailed
            | ErrorKind::SystemLibrary => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TokenParse => "TOKEN_PARSE_ERROR",
            ErrorKind::Unsupported => "UNSUPPORTED_ERROR",
            ErrorKind::SignatureVerification => "SIGNATURE_VERIFICATION_ERROR",
            ErrorKind::Decryption => "DECRYPTION_ERROR",
            ErrorKind::KeyNotFound => "KEY_NOT_FOUND_ERROR",
            ErrorKind::InvalidData => "INVALID_DATA_ERROR",
            ErrorKind::ValidationFailed => "VALIDATION_FAILED_ERROR",
            ErrorKind::SystemLibrary => "SYSTEM_LIBRARY_ERROR",
            ErrorKind::TooEarly => "TOO_EARLY_ERROR",
            ErrorKind::TooLate => "TOO_LATE_ERROR",
        };
        f.write_str(name)
    }
}

/// A JOSE operation failure: an [`ErrorKind`] plus, where one exists, the
/// narrower error from whichever sub-crate raised it.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    kind: ErrorKind,
    #[source]
    source: Option<BoxError>,
}

type BoxError = alloc::boxed::Box<dyn core::error::Error + Send + Sync + 'static>;

impl Error {
    fn new(kind: ErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: Some(source.into()),
        }
    }

    /// The stable classification of this failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

fn map_handler_error(err: jose_jwa::HandlerError, on_verification_failed: ErrorKind) -> Error {
    let kind = match &err {
        jose_jwa::HandlerError::Unsupported(_) => ErrorKind::Unsupported,
        jose_jwa::HandlerError::KeyMismatch(_) => ErrorKind::InvalidData,
        jose_jwa::HandlerError::VerificationFailed => on_verification_failed,
        jose_jwa::HandlerError::DecryptionFailed => ErrorKind::Decryption,
        jose_jwa::HandlerError::InvalidParameter(_) => ErrorKind::InvalidData,
        jose_jwa::HandlerError::Library(_) => ErrorKind::SystemLibrary,
        _ => ErrorKind::SystemLibrary,
    };
    Error::new(kind, err)
}

impl From<jose_jws::Error> for Error {
    fn from(err: jose_jws::Error) -> Self {
        match err {
            jose_jws::Error::Malformed(_) => Error::new(ErrorKind::TokenParse, err),
            jose_jws::Error::UnsupportedCritical(_) => Error::new(ErrorKind::Unsupported, err),
            jose_jws::Error::KeyNotFound => Error::new(ErrorKind::KeyNotFound, err),
            jose_jws::Error::VerificationFailed => {
                Error::new(ErrorKind::SignatureVerification, err)
            }
            jose_jws::Error::Handler(handler) => {
                map_handler_error(handler, ErrorKind::SignatureVerification)
            }
            _ => Error::new(ErrorKind::SystemLibrary, err),
        }
    }
}

impl From<jose_jwe::Error> for Error {
    fn from(err: jose_jwe::Error) -> Self {
        match err {
            jose_jwe::Error::Malformed(_) => Error::new(ErrorKind::TokenParse, err),
            jose_jwe::Error::UnsupportedCritical(_) => Error::new(ErrorKind::Unsupported, err),
            jose_jwe::Error::InvalidParameter(_) => Error::new(ErrorKind::InvalidData, err),
            jose_jwe::Error::KeyNotFound => Error::new(ErrorKind::KeyNotFound, err),
            jose_jwe::Error::DecryptionFailed => Error::new(ErrorKind::Decryption, err),
            jose_jwe::Error::Handler(handler) => {
                map_handler_error(handler, ErrorKind::Decryption)
            }
            _ => Error::new(ErrorKind::SystemLibrary, err),
        }
    }
}

impl From<jose_jwt::Error> for Error {
    fn from(err: jose_jwt::Error) -> Self {
        match err {
            jose_jwt::Error::Malformed(_) => Error::new(ErrorKind::TokenParse, err),
            jose_jwt::Error::TooEarly(_) => Error::new(ErrorKind::TooEarly, err),
            jose_jwt::Error::TooLate(_) => Error::new(ErrorKind::TooLate, err),
            jose_jwt::Error::Jws(jws) => jws.into(),
            jose_jwt::Error::Jwe(jwe) => jwe.into(),
            _ => Error::new(ErrorKind::SystemLibrary, err),
        }
    }
}

impl From<jose_jwk::KeyError> for Error {
    fn from(err: jose_jwk::KeyError) -> Self {
        let kind = match &err {
            jose_jwk::KeyError::DuplicateKid(_) => ErrorKind::InvalidData,
            jose_jwk::KeyError::Encoding(_) => ErrorKind::InvalidData,
            jose_jwk::KeyError::UnsupportedForPem => ErrorKind::Unsupported,
            _ => ErrorKind::InvalidData,
        };
        Error::new(kind, err)
    }
}
