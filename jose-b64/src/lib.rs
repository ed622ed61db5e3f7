// SPDX-FileCopyrightText: 2022 Profian Inc. <opensource@profian.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/media/6ee8e381/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/media/6ee8e381/logo.svg"
)]
#![forbid(unsafe_code)]
#![warn(
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

extern crate alloc;

mod bytes;
#[cfg(feature = "json")]
mod json;
#[cfg(feature = "secret")]
mod secret;

use alloc::{string::String, vec::Vec};
use base64ct::{Base64UrlUnpadded, Encoding};

pub use base64ct;
pub use bytes::B64Bytes;
#[cfg(feature = "json")]
pub use json::Json;
#[cfg(feature = "secret")]
pub use secret::B64Secret;

/// Errors that can occur decoding base64url data or the JSON nested inside it.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The input was not valid unpadded base64url.
    #[error("invalid base64url encoding")]
    InvalidEncoding,

    /// The decoded bytes were not valid JSON (only relevant with `json`).
    #[cfg(feature = "json")]
    #[error("invalid JSON: {0}")]
    Json(String),
}

/// Encode bytes as unpadded base64url, per RFC 4648 §5 as referenced by
/// RFC 7515/7516.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    Base64UrlUnpadded::encode_string(bytes.as_ref())
}

/// Decode unpadded base64url text into bytes.
pub fn decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>, Error> {
    let input = core::str::from_utf8(input.as_ref()).map_err(|_| Error::InvalidEncoding)?;
    Base64UrlUnpadded::decode_vec(input).map_err(|_| Error::InvalidEncoding)
}

/// Constant-time byte comparison, used for MAC/tag/signature verification and
/// any other point where a timing side-channel would turn a comparison into
/// an oracle.
#[cfg(feature = "secret")]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// A source of cryptographically secure random bytes.
///
/// The core token engines are otherwise pure: this is the one place they
/// reach out to an external entropy source, matching spec's treatment of
/// "random-byte source" as an external collaborator.
#[cfg(feature = "rand")]
pub fn random_bytes(len: usize) -> Vec<u8> {
    use rand::RngCore;
    let mut buf = alloc::vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let cases: &[&[u8]] = &[b"", b"f", b"fo", b"foo", b"foob", b"fooba", b"foobar"];
        for case in cases {
            let encoded = encode(case);
            assert!(!encoded.contains('='), "padding must be omitted");
            assert_eq!(decode(&encoded).unwrap(), *case);
        }
    }

    #[test]
    fn rejects_padded() {
        assert_eq!(decode("Zm9v="), Err(Error::InvalidEncoding));
    }
}
