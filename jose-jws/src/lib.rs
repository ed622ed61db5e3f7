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
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

extern crate alloc;

mod error;
mod header;
pub mod json;

use alloc::{format, string::String, vec::Vec};
use jose_jwk::{Jwk, JwkSet};

pub use error::Error;
pub use header::Header;

/// Produce a JWS Compact Serialization (RFC7515 §7.1) of `payload` under
/// `header`, signed with `key`.
///
/// A non-empty `crit` is always rejected: this implementation recognizes no
/// extension that could legitimately appear there.
pub fn produce(header: &Header, payload: &[u8], key: &Jwk) -> Result<String, Error> {
    if !header.crit.is_empty() {
        return Err(Error::UnsupportedCritical(header.crit.join(", ")));
    }
    let protected = jose_b64::encode(
        serde_json::to_vec(header).map_err(|e| Error::Malformed(format!("{e}")))?,
    );
    let payload_b64 = jose_b64::encode(payload);
    let signing_input = format!("{protected}.{payload_b64}");
    let signature = jose_jwa::sign(header.alg, &key.key, signing_input.as_bytes())?;
    Ok(format!("{signing_input}.{}", jose_b64::encode(signature)))
}

/// Parse and verify a JWS Compact Serialization, selecting a candidate key
/// from `keys`.
///
/// If the header carries a `kid`, only the matching key is tried (a
/// mismatch is [`Error::KeyNotFound`], never silently falls back to another
/// key). Otherwise every key whose `kty`/`crv`/`alg` could satisfy the
/// header's `alg` is tried in turn, and the first one that verifies wins.
pub fn consume(compact: &str, keys: &JwkSet) -> Result<(Header, Vec<u8>), Error> {
    let mut parts = compact.split('.');
    let (Some(protected_b64), Some(payload_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::Malformed(
            "expected exactly three dot-separated segments".into(),
        ));
    };

    let protected_raw = jose_b64::decode(protected_b64)
        .map_err(|_| Error::Malformed("invalid protected header encoding".into()))?;
    let header: Header =
        serde_json::from_slice(&protected_raw).map_err(|e| Error::Malformed(format!("{e}")))?;
    if header.alg == jose_jwk::SigningAlg::None {
        return Err(Error::Malformed("alg: none is never accepted".into()));
    }
    if !header.crit.is_empty() {
        return Err(Error::UnsupportedCritical(header.crit.join(", ")));
    }

    let signature = jose_b64::decode(sig_b64)
        .map_err(|_| Error::Malformed("invalid signature encoding".into()))?;
    let signing_input = format!("{protected_b64}.{payload_b64}");

    let criteria = jose_jwa::registry::signing_key_criteria(header.alg);
    let candidates: Vec<&Jwk> = match &header.kid {
        Some(kid) => keys.select(&criteria, Some(kid)).into_iter().collect(),
        None => keys.select_all(&criteria).collect(),
    };
    if candidates.is_empty() {
        return Err(Error::KeyNotFound);
    }

    let verified = candidates.iter().any(|key| {
        jose_jwa::verify(header.alg, &key.key, signing_input.as_bytes(), &signature).is_ok()
    });
    if !verified {
        return Err(Error::VerificationFailed);
    }

    let payload = jose_b64::decode(payload_b64)
        .map_err(|_| Error::Malformed("invalid payload encoding".into()))?;
    Ok((header, payload))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use jose_b64::B64Secret;
    use jose_jwk::{Key, Oct};

    use super::*;

    fn hs256_jwk() -> Jwk {
        Jwk::new(Key::Oct(Oct {
            k: B64Secret::new(
                hex_literal::hex!("0323354b2b0fa5bc837e0665777ba68f5ab328e6f054c928a90f84b2d2502ce")
                    .to_vec(),
            ),
        }))
    }

    #[test]
    fn produce_then_consume_roundtrips() {
        let key = hs256_jwk();
        let header = Header::new(jose_jwk::SigningAlg::Hs256);
        let token = produce(&header, b"hello world", &key).unwrap();

        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let (parsed_header, payload) = consume(&token, &set).unwrap();
        assert_eq!(parsed_header.alg, jose_jwk::SigningAlg::Hs256);
        assert_eq!(payload, b"hello world");
    }

    #[test]
    fn consume_rejects_tampered_payload() {
        let key = hs256_jwk();
        let header = Header::new(jose_jwk::SigningAlg::Hs256);
        let token = produce(&header, b"hello world", &key).unwrap();
        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let tampered_payload = jose_b64::encode(b"goodbye world");
        parts[1] = &tampered_payload;
        let tampered = parts.join(".");

        assert!(matches!(
            consume(&tampered, &set),
            Err(Error::VerificationFailed)
        ));
    }

    #[test]
    fn consume_rejects_unknown_critical_header() {
        let mut header = Header::new(jose_jwk::SigningAlg::Hs256);
        header.crit.push("exp".into());
        let key = hs256_jwk();
        // `produce` also refuses `crit`, so this token is built by hand.
        let protected = jose_b64::encode(serde_json::to_vec(&header).unwrap());
        let payload = jose_b64::encode(b"hi");
        let signing_input = format!("{protected}.{payload}");
        let sig = jose_jwa::sign(header.alg, &key.key, signing_input.as_bytes()).unwrap();
        let token = format!("{signing_input}.{}", jose_b64::encode(sig));

        let mut set = JwkSet::new();
        set.add(key).unwrap();
        assert!(matches!(
            consume(&token, &set),
            Err(Error::UnsupportedCritical(_))
        ));
    }

    #[test]
    fn consume_rejects_kid_mismatch_without_fallback() {
        let mut key = hs256_jwk();
        key.params.kid = Some("key-1".into());
        let other = hs256_jwk();

        let header = Header::new(jose_jwk::SigningAlg::Hs256).with_kid("key-2");
        let protected = jose_b64::encode(serde_json::to_vec(&header).unwrap());
        let payload = jose_b64::encode(b"hi");
        let signing_input = format!("{protected}.{payload}");
        let sig = jose_jwa::sign(header.alg, &other.key, signing_input.as_bytes()).unwrap();
        let token = format!("{signing_input}.{}", jose_b64::encode(sig));

        let mut set = JwkSet::new();
        set.add(key).unwrap();
        assert!(matches!(consume(&token, &set), Err(Error::KeyNotFound)));
    }
}
