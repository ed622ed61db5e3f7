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

mod engine;
mod error;
mod header;
pub mod json;

use alloc::{format, string::String, vec::Vec};
use jose_jwk::{EncryptionAlg, Jwk, JwkSet, KeyMgmtAlg};

pub use error::Error;
pub use header::Header;

/// Produce a JWE Compact Serialization (RFC7516 §7.1): a single recipient,
/// with the entire header integrity-protected.
pub fn produce(alg: KeyMgmtAlg, enc: EncryptionAlg, plaintext: &[u8], key: &Jwk) -> Result<String, Error> {
    let outcome = engine::produce(alg, enc, key, None, None)?;
    let mut header = outcome.header;
    header.alg = Some(alg);
    header.enc = Some(enc);
    if !header.crit.is_empty() {
        return Err(Error::UnsupportedCritical(header.crit.join(", ")));
    }

    let protected = jose_b64::encode(
        serde_json::to_vec(&header).map_err(|e| Error::Malformed(format!("{e}")))?,
    );
    let iv = jose_b64::random_bytes(jose_jwa::enc::iv_len(enc));
    let (ciphertext, tag) =
        jose_jwa::enc::encrypt(enc, &outcome.cek, &iv, protected.as_bytes(), plaintext)?;

    Ok(format!(
        "{protected}.{}.{}.{}.{}",
        jose_b64::encode(&outcome.encrypted_key),
        jose_b64::encode(&iv),
        jose_b64::encode(&ciphertext),
        jose_b64::encode(&tag),
    ))
}

/// Parse and decrypt a JWE Compact Serialization, selecting a candidate key
/// from `keys` exactly as `jose-jws`'s `consume` does: a `kid` in the header
/// is a hard filter, otherwise every matching key is tried in turn.
pub fn consume(compact: &str, keys: &JwkSet) -> Result<(Header, Vec<u8>), Error> {
    let mut parts = compact.split('.');
    let (
        Some(protected_b64),
        Some(encrypted_key_b64),
        Some(iv_b64),
        Some(ciphertext_b64),
        Some(tag_b64),
        None,
    ) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    )
    else {
        return Err(Error::Malformed(
            "expected exactly five dot-separated segments".into(),
        ));
    };

    let protected_raw = jose_b64::decode(protected_b64)
        .map_err(|_| Error::Malformed("invalid protected header encoding".into()))?;
    let header: Header =
        serde_json::from_slice(&protected_raw).map_err(|e| Error::Malformed(format!("{e}")))?;
    if !header.crit.is_empty() {
        return Err(Error::UnsupportedCritical(header.crit.join(", ")));
    }
    let alg = header.alg.ok_or_else(|| Error::Malformed("missing alg".into()))?;
    let enc = header.enc.ok_or_else(|| Error::Malformed("missing enc".into()))?;

    let encrypted_key = jose_b64::decode(encrypted_key_b64)
        .map_err(|_| Error::Malformed("invalid encrypted key encoding".into()))?;
    let iv = jose_b64::decode(iv_b64).map_err(|_| Error::Malformed("invalid iv encoding".into()))?;
    let ciphertext = jose_b64::decode(ciphertext_b64)
        .map_err(|_| Error::Malformed("invalid ciphertext encoding".into()))?;
    let tag = jose_b64::decode(tag_b64).map_err(|_| Error::Malformed("invalid tag encoding".into()))?;

    let criteria = jose_jwa::registry::key_mgmt_key_criteria(alg);
    let candidates: Vec<&Jwk> = match &header.kid {
        Some(kid) => keys.select(&criteria, Some(kid)).into_iter().collect(),
        None => keys.select_all(&criteria).collect(),
    };
    if candidates.is_empty() {
        return Err(Error::KeyNotFound);
    }

    for candidate in candidates {
        let Ok(cek) = engine::consume(alg, enc, candidate, &header, &encrypted_key) else {
            continue;
        };
        if let Ok(plaintext) =
            jose_jwa::enc::decrypt(enc, &cek, &iv, protected_b64.as_bytes(), &ciphertext, &tag)
        {
            return Ok((header, plaintext));
        }
    }
    Err(Error::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use jose_b64::B64Secret;
    use jose_jwk::{Key, Oct};

    use super::*;

    fn oct_jwk(len: usize) -> Jwk {
        Jwk::new(Key::Oct(Oct {
            k: B64Secret::new(alloc::vec![0x42; len]),
        }))
    }

    #[test]
    fn dir_roundtrips() {
        let key = oct_jwk(32);
        let token = produce(KeyMgmtAlg::Dir, EncryptionAlg::Aes128CbcHs256, b"top secret", &key).unwrap();

        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let (header, plaintext) = consume(&token, &set).unwrap();
        assert_eq!(header.enc, Some(EncryptionAlg::Aes128CbcHs256));
        assert_eq!(plaintext, b"top secret");
    }

    #[test]
    fn aes_kw_roundtrips() {
        let key = oct_jwk(16);
        let token = produce(KeyMgmtAlg::Aes128Kw, EncryptionAlg::Aes128Gcm, b"hello", &key).unwrap();

        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let (_, plaintext) = consume(&token, &set).unwrap();
        assert_eq!(plaintext, b"hello");
    }

    #[test]
    fn consume_rejects_tampered_ciphertext() {
        let key = oct_jwk(32);
        let token = produce(KeyMgmtAlg::Dir, EncryptionAlg::Aes128CbcHs256, b"top secret", &key).unwrap();
        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let tampered_ciphertext = jose_b64::encode(b"0000000000");
        parts[3] = &tampered_ciphertext;
        let tampered = parts.join(".");

        assert!(matches!(consume(&tampered, &set), Err(Error::DecryptionFailed)));
    }
}
