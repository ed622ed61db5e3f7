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

mod claims;
mod error;

use alloc::{format, string::String};
use jose_jwk::{EncryptionAlg, Jwk, JwkSet, KeyMgmtAlg, SigningAlg};

pub use claims::{Audience, Claims};
pub use error::Error;

fn claims_to_bytes(claims: &Claims) -> Result<alloc::vec::Vec<u8>, Error> {
    serde_json::to_vec(claims).map_err(|e| Error::Malformed(format!("{e}")))
}

fn claims_from_bytes(bytes: &[u8]) -> Result<Claims, Error> {
    serde_json::from_slice(bytes).map_err(|e| Error::Malformed(format!("{e}")))
}

/// Sign `claims` into a JWT carried as a JWS Compact Serialization
/// (RFC7519 §6.1 trivially satisfied: `typ` is left to the caller, the
/// payload is always the claim set's canonical JSON).
pub fn produce_jws(alg: SigningAlg, claims: &Claims, key: &Jwk) -> Result<String, Error> {
    let header = jose_jws::Header::new(alg);
    let payload = claims_to_bytes(claims)?;
    Ok(jose_jws::produce(&header, &payload, key)?)
}

/// Verify a JWS Compact Serialization and parse its payload as a claim set.
/// `nbf`/`exp` are returned unenforced: call
/// [`Claims::validate_temporal`] to check them.
pub fn consume_jws(compact: &str, keys: &JwkSet) -> Result<(jose_jws::Header, Claims), Error> {
    let (header, payload) = jose_jws::consume(compact, keys)?;
    Ok((header, claims_from_bytes(&payload)?))
}

/// Encrypt `claims` into a JWT carried as a JWE Compact Serialization.
pub fn produce_jwe(
    alg: KeyMgmtAlg,
    enc: EncryptionAlg,
    claims: &Claims,
    key: &Jwk,
) -> Result<String, Error> {
    let payload = claims_to_bytes(claims)?;
    Ok(jose_jwe::produce(alg, enc, &payload, key)?)
}

/// Decrypt a JWE Compact Serialization and parse its plaintext as a claim
/// set.
pub fn consume_jwe(compact: &str, keys: &JwkSet) -> Result<(jose_jwe::Header, Claims), Error> {
    let (header, plaintext) = jose_jwe::consume(compact, keys)?;
    Ok((header, claims_from_bytes(&plaintext)?))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use jose_b64::B64Secret;
    use jose_jwk::{Key, Oct};

    use super::*;

    fn hs256_key() -> Jwk {
        Jwk::new(Key::Oct(Oct {
            k: B64Secret::new(alloc::vec![0x2a; 32]),
        }))
    }

    fn dir_key() -> Jwk {
        Jwk::new(Key::Oct(Oct {
            k: B64Secret::new(alloc::vec![0x2a; 32]),
        }))
    }

    #[test]
    fn jws_roundtrips_claims() {
        let key = hs256_key();
        let claims = Claims {
            iss: Some("joe".into()),
            exp: Some(1_300_819_380),
            aud: Some(Audience::One("api".into())),
            ..Claims::new()
        };
        let token = produce_jws(SigningAlg::Hs256, &claims, &key).unwrap();

        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let (_, round_tripped) = consume_jws(&token, &set).unwrap();
        assert_eq!(round_tripped, claims);
        assert!(round_tripped.audience_contains("api"));
    }

    #[test]
    fn jwe_roundtrips_claims() {
        let key = dir_key();
        let claims = Claims {
            sub: Some("alice".into()),
            jti: Some("xyz".into()),
            ..Claims::new()
        };
        let token = produce_jwe(
            KeyMgmtAlg::Dir,
            EncryptionAlg::Aes128CbcHs256,
            &claims,
            &key,
        )
        .unwrap();

        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let (_, round_tripped) = consume_jwe(&token, &set).unwrap();
        assert_eq!(round_tripped, claims);
    }

    #[test]
    fn expired_token_still_verifies_but_fails_temporal_check() {
        let key = hs256_key();
        let claims = Claims {
            exp: Some(1_000),
            ..Claims::new()
        };
        let token = produce_jws(SigningAlg::Hs256, &claims, &key).unwrap();

        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let (_, round_tripped) = consume_jws(&token, &set).unwrap();
        assert!(matches!(
            round_tripped.validate_temporal(2_000, 0),
            Err(Error::TooLate(1_000))
        ));
    }
}
