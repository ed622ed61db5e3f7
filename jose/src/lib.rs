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
#![warn(rust_2018_idioms, unused_lifetimes, unused_qualifications)]

extern crate alloc;

mod error;

pub use error::{Error, ErrorKind};

pub use jose_b64 as b64;
pub use jose_jwa as jwa;
pub use jose_jwe as jwe;
pub use jose_jwk as jwk;
pub use jose_jws as jws;
pub use jose_jwt as jwt;

pub use jose_jwk::{Jwk, JwkSet};
pub use jose_jwt::{Audience, Claims};

#[cfg(test)]
mod tests {
    extern crate std;

    use jose_b64::B64Secret;
    use jose_jwk::{EncryptionAlg, Key, KeyMgmtAlg, Oct, SigningAlg};

    use super::*;

    #[test]
    fn kind_carries_the_spec_numeric_code() {
        assert_eq!(ErrorKind::TokenParse.code(), Some(0));
        assert_eq!(ErrorKind::Unsupported.code(), Some(1));
        assert_eq!(ErrorKind::SignatureVerification.code(), Some(16));
        assert_eq!(ErrorKind::Decryption.code(), Some(17));
        assert_eq!(ErrorKind::TooEarly.code(), Some(256));
        assert_eq!(ErrorKind::TooLate.code(), Some(257));
        assert_eq!(ErrorKind::KeyNotFound.code(), None);
    }

    #[test]
    fn jws_key_not_found_maps_through() {
        let key = Jwk::new(Key::Oct(Oct {
            k: B64Secret::new(alloc::vec![0xaa; 32]),
        }));
        let mut mismatched = key.clone();
        mismatched.params.kid = Some("other".into());
        let mut set = JwkSet::new();
        set.add(mismatched).unwrap();

        let header = jose_jws::Header::new(SigningAlg::Hs256).with_kid("missing");
        let token = jose_jws::produce(&header, b"hi", &key).unwrap();

        let err: Error = jose_jws::consume(&token, &set).unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::KeyNotFound);
    }

    #[test]
    fn jwt_temporal_errors_map_through() {
        let claims = Claims {
            exp: Some(1_000),
            ..Claims::new()
        };
        let err: Error = claims.validate_temporal(2_000, 0).unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::TooLate);
    }

    #[test]
    fn jwe_decryption_failure_maps_through() {
        let key = Jwk::new(Key::Oct(Oct {
            k: B64Secret::new(alloc::vec![0x11; 32]),
        }));
        let token = jose_jwe::produce(
            KeyMgmtAlg::Dir,
            EncryptionAlg::Aes128CbcHs256,
            b"secret",
            &key,
        )
        .unwrap();
        let mut tampered: alloc::vec::Vec<&str> = token.split('.').collect();
        let bogus = jose_b64::encode(b"not the right ciphertext at all");
        tampered[3] = &bogus;
        let tampered = tampered.join(".");

        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let err: Error = jose_jwe::consume(&tampered, &set).unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Decryption);
    }
}
