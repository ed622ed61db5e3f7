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

mod asn1;
pub mod concat_kdf;
pub mod enc;
mod error;
pub mod keymgmt;
pub mod registry;
mod sign;

pub use error::HandlerError;
pub use jose_jwk::{Algorithm, EncryptionAlg, KeyMgmtAlg, SigningAlg};
pub use sign::{sign, verify};

#[cfg(test)]
mod tests {
    extern crate std;

    use jose_b64::B64Secret;
    use jose_jwk::{Key, Oct};

    use super::*;

    fn hs256_key() -> Key {
        Key::Oct(Oct {
            k: B64Secret::new(hex_literal::hex!(
                "0323354b2b0fa5bc837e0665777ba68f5ab328e6f054c928a90f84b2d2502ce"
            )
            .to_vec()),
        })
    }

    #[test]
    fn hmac_sign_then_verify_roundtrips() {
        let key = hs256_key();
        let input = b"signing input";
        let mac = sign(SigningAlg::Hs256, &key, input).unwrap();
        verify(SigningAlg::Hs256, &key, input, &mac).unwrap();
    }

    #[test]
    fn hmac_verify_rejects_tampered_input() {
        let key = hs256_key();
        let mac = sign(SigningAlg::Hs256, &key, b"signing input").unwrap();
        let err = verify(SigningAlg::Hs256, &key, b"different input", &mac).unwrap_err();
        assert!(matches!(err, HandlerError::VerificationFailed));
    }

    #[test]
    fn none_algorithm_never_verifies() {
        let key = hs256_key();
        let err = verify(SigningAlg::None, &key, b"anything", b"").unwrap_err();
        assert!(matches!(err, HandlerError::VerificationFailed));
    }

    #[test]
    fn aes_kw_wrap_unwrap_roundtrips() {
        let kek = Key::Oct(Oct {
            k: B64Secret::new(hex_literal::hex!("000102030405060708090A0B0C0D0E0F").to_vec()),
        });
        let cek = hex_literal::hex!("00112233445566778899AABBCCDDEEFF001020304050607").to_vec();
        let wrapped = keymgmt::aes_kw::wrap(&kek, &cek).unwrap();
        // RFC3394 §4.3 test vector: 192-bit KEK wrapping a 192-bit key
        assert_eq!(
            wrapped,
            hex_literal::hex!("031D33264E15D33268F24EC260743EDCE1C6C7DDEE725A936BA814915C6762D2")
        );
        let unwrapped = keymgmt::aes_kw::unwrap(&kek, &wrapped).unwrap();
        assert_eq!(unwrapped, cek);
    }

    #[test]
    fn aes_kw_unwrap_rejects_corrupted_input() {
        let kek = Key::Oct(Oct {
            k: B64Secret::new(hex_literal::hex!("000102030405060708090A0B0C0D0E0F").to_vec()),
        });
        let cek = hex_literal::hex!("00112233445566778899AABBCCDDEEFF0").to_vec();
        let mut wrapped = keymgmt::aes_kw::wrap(&kek, &cek[..16].to_vec()).unwrap();
        wrapped[0] ^= 0xFF;
        assert!(keymgmt::aes_kw::unwrap(&kek, &wrapped).is_err());
    }

    #[test]
    fn aes_cbc_hmac_roundtrips() {
        let cek = hex_literal::hex!(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f"
        )
        .to_vec();
        let iv = hex_literal::hex!("1af38c2dc2b96ffdd86694092341bc04").to_vec();
        let aad = b"The second principle of Auguste Kerckhoffs";
        let plaintext = b"Live long and prosper.";

        let (ciphertext, tag) = enc::encrypt(EncryptionAlg::Aes128CbcHs256, &cek, &iv, aad, plaintext).unwrap();
        let decrypted = enc::decrypt(EncryptionAlg::Aes128CbcHs256, &cek, &iv, aad, &ciphertext, &tag).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn aes_gcm_roundtrips() {
        let cek = hex_literal::hex!("00000000000000000000000000000000").to_vec();
        let iv = hex_literal::hex!("000000000000000000000000").to_vec();
        let plaintext = b"a secret message";
        let (ciphertext, tag) = enc::encrypt(EncryptionAlg::Aes128Gcm, &cek, &iv, b"", plaintext).unwrap();
        let decrypted = enc::decrypt(EncryptionAlg::Aes128Gcm, &cek, &iv, b"", &ciphertext, &tag).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn aes_gcm_decrypt_rejects_tampered_tag() {
        let cek = hex_literal::hex!("00000000000000000000000000000000").to_vec();
        let iv = hex_literal::hex!("000000000000000000000000").to_vec();
        let (ciphertext, mut tag) = enc::encrypt(EncryptionAlg::Aes128Gcm, &cek, &iv, b"", b"hello").unwrap();
        tag[0] ^= 1;
        assert!(enc::decrypt(EncryptionAlg::Aes128Gcm, &cek, &iv, b"", &ciphertext, &tag).is_err());
    }
}
