//! Content encryption handlers: the AES-CBC-HMAC-SHA2 composite algorithms
//! and AES-GCM (RFC7518 §5).

use alloc::{format, vec::Vec};
use jose_jwk::EncryptionAlg;

use crate::error::HandlerError;

/// `(encryption key length, MAC key length)` in bytes for a CBC-HMAC
/// composite algorithm; the CEK itself is the concatenation `MAC key || enc
/// key` per RFC7518 §5.2.2.1.
fn cbc_hmac_key_split(alg: EncryptionAlg) -> Option<(usize, usize)> {
    match alg {
        EncryptionAlg::Aes128CbcHs256 => Some((16, 16)),
        EncryptionAlg::Aes192CbcHs384 => Some((24, 24)),
        EncryptionAlg::Aes256CbcHs512 => Some((32, 32)),
        _ => None,
    }
}

/// The CEK length in bytes this `enc` algorithm requires.
pub fn cek_len(alg: EncryptionAlg) -> usize {
    match alg {
        EncryptionAlg::Aes128CbcHs256 => 32,
        EncryptionAlg::Aes192CbcHs384 => 48,
        EncryptionAlg::Aes256CbcHs512 => 64,
        EncryptionAlg::Aes128Gcm => 16,
        EncryptionAlg::Aes192Gcm => 24,
        EncryptionAlg::Aes256Gcm => 32,
    }
}

/// The IV length in bytes this `enc` algorithm requires.
pub fn iv_len(alg: EncryptionAlg) -> usize {
    match alg {
        EncryptionAlg::Aes128CbcHs256 | EncryptionAlg::Aes192CbcHs384 | EncryptionAlg::Aes256CbcHs512 => 16,
        EncryptionAlg::Aes128Gcm | EncryptionAlg::Aes192Gcm | EncryptionAlg::Aes256Gcm => 12,
    }
}

/// Encrypt `plaintext` with `cek`/`iv` under `alg`, authenticating `aad`
/// (the ASCII base64url-encoded JWE protected header). Returns `(ciphertext,
/// authentication tag)`.
pub fn encrypt(
    alg: EncryptionAlg,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), HandlerError> {
    match alg {
        EncryptionAlg::Aes128CbcHs256 => cbc_hmac::encrypt::<sha2::Sha256>(alg, cek, iv, aad, plaintext),
        EncryptionAlg::Aes192CbcHs384 => cbc_hmac::encrypt::<sha2::Sha384>(alg, cek, iv, aad, plaintext),
        EncryptionAlg::Aes256CbcHs512 => cbc_hmac::encrypt::<sha2::Sha512>(alg, cek, iv, aad, plaintext),
        EncryptionAlg::Aes128Gcm | EncryptionAlg::Aes192Gcm | EncryptionAlg::Aes256Gcm => {
            gcm::encrypt(alg, cek, iv, aad, plaintext)
        }
    }
}

/// Decrypt `ciphertext`/`tag` with `cek`/`iv` under `alg`, checking `aad`.
pub fn decrypt(
    alg: EncryptionAlg,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, HandlerError> {
    match alg {
        EncryptionAlg::Aes128CbcHs256 => cbc_hmac::decrypt::<sha2::Sha256>(alg, cek, iv, aad, ciphertext, tag),
        EncryptionAlg::Aes192CbcHs384 => cbc_hmac::decrypt::<sha2::Sha384>(alg, cek, iv, aad, ciphertext, tag),
        EncryptionAlg::Aes256CbcHs512 => cbc_hmac::decrypt::<sha2::Sha512>(alg, cek, iv, aad, ciphertext, tag),
        EncryptionAlg::Aes128Gcm | EncryptionAlg::Aes192Gcm | EncryptionAlg::Aes256Gcm => {
            gcm::decrypt(alg, cek, iv, aad, ciphertext, tag)
        }
    }
}

mod cbc_hmac {
    use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
    use hmac::{Hmac, Mac};

    use super::*;

    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
    type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
    type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
    type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
    type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
    type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

    /// `AL`, the AAD bit-length field RFC7518 §5.2.2.1 appends to the MAC
    /// input, as a 64-bit big-endian integer.
    fn al(aad: &[u8]) -> [u8; 8] {
        ((aad.len() as u64) * 8).to_be_bytes()
    }

    fn compute_tag<D>(mac_key: &[u8], aad: &[u8], iv: &[u8], ciphertext: &[u8], tag_len: usize) -> Vec<u8>
    where
        D: digest::Digest + digest::core_api::CoreProxy,
        D::Core: hmac::digest::core_api::UpdateCore
            + hmac::digest::core_api::FixedOutputCore
            + hmac::digest::HashMarker
            + Default
            + Clone,
    {
        let mut mac = Hmac::<D>::new_from_slice(mac_key).expect("HMAC accepts any key length");
        mac.update(aad);
        mac.update(iv);
        mac.update(ciphertext);
        mac.update(&al(aad));
        mac.finalize().into_bytes()[..tag_len].to_vec()
    }

    pub fn encrypt<D>(
        alg: EncryptionAlg,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), HandlerError>
    where
        D: digest::Digest + digest::core_api::CoreProxy,
        D::Core: hmac::digest::core_api::UpdateCore
            + hmac::digest::core_api::FixedOutputCore
            + hmac::digest::HashMarker
            + Default
            + Clone,
    {
        let (enc_len, mac_len) = cbc_hmac_key_split(alg).ok_or_else(|| {
            HandlerError::InvalidParameter(format!("{alg} is not a CBC-HMAC composite algorithm"))
        })?;
        if cek.len() != enc_len + mac_len {
            return Err(HandlerError::InvalidParameter("CEK length mismatch".into()));
        }
        let (mac_key, enc_key) = cek.split_at(mac_len);

        let ciphertext = match enc_len {
            16 => Aes128CbcEnc::new(enc_key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            24 => Aes192CbcEnc::new(enc_key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            32 => Aes256CbcEnc::new(enc_key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            _ => unreachable!("cbc_hmac_key_split only returns 16/24/32"),
        };
        let tag = compute_tag::<D>(mac_key, aad, iv, &ciphertext, mac_len);
        Ok((ciphertext, tag))
    }

    pub fn decrypt<D>(
        alg: EncryptionAlg,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, HandlerError>
    where
        D: digest::Digest + digest::core_api::CoreProxy,
        D::Core: hmac::digest::core_api::UpdateCore
            + hmac::digest::core_api::FixedOutputCore
            + hmac::digest::HashMarker
            + Default
            + Clone,
    {
        let (enc_len, mac_len) = cbc_hmac_key_split(alg).ok_or_else(|| {
            HandlerError::InvalidParameter(format!("{alg} is not a CBC-HMAC composite algorithm"))
        })?;
        if cek.len() != enc_len + mac_len {
            return Err(HandlerError::InvalidParameter("CEK length mismatch".into()));
        }
        let (mac_key, enc_key) = cek.split_at(mac_len);

        let expected_tag = compute_tag::<D>(mac_key, aad, iv, ciphertext, mac_len);
        if !jose_b64::ct_eq(&expected_tag, tag) {
            return Err(HandlerError::DecryptionFailed);
        }

        let mut buf = ciphertext.to_vec();
        let plaintext = match enc_len {
            16 => Aes128CbcDec::new(enc_key.into(), iv.into())
                .decrypt_padded_mut::<Pkcs7>(&mut buf)
                .map_err(|_| HandlerError::DecryptionFailed)?,
            24 => Aes192CbcDec::new(enc_key.into(), iv.into())
                .decrypt_padded_mut::<Pkcs7>(&mut buf)
                .map_err(|_| HandlerError::DecryptionFailed)?,
            32 => Aes256CbcDec::new(enc_key.into(), iv.into())
                .decrypt_padded_mut::<Pkcs7>(&mut buf)
                .map_err(|_| HandlerError::DecryptionFailed)?,
            _ => unreachable!("cbc_hmac_key_split only returns 16/24/32"),
        };
        Ok(plaintext.to_vec())
    }
}

mod gcm {
    use aes_gcm::{AeadInPlace, Aes128Gcm, Aes192Gcm, Aes256Gcm, KeyInit, Nonce};

    use super::*;

    pub fn encrypt(
        alg: EncryptionAlg,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), HandlerError> {
        let nonce = Nonce::from_slice(iv);
        let mut buffer = plaintext.to_vec();
        let tag = match alg {
            EncryptionAlg::Aes128Gcm => Aes128Gcm::new_from_slice(cek)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .encrypt_in_place_detached(nonce, aad, &mut buffer),
            EncryptionAlg::Aes192Gcm => Aes192Gcm::new_from_slice(cek)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .encrypt_in_place_detached(nonce, aad, &mut buffer),
            EncryptionAlg::Aes256Gcm => Aes256Gcm::new_from_slice(cek)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .encrypt_in_place_detached(nonce, aad, &mut buffer),
            _ => return Err(HandlerError::InvalidParameter(format!("{alg} is not an AES-GCM algorithm"))),
        }
        .map_err(|_| HandlerError::Library("AES-GCM encryption failed".into()))?;
        Ok((buffer, tag.to_vec()))
    }

    pub fn decrypt(
        alg: EncryptionAlg,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, HandlerError> {
        let nonce = Nonce::from_slice(iv);
        let mut buffer = ciphertext.to_vec();
        let tag = aes_gcm::Tag::from_slice(tag);
        let result = match alg {
            EncryptionAlg::Aes128Gcm => Aes128Gcm::new_from_slice(cek)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
            EncryptionAlg::Aes192Gcm => Aes192Gcm::new_from_slice(cek)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
            EncryptionAlg::Aes256Gcm => Aes256Gcm::new_from_slice(cek)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
            _ => return Err(HandlerError::InvalidParameter(format!("{alg} is not an AES-GCM algorithm"))),
        };
        result.map_err(|_| HandlerError::DecryptionFailed)?;
        Ok(buffer)
    }
}
