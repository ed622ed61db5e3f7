//! Key management algorithm handlers: how the Content Encryption Key (CEK)
//! is produced and how it travels to each recipient (RFC7518 §4).

use alloc::{format, vec::Vec};
use jose_jwk::{Key, KeyMgmtAlg};

use crate::error::HandlerError;

/// AES Key Wrap, RFC3394, as RFC7518 §4.4 uses for `A{128,192,256}KW`.
#[cfg(feature = "aes")]
pub mod aes_kw {
    use super::*;
    use aes::cipher::{BlockCipher, BlockDecrypt, BlockEncrypt, KeyInit};

    const DEFAULT_IV: [u8; 8] = [0xA6; 8];

    fn oct_bytes(key: &Key) -> Result<&[u8], HandlerError> {
        match key {
            Key::Oct(oct) => Ok(oct.k.as_bytes()),
            _ => Err(HandlerError::KeyMismatch("expected a symmetric (oct) key".into())),
        }
    }

    /// Wrap `cek` (which must be a multiple of 8 bytes) under `kek`.
    pub fn wrap(kek: &Key, cek: &[u8]) -> Result<Vec<u8>, HandlerError> {
        if cek.len() % 8 != 0 || cek.len() < 16 {
            return Err(HandlerError::InvalidParameter(
                "CEK length must be a multiple of 8 bytes, at least 16".into(),
            ));
        }
        with_cipher(kek, |cipher| wrap_with(cipher, cek))
    }

    /// Unwrap a previously wrapped CEK.
    pub fn unwrap(kek: &Key, wrapped: &[u8]) -> Result<Vec<u8>, HandlerError> {
        if wrapped.len() % 8 != 0 || wrapped.len() < 24 {
            return Err(HandlerError::DecryptionFailed);
        }
        with_cipher(kek, |cipher| unwrap_with(cipher, wrapped))
    }

    fn with_cipher<R>(
        kek: &Key,
        f: impl FnOnce(&dyn BlockCipherDynOrNot) -> Result<R, HandlerError>,
    ) -> Result<R, HandlerError> {
        let key_bytes = oct_bytes(kek)?;
        match key_bytes.len() {
            16 => f(&aes::Aes128::new_from_slice(key_bytes)
                .map_err(|e| HandlerError::Library(format!("{e}")))?),
            24 => f(&aes::Aes192::new_from_slice(key_bytes)
                .map_err(|e| HandlerError::Library(format!("{e}")))?),
            32 => f(&aes::Aes256::new_from_slice(key_bytes)
                .map_err(|e| HandlerError::Library(format!("{e}")))?),
            other => Err(HandlerError::KeyMismatch(format!(
                "AES key wrap requires a 16/24/32-byte key, got {other}"
            ))),
        }
    }

    /// Object-safety shim: the three `aes::AesNNN` types all implement
    /// [`BlockEncrypt`]/[`BlockDecrypt`] but aren't otherwise unifiable
    /// without this trait alias.
    trait BlockCipherDynOrNot: BlockCipher + BlockEncrypt + BlockDecrypt {}
    impl<T: BlockCipher + BlockEncrypt + BlockDecrypt> BlockCipherDynOrNot for T {}

    fn wrap_with(cipher: &dyn BlockCipherDynOrNot, cek: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let n = cek.len() / 8;
        let mut r: Vec<[u8; 8]> = (0..n)
            .map(|i| cek[i * 8..i * 8 + 8].try_into().unwrap())
            .collect();
        let mut a = DEFAULT_IV;

        for j in 0..=5u64 {
            for (i, block) in r.iter_mut().enumerate() {
                let mut buf = [0u8; 16];
                buf[..8].copy_from_slice(&a);
                buf[8..].copy_from_slice(block);
                encrypt_block(cipher, &mut buf);
                let t = j * n as u64 + (i as u64 + 1);
                a = xor_counter(buf_msb(&buf), t);
                block.copy_from_slice(&buf[8..]);
            }
        }

        let mut out = Vec::with_capacity(8 + cek.len());
        out.extend_from_slice(&a);
        for block in &r {
            out.extend_from_slice(block);
        }
        Ok(out)
    }

    fn unwrap_with(cipher: &dyn BlockCipherDynOrNot, wrapped: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let n = wrapped.len() / 8 - 1;
        let mut a: [u8; 8] = wrapped[..8].try_into().unwrap();
        let mut r: Vec<[u8; 8]> = (0..n)
            .map(|i| wrapped[8 + i * 8..8 + i * 8 + 8].try_into().unwrap())
            .collect();

        for j in (0..=5u64).rev() {
            for i in (0..n).rev() {
                let t = j * n as u64 + (i as u64 + 1);
                let a_xor = xor_counter(a, t);
                let mut buf = [0u8; 16];
                buf[..8].copy_from_slice(&a_xor);
                buf[8..].copy_from_slice(&r[i]);
                decrypt_block(cipher, &mut buf);
                a = buf_msb(&buf);
                r[i].copy_from_slice(&buf[8..]);
            }
        }

        if a != DEFAULT_IV {
            return Err(HandlerError::DecryptionFailed);
        }
        let mut out = Vec::with_capacity(n * 8);
        for block in &r {
            out.extend_from_slice(block);
        }
        Ok(out)
    }

    fn buf_msb(buf: &[u8; 16]) -> [u8; 8] {
        buf[..8].try_into().unwrap()
    }

    fn xor_counter(a: [u8; 8], t: u64) -> [u8; 8] {
        let mut out = a;
        for (i, byte) in out.iter_mut().enumerate() {
            *byte ^= ((t >> ((7 - i) * 8)) & 0xff) as u8;
        }
        out
    }

    fn encrypt_block(cipher: &dyn BlockCipherDynOrNot, buf: &mut [u8; 16]) {
        use aes::cipher::generic_array::GenericArray;
        let block = GenericArray::from_mut_slice(buf);
        cipher.encrypt_block(block);
    }

    fn decrypt_block(cipher: &dyn BlockCipherDynOrNot, buf: &mut [u8; 16]) {
        use aes::cipher::generic_array::GenericArray;
        let block = GenericArray::from_mut_slice(buf);
        cipher.decrypt_block(block);
    }
}

/// AES-GCM key wrap, RFC7518 §4.7, used by `A{128,192,256}GCMKW`.
#[cfg(feature = "aes")]
pub mod aes_gcm_kw {
    use super::*;
    use aes_gcm::{aead::Aead, Aes128Gcm, Aes192Gcm, Aes256Gcm, KeyInit, Nonce};

    fn oct_bytes(key: &Key) -> Result<&[u8], HandlerError> {
        match key {
            Key::Oct(oct) => Ok(oct.k.as_bytes()),
            _ => Err(HandlerError::KeyMismatch("expected a symmetric (oct) key".into())),
        }
    }

    /// Wrap `cek` under `kek`. The caller supplies a fresh 96-bit IV and
    /// receives the ciphertext and 128-bit authentication tag split apart,
    /// matching the `iv`/`tag` JWE header parameters.
    pub fn wrap(kek: &Key, iv: &[u8; 12], cek: &[u8]) -> Result<(Vec<u8>, [u8; 16]), HandlerError> {
        let key_bytes = oct_bytes(kek)?;
        let nonce = Nonce::from_slice(iv);
        let mut ciphertext = match key_bytes.len() {
            16 => Aes128Gcm::new_from_slice(key_bytes)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .encrypt(nonce, cek)
                .map_err(|_| HandlerError::Library("AES-GCM encryption failed".into()))?,
            24 => Aes192Gcm::new_from_slice(key_bytes)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .encrypt(nonce, cek)
                .map_err(|_| HandlerError::Library("AES-GCM encryption failed".into()))?,
            32 => Aes256Gcm::new_from_slice(key_bytes)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .encrypt(nonce, cek)
                .map_err(|_| HandlerError::Library("AES-GCM encryption failed".into()))?,
            other => {
                return Err(HandlerError::KeyMismatch(format!(
                    "AES-GCM key wrap requires a 16/24/32-byte key, got {other}"
                )))
            }
        };
        let tag: [u8; 16] = ciphertext
            .split_off(ciphertext.len() - 16)
            .try_into()
            .map_err(|_| HandlerError::Library("unexpected AES-GCM tag length".into()))?;
        Ok((ciphertext, tag))
    }

    /// Unwrap a CEK previously wrapped with [`wrap`].
    pub fn unwrap(kek: &Key, iv: &[u8; 12], tag: &[u8; 16], wrapped: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let key_bytes = oct_bytes(kek)?;
        let nonce = Nonce::from_slice(iv);
        let mut ciphertext = wrapped.to_vec();
        ciphertext.extend_from_slice(tag);
        let result = match key_bytes.len() {
            16 => Aes128Gcm::new_from_slice(key_bytes)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .decrypt(nonce, ciphertext.as_slice()),
            24 => Aes192Gcm::new_from_slice(key_bytes)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .decrypt(nonce, ciphertext.as_slice()),
            32 => Aes256Gcm::new_from_slice(key_bytes)
                .map_err(|e| HandlerError::Library(format!("{e}")))?
                .decrypt(nonce, ciphertext.as_slice()),
            other => {
                return Err(HandlerError::KeyMismatch(format!(
                    "AES-GCM key unwrap requires a 16/24/32-byte key, got {other}"
                )))
            }
        };
        result.map_err(|_| HandlerError::DecryptionFailed)
    }
}

/// PBES2 with an AES Key Wrap step, RFC7518 §4.8, used by the `PBES2-*` family.
#[cfg(feature = "pbes2")]
pub mod pbes2 {
    use super::*;
    use hmac::Hmac;
    use pbkdf2::pbkdf2;
    use sha2::{Sha256, Sha384, Sha512};

    fn oct_bytes(key: &Key) -> Result<&[u8], HandlerError> {
        match key {
            Key::Oct(oct) => Ok(oct.k.as_bytes()),
            _ => Err(HandlerError::KeyMismatch("expected a symmetric (oct) password".into())),
        }
    }

    /// Derive a key-wrapping key from `password` (the shared secret) and
    /// return it, ready to feed into [`super::aes_kw`]. `hash_bits` selects
    /// HS256/384/512 to match the wrap width (A128/192/256KW).
    pub fn derive_kek(
        password: &Key,
        alg_id: &str,
        salt: &[u8],
        iterations: u32,
        hash_bits: u16,
    ) -> Result<Vec<u8>, HandlerError> {
        if iterations == 0 {
            return Err(HandlerError::InvalidParameter("PBES2 iteration count must be nonzero".into()));
        }
        let mut full_salt = Vec::with_capacity(alg_id.len() + 1 + salt.len());
        full_salt.extend_from_slice(alg_id.as_bytes());
        full_salt.push(0);
        full_salt.extend_from_slice(salt);

        let password = oct_bytes(password)?;
        let key_len = hash_bits as usize / 8;
        let mut out = alloc::vec![0u8; key_len];
        match hash_bits {
            256 => pbkdf2::<Hmac<Sha256>>(password, &full_salt, iterations, &mut out)
                .map_err(|e| HandlerError::Library(format!("{e}")))?,
            384 => pbkdf2::<Hmac<Sha384>>(password, &full_salt, iterations, &mut out)
                .map_err(|e| HandlerError::Library(format!("{e}")))?,
            512 => pbkdf2::<Hmac<Sha512>>(password, &full_salt, iterations, &mut out)
                .map_err(|e| HandlerError::Library(format!("{e}")))?,
            other => return Err(HandlerError::InvalidParameter(format!("unsupported PBES2 hash width {other}"))),
        }
        Ok(out)
    }
}

/// RSAES key transport: PKCS1-v1_5 and OAEP (SHA-1 or SHA-256), RFC7518 §4.2/4.3.
#[cfg(feature = "rsa")]
pub mod rsaes {
    use super::*;
    use rsa::{Oaep, Pkcs1v15Encrypt};
    use sha2::Sha256;
    use sha1::Sha1;

    fn rsa_public_key(key: &Key) -> Result<rsa::RsaPublicKey, HandlerError> {
        let Key::Rsa(rsa_key) = key else {
            return Err(HandlerError::KeyMismatch("expected an RSA key".into()));
        };
        let n = rsa::BigUint::from_bytes_be(rsa_key.n.as_ref());
        let e = rsa::BigUint::from_bytes_be(rsa_key.e.as_ref());
        rsa::RsaPublicKey::new(n, e).map_err(|e| HandlerError::Library(format!("{e}")))
    }

    fn rsa_private_key(key: &Key) -> Result<rsa::RsaPrivateKey, HandlerError> {
        let Key::Rsa(rsa_key) = key else {
            return Err(HandlerError::KeyMismatch("expected an RSA key".into()));
        };
        let Some(private) = &rsa_key.private else {
            return Err(HandlerError::KeyMismatch("RSA key has no private component".into()));
        };
        let n = rsa::BigUint::from_bytes_be(rsa_key.n.as_ref());
        let e = rsa::BigUint::from_bytes_be(rsa_key.e.as_ref());
        let d = rsa::BigUint::from_bytes_be(private.d.as_bytes());
        let mut primes = Vec::new();
        if let Some(p) = &private.p {
            primes.push(rsa::BigUint::from_bytes_be(p.as_bytes()));
        }
        if let Some(q) = &private.q {
            primes.push(rsa::BigUint::from_bytes_be(q.as_bytes()));
        }
        rsa::RsaPrivateKey::from_components(n, e, d, primes)
            .map_err(|e| HandlerError::Library(format!("{e}")))
    }

    pub fn wrap_pkcs1(key: &Key, cek: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let public = rsa_public_key(key)?;
        let mut rng = rand_core::OsRng;
        public
            .encrypt(&mut rng, Pkcs1v15Encrypt, cek)
            .map_err(|e| HandlerError::Library(format!("{e}")))
    }

    pub fn unwrap_pkcs1(key: &Key, wrapped: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let private = rsa_private_key(key)?;
        private
            .decrypt(Pkcs1v15Encrypt, wrapped)
            .map_err(|_| HandlerError::DecryptionFailed)
    }

    pub fn wrap_oaep_sha1(key: &Key, cek: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let public = rsa_public_key(key)?;
        let mut rng = rand_core::OsRng;
        public
            .encrypt(&mut rng, Oaep::new::<Sha1>(), cek)
            .map_err(|e| HandlerError::Library(format!("{e}")))
    }

    pub fn unwrap_oaep_sha1(key: &Key, wrapped: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let private = rsa_private_key(key)?;
        private
            .decrypt(Oaep::new::<Sha1>(), wrapped)
            .map_err(|_| HandlerError::DecryptionFailed)
    }

    pub fn wrap_oaep_sha256(key: &Key, cek: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let public = rsa_public_key(key)?;
        let mut rng = rand_core::OsRng;
        public
            .encrypt(&mut rng, Oaep::new::<Sha256>(), cek)
            .map_err(|e| HandlerError::Library(format!("{e}")))
    }

    pub fn unwrap_oaep_sha256(key: &Key, wrapped: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let private = rsa_private_key(key)?;
        private
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map_err(|_| HandlerError::DecryptionFailed)
    }
}

/// ECDH-ES, direct and combined with a key wrap step, RFC7518 §4.6. One
/// Diffie-Hellman dispatch per curve family, mirroring `sign.rs`'s
/// `ecdsa_p256_*`/`ecdsa_p384_*`/`ecdsa_p521_*` split -- the underlying
/// curve crates aren't unifiable behind one generic function.
#[cfg(any(feature = "p256", feature = "p384", feature = "p521", feature = "eddsa"))]
pub mod ecdh_es {
    use super::*;

    /// The ephemeral public key produced for the sender side of an
    /// agreement, in whichever shape its curve uses (EC: `x`/`y` pair;
    /// OKP/X25519: a single `x`).
    pub enum Epk {
        #[cfg(any(feature = "p256", feature = "p384", feature = "p521"))]
        Ec {
            crv: jose_jwk::EcCurve,
            x: Vec<u8>,
            y: Vec<u8>,
        },
        #[cfg(feature = "eddsa")]
        Okp { x: Vec<u8> },
    }

    /// Ephemeral sender side: generate an ephemeral key pair on
    /// `recipient`'s curve, derive the shared secret against its public key,
    /// then run Concat KDF to produce `key_len` bytes bound to
    /// `alg_id`/`apu`/`apv`. Returns the ephemeral public key (destined for
    /// the `epk` header) alongside the derived key.
    pub fn derive_sender(
        recipient: &Key,
        alg_id: &str,
        apu: &[u8],
        apv: &[u8],
        key_len: usize,
    ) -> Result<(Epk, Vec<u8>), HandlerError> {
        match recipient {
            #[cfg(feature = "p256")]
            Key::Ec(ec) if ec.crv == jose_jwk::EcCurve::P256 => {
                p256_ecdh::derive_sender(ec, alg_id, apu, apv, key_len)
            }
            #[cfg(feature = "p384")]
            Key::Ec(ec) if ec.crv == jose_jwk::EcCurve::P384 => {
                p384_ecdh::derive_sender(ec, alg_id, apu, apv, key_len)
            }
            #[cfg(feature = "p521")]
            Key::Ec(ec) if ec.crv == jose_jwk::EcCurve::P521 => {
                p521_ecdh::derive_sender(ec, alg_id, apu, apv, key_len)
            }
            Key::Ec(ec) => Err(HandlerError::Unsupported(format!("ECDH-ES over {:?}", ec.crv))),
            #[cfg(feature = "eddsa")]
            Key::Okp(okp) if okp.crv == jose_jwk::OkpCurve::X25519 => {
                x25519_ecdh::derive_sender(okp, alg_id, apu, apv, key_len)
            }
            Key::Okp(okp) => Err(HandlerError::Unsupported(format!("ECDH-ES over {:?}", okp.crv))),
            _ => Err(HandlerError::KeyMismatch("expected an EC or OKP key".into())),
        }
    }

    /// Recipient side: given the sender's ephemeral public key from the
    /// header and our own private key, redo the agreement and Concat KDF.
    /// `epk` must be the same curve as `own_private` (RFC7518 §4.6's
    /// invalid-curve defense -- a mismatch is a key mismatch, not silently
    /// coerced).
    pub fn derive_recipient(
        own_private: &Key,
        epk: &Key,
        alg_id: &str,
        apu: &[u8],
        apv: &[u8],
        key_len: usize,
    ) -> Result<Vec<u8>, HandlerError> {
        match (own_private, epk) {
            #[cfg(feature = "p256")]
            (Key::Ec(ec), Key::Ec(epk_ec))
                if ec.crv == jose_jwk::EcCurve::P256 && epk_ec.crv == jose_jwk::EcCurve::P256 =>
            {
                p256_ecdh::derive_recipient(ec, epk_ec, alg_id, apu, apv, key_len)
            }
            #[cfg(feature = "p384")]
            (Key::Ec(ec), Key::Ec(epk_ec))
                if ec.crv == jose_jwk::EcCurve::P384 && epk_ec.crv == jose_jwk::EcCurve::P384 =>
            {
                p384_ecdh::derive_recipient(ec, epk_ec, alg_id, apu, apv, key_len)
            }
            #[cfg(feature = "p521")]
            (Key::Ec(ec), Key::Ec(epk_ec))
                if ec.crv == jose_jwk::EcCurve::P521 && epk_ec.crv == jose_jwk::EcCurve::P521 =>
            {
                p521_ecdh::derive_recipient(ec, epk_ec, alg_id, apu, apv, key_len)
            }
            (Key::Ec(_), Key::Ec(_)) => {
                Err(HandlerError::KeyMismatch("epk curve does not match recipient key curve".into()))
            }
            #[cfg(feature = "eddsa")]
            (Key::Okp(okp), Key::Okp(epk_okp))
                if okp.crv == jose_jwk::OkpCurve::X25519 && epk_okp.crv == jose_jwk::OkpCurve::X25519 =>
            {
                x25519_ecdh::derive_recipient(okp, epk_okp, alg_id, apu, apv, key_len)
            }
            (Key::Okp(_), Key::Okp(_)) => {
                Err(HandlerError::KeyMismatch("epk curve does not match recipient key curve".into()))
            }
            _ => Err(HandlerError::KeyMismatch("own key and epk must be the same key type".into())),
        }
    }

    #[cfg(feature = "p256")]
    mod p256_ecdh {
        use super::*;
        use p256::{ecdh::diffie_hellman, PublicKey, SecretKey};

        pub fn derive_sender(
            ec: &jose_jwk::Ec,
            alg_id: &str,
            apu: &[u8],
            apv: &[u8],
            key_len: usize,
        ) -> Result<(Epk, Vec<u8>), HandlerError> {
            let recipient_point = p256::EncodedPoint::from_affine_coordinates(
                p256::FieldBytes::from_slice(ec.x.as_ref()),
                p256::FieldBytes::from_slice(ec.y.as_ref()),
                false,
            );
            let recipient_public = PublicKey::from_sec1_bytes(recipient_point.as_bytes())
                .map_err(|_| HandlerError::KeyMismatch("invalid EC public key".into()))?;

            let ephemeral = SecretKey::random(&mut rand_core::OsRng);
            let shared = diffie_hellman(ephemeral.to_nonzero_scalar(), recipient_public.as_affine());
            let derived =
                crate::concat_kdf::derive(shared.raw_secret_bytes(), alg_id.as_bytes(), apu, apv, key_len);

            let point = ephemeral.public_key().to_encoded_point(false);
            Ok((
                Epk::Ec {
                    crv: jose_jwk::EcCurve::P256,
                    x: point.x().map(|x| x.to_vec()).unwrap_or_default(),
                    y: point.y().map(|y| y.to_vec()).unwrap_or_default(),
                },
                derived,
            ))
        }

        pub fn derive_recipient(
            ec: &jose_jwk::Ec,
            epk_ec: &jose_jwk::Ec,
            alg_id: &str,
            apu: &[u8],
            apv: &[u8],
            key_len: usize,
        ) -> Result<Vec<u8>, HandlerError> {
            let Some(d) = &ec.d else {
                return Err(HandlerError::KeyMismatch("EC key has no private component".into()));
            };
            let our_secret = SecretKey::from_bytes(d.as_bytes().into())
                .map_err(|e| HandlerError::Library(format!("{e}")))?;
            let epk_point = p256::EncodedPoint::from_affine_coordinates(
                p256::FieldBytes::from_slice(epk_ec.x.as_ref()),
                p256::FieldBytes::from_slice(epk_ec.y.as_ref()),
                false,
            );
            let epk_public = PublicKey::from_sec1_bytes(epk_point.as_bytes())
                .map_err(|_| HandlerError::KeyMismatch("invalid ephemeral EC public key".into()))?;
            let shared = diffie_hellman(our_secret.to_nonzero_scalar(), epk_public.as_affine());
            Ok(crate::concat_kdf::derive(
                shared.raw_secret_bytes(),
                alg_id.as_bytes(),
                apu,
                apv,
                key_len,
            ))
        }
    }

    #[cfg(feature = "p384")]
    mod p384_ecdh {
        use super::*;
        use p384::{ecdh::diffie_hellman, PublicKey, SecretKey};

        pub fn derive_sender(
            ec: &jose_jwk::Ec,
            alg_id: &str,
            apu: &[u8],
            apv: &[u8],
            key_len: usize,
        ) -> Result<(Epk, Vec<u8>), HandlerError> {
            let recipient_point = p384::EncodedPoint::from_affine_coordinates(
                p384::FieldBytes::from_slice(ec.x.as_ref()),
                p384::FieldBytes::from_slice(ec.y.as_ref()),
                false,
            );
            let recipient_public = PublicKey::from_sec1_bytes(recipient_point.as_bytes())
                .map_err(|_| HandlerError::KeyMismatch("invalid EC public key".into()))?;

            let ephemeral = SecretKey::random(&mut rand_core::OsRng);
            let shared = diffie_hellman(ephemeral.to_nonzero_scalar(), recipient_public.as_affine());
            let derived =
                crate::concat_kdf::derive(shared.raw_secret_bytes(), alg_id.as_bytes(), apu, apv, key_len);

            let point = ephemeral.public_key().to_encoded_point(false);
            Ok((
                Epk::Ec {
                    crv: jose_jwk::EcCurve::P384,
                    x: point.x().map(|x| x.to_vec()).unwrap_or_default(),
                    y: point.y().map(|y| y.to_vec()).unwrap_or_default(),
                },
                derived,
            ))
        }

        pub fn derive_recipient(
            ec: &jose_jwk::Ec,
            epk_ec: &jose_jwk::Ec,
            alg_id: &str,
            apu: &[u8],
            apv: &[u8],
            key_len: usize,
        ) -> Result<Vec<u8>, HandlerError> {
            let Some(d) = &ec.d else {
                return Err(HandlerError::KeyMismatch("EC key has no private component".into()));
            };
            let our_secret = SecretKey::from_bytes(d.as_bytes().into())
                .map_err(|e| HandlerError::Library(format!("{e}")))?;
            let epk_point = p384::EncodedPoint::from_affine_coordinates(
                p384::FieldBytes::from_slice(epk_ec.x.as_ref()),
                p384::FieldBytes::from_slice(epk_ec.y.as_ref()),
                false,
            );
            let epk_public = PublicKey::from_sec1_bytes(epk_point.as_bytes())
                .map_err(|_| HandlerError::KeyMismatch("invalid ephemeral EC public key".into()))?;
            let shared = diffie_hellman(our_secret.to_nonzero_scalar(), epk_public.as_affine());
            Ok(crate::concat_kdf::derive(
                shared.raw_secret_bytes(),
                alg_id.as_bytes(),
                apu,
                apv,
                key_len,
            ))
        }
    }

    #[cfg(feature = "p521")]
    mod p521_ecdh {
        use super::*;
        use p521::{ecdh::diffie_hellman, PublicKey, SecretKey};

        pub fn derive_sender(
            ec: &jose_jwk::Ec,
            alg_id: &str,
            apu: &[u8],
            apv: &[u8],
            key_len: usize,
        ) -> Result<(Epk, Vec<u8>), HandlerError> {
            let recipient_point = p521::EncodedPoint::from_affine_coordinates(
                p521::FieldBytes::from_slice(ec.x.as_ref()),
                p521::FieldBytes::from_slice(ec.y.as_ref()),
                false,
            );
            let recipient_public = PublicKey::from_sec1_bytes(recipient_point.as_bytes())
                .map_err(|_| HandlerError::KeyMismatch("invalid EC public key".into()))?;

            let ephemeral = SecretKey::random(&mut rand_core::OsRng);
            let shared = diffie_hellman(ephemeral.to_nonzero_scalar(), recipient_public.as_affine());
            let derived =
                crate::concat_kdf::derive(shared.raw_secret_bytes(), alg_id.as_bytes(), apu, apv, key_len);

            let point = ephemeral.public_key().to_encoded_point(false);
            Ok((
                Epk::Ec {
                    crv: jose_jwk::EcCurve::P521,
                    x: point.x().map(|x| x.to_vec()).unwrap_or_default(),
                    y: point.y().map(|y| y.to_vec()).unwrap_or_default(),
                },
                derived,
            ))
        }

        pub fn derive_recipient(
            ec: &jose_jwk::Ec,
            epk_ec: &jose_jwk::Ec,
            alg_id: &str,
            apu: &[u8],
            apv: &[u8],
            key_len: usize,
        ) -> Result<Vec<u8>, HandlerError> {
            let Some(d) = &ec.d else {
                return Err(HandlerError::KeyMismatch("EC key has no private component".into()));
            };
            let our_secret = SecretKey::from_bytes(d.as_bytes().into())
                .map_err(|e| HandlerError::Library(format!("{e}")))?;
            let epk_point = p521::EncodedPoint::from_affine_coordinates(
                p521::FieldBytes::from_slice(epk_ec.x.as_ref()),
                p521::FieldBytes::from_slice(epk_ec.y.as_ref()),
                false,
            );
            let epk_public = PublicKey::from_sec1_bytes(epk_point.as_bytes())
                .map_err(|_| HandlerError::KeyMismatch("invalid ephemeral EC public key".into()))?;
            let shared = diffie_hellman(our_secret.to_nonzero_scalar(), epk_public.as_affine());
            Ok(crate::concat_kdf::derive(
                shared.raw_secret_bytes(),
                alg_id.as_bytes(),
                apu,
                apv,
                key_len,
            ))
        }
    }

    /// ECDH over X25519 (RFC7748), admitted by RFC7518 §4.6 for `OKP` keys.
    /// There is no `y` coordinate and no curve-validity check to perform
    /// beyond the fixed 32-byte width: X25519 clamps internally.
    #[cfg(feature = "eddsa")]
    mod x25519_ecdh {
        use super::*;
        use x25519_dalek::{PublicKey, StaticSecret};

        fn public_from(x: &[u8]) -> Result<PublicKey, HandlerError> {
            let bytes: [u8; 32] = x
                .try_into()
                .map_err(|_| HandlerError::KeyMismatch("X25519 public key must be 32 bytes".into()))?;
            Ok(PublicKey::from(bytes))
        }

        pub fn derive_sender(
            okp: &jose_jwk::Okp,
            alg_id: &str,
            apu: &[u8],
            apv: &[u8],
            key_len: usize,
        ) -> Result<(Epk, Vec<u8>), HandlerError> {
            let recipient_public = public_from(okp.x.as_ref())?;
            let ephemeral = StaticSecret::random_from_rng(&mut rand_core::OsRng);
            let shared = ephemeral.diffie_hellman(&recipient_public);
            let derived = crate::concat_kdf::derive(shared.as_bytes(), alg_id.as_bytes(), apu, apv, key_len);
            let epk_public = PublicKey::from(&ephemeral);
            Ok((Epk::Okp { x: epk_public.as_bytes().to_vec() }, derived))
        }

        pub fn derive_recipient(
            okp: &jose_jwk::Okp,
            epk_okp: &jose_jwk::Okp,
            alg_id: &str,
            apu: &[u8],
            apv: &[u8],
            key_len: usize,
        ) -> Result<Vec<u8>, HandlerError> {
            let Some(d) = &okp.d else {
                return Err(HandlerError::KeyMismatch("OKP key has no private component".into()));
            };
            let seed: [u8; 32] = d
                .as_bytes()
                .try_into()
                .map_err(|_| HandlerError::KeyMismatch("X25519 private key must be 32 bytes".into()))?;
            let our_secret = StaticSecret::from(seed);
            let epk_public = public_from(epk_okp.x.as_ref())?;
            let shared = our_secret.diffie_hellman(&epk_public);
            Ok(crate::concat_kdf::derive(shared.as_bytes(), alg_id.as_bytes(), apu, apv, key_len))
        }
    }
}

/// Whether `alg` wraps the CEK itself (true) or only derives/transmits a
/// symmetric secret directly (`dir`, or plain ECDH-ES, which derives the CEK
/// itself rather than wrapping a randomly generated one).
pub fn wraps_a_randomly_generated_cek(alg: KeyMgmtAlg) -> bool {
    !matches!(alg, KeyMgmtAlg::Dir | KeyMgmtAlg::EcdhEs)
}
