//! How a recipient's Content Encryption Key gets from nowhere (produce) or
//! from an encrypted-key octet string (consume) to a ready-to-use CEK,
//! dispatched by `alg` (RFC7518 §4).

use alloc::{format, vec::Vec};
use jose_jwk::{EncryptionAlg, Jwk, Key, KeyMgmtAlg, Oct};

use crate::{Error, Header};

const PBES2_SALT_LEN: usize = 16;
/// PBKDF2-HMAC-SHA2 iteration count: within shouting distance of the
/// current OWASP baseline for PBKDF2-HMAC-SHA256.
const PBES2_ITERATIONS: u32 = 310_000;

/// The outcome of producing a CEK for one recipient: the CEK itself (which
/// the caller uses to run the content encryption algorithm), the octets
/// that become that recipient's JWE Encrypted Key (empty for `dir` and
/// plain `ECDH-ES`), and whatever header parameters `alg` needed to record
/// (epk/apu/apv/iv/tag/p2s/p2c).
pub struct WrapOutcome {
    pub cek: Vec<u8>,
    pub encrypted_key: Vec<u8>,
    pub header: Header,
}

fn aes_kw_width(alg: KeyMgmtAlg) -> Option<(usize, &'static str)> {
    match alg {
        KeyMgmtAlg::Aes128Kw | KeyMgmtAlg::EcdhEsA128Kw | KeyMgmtAlg::Pbes2Hs256A128Kw => {
            Some((16, "A128KW"))
        }
        KeyMgmtAlg::Aes192Kw | KeyMgmtAlg::EcdhEsA192Kw | KeyMgmtAlg::Pbes2Hs384A192Kw => {
            Some((24, "A192KW"))
        }
        KeyMgmtAlg::Aes256Kw | KeyMgmtAlg::EcdhEsA256Kw | KeyMgmtAlg::Pbes2Hs512A256Kw => {
            Some((32, "A256KW"))
        }
        _ => None,
    }
}

fn pbes2_hash_bits(alg: KeyMgmtAlg) -> Option<u16> {
    match alg {
        KeyMgmtAlg::Pbes2Hs256A128Kw => Some(256),
        KeyMgmtAlg::Pbes2Hs384A192Kw => Some(384),
        KeyMgmtAlg::Pbes2Hs512A256Kw => Some(512),
        _ => None,
    }
}

fn epk_to_key(epk: jose_jwa::keymgmt::ecdh_es::Epk) -> Key {
    match epk {
        jose_jwa::keymgmt::ecdh_es::Epk::Ec { crv, x, y } => Key::Ec(jose_jwk::Ec {
            crv,
            x: jose_b64::B64Bytes::new(x),
            y: jose_b64::B64Bytes::new(y),
            d: None,
        }),
        jose_jwa::keymgmt::ecdh_es::Epk::Okp { x } => Key::Okp(jose_jwk::Okp {
            crv: jose_jwk::OkpCurve::X25519,
            x: jose_b64::B64Bytes::new(x),
            d: None,
        }),
    }
}

/// Produce the CEK and (if applicable) wrapped key material for one
/// recipient, returning the header parameters that must be recorded
/// alongside it.
pub fn produce(
    alg: KeyMgmtAlg,
    enc: EncryptionAlg,
    key: &Jwk,
    apu: Option<&[u8]>,
    apv: Option<&[u8]>,
) -> Result<WrapOutcome, Error> {
    let mut header = Header::default();

    match alg {
        KeyMgmtAlg::Dir => {
            let Key::Oct(oct) = &key.key else {
                return Err(jose_jwa::HandlerError::KeyMismatch("dir requires a symmetric key".into()).into());
            };
            Ok(WrapOutcome {
                cek: oct.k.as_bytes().to_vec(),
                encrypted_key: Vec::new(),
                header,
            })
        }

        KeyMgmtAlg::EcdhEs => {
            let alg_id = enc.to_string();
            let (epk, cek) = jose_jwa::keymgmt::ecdh_es::derive_sender(
                &key.key,
                &alg_id,
                apu.unwrap_or(&[]),
                apv.unwrap_or(&[]),
                jose_jwa::enc::cek_len(enc),
            )?;
            header.epk = Some(epk_to_key(epk));
            header.apu = apu.map(|v| jose_b64::B64Bytes::new(v.to_vec()));
            header.apv = apv.map(|v| jose_b64::B64Bytes::new(v.to_vec()));
            Ok(WrapOutcome {
                cek,
                encrypted_key: Vec::new(),
                header,
            })
        }

        KeyMgmtAlg::EcdhEsA128Kw | KeyMgmtAlg::EcdhEsA192Kw | KeyMgmtAlg::EcdhEsA256Kw => {
            let (kw_len, kw_name) = aes_kw_width(alg).expect("ECDH-ES+*KW always has a wrap width");
            let (epk, kek) = jose_jwa::keymgmt::ecdh_es::derive_sender(
                &key.key,
                kw_name,
                apu.unwrap_or(&[]),
                apv.unwrap_or(&[]),
                kw_len,
            )?;
            let cek = jose_b64::random_bytes(jose_jwa::enc::cek_len(enc));
            let kek_key = Key::Oct(Oct {
                k: jose_b64::B64Secret::new(kek),
            });
            let encrypted_key = jose_jwa::keymgmt::aes_kw::wrap(&kek_key, &cek)?;
            header.epk = Some(epk_to_key(epk));
            header.apu = apu.map(|v| jose_b64::B64Bytes::new(v.to_vec()));
            header.apv = apv.map(|v| jose_b64::B64Bytes::new(v.to_vec()));
            Ok(WrapOutcome {
                cek,
                encrypted_key,
                header,
            })
        }

        KeyMgmtAlg::Aes128Kw | KeyMgmtAlg::Aes192Kw | KeyMgmtAlg::Aes256Kw => {
            let cek = jose_b64::random_bytes(jose_jwa::enc::cek_len(enc));
            let encrypted_key = jose_jwa::keymgmt::aes_kw::wrap(&key.key, &cek)?;
            Ok(WrapOutcome {
                cek,
                encrypted_key,
                header,
            })
        }

        KeyMgmtAlg::Aes128GcmKw | KeyMgmtAlg::Aes192GcmKw | KeyMgmtAlg::Aes256GcmKw => {
            let cek = jose_b64::random_bytes(jose_jwa::enc::cek_len(enc));
            let iv: [u8; 12] = jose_b64::random_bytes(12)
                .try_into()
                .expect("random_bytes(12) is always 12 bytes");
            let (encrypted_key, tag) = jose_jwa::keymgmt::aes_gcm_kw::wrap(&key.key, &iv, &cek)?;
            header.iv = Some(jose_b64::B64Bytes::new(iv));
            header.tag = Some(jose_b64::B64Bytes::new(tag));
            Ok(WrapOutcome {
                cek,
                encrypted_key,
                header,
            })
        }

        KeyMgmtAlg::Pbes2Hs256A128Kw | KeyMgmtAlg::Pbes2Hs384A192Kw | KeyMgmtAlg::Pbes2Hs512A256Kw => {
            let hash_bits = pbes2_hash_bits(alg).expect("PBES2-* always has a hash width");
            let alg_id = alg.to_string();
            let salt = jose_b64::random_bytes(PBES2_SALT_LEN);
            let kek = jose_jwa::keymgmt::pbes2::derive_kek(
                &key.key,
                &alg_id,
                &salt,
                PBES2_ITERATIONS,
                hash_bits,
            )?;
            let cek = jose_b64::random_bytes(jose_jwa::enc::cek_len(enc));
            let kek_key = Key::Oct(Oct {
                k: jose_b64::B64Secret::new(kek),
            });
            let encrypted_key = jose_jwa::keymgmt::aes_kw::wrap(&kek_key, &cek)?;
            header.p2s = Some(jose_b64::B64Bytes::new(salt));
            header.p2c = Some(PBES2_ITERATIONS);
            Ok(WrapOutcome {
                cek,
                encrypted_key,
                header,
            })
        }

        KeyMgmtAlg::Rsa1to5 => {
            let cek = jose_b64::random_bytes(jose_jwa::enc::cek_len(enc));
            let encrypted_key = jose_jwa::keymgmt::rsaes::wrap_pkcs1(&key.key, &cek)?;
            Ok(WrapOutcome { cek, encrypted_key, header })
        }
        KeyMgmtAlg::RsaOaep => {
            let cek = jose_b64::random_bytes(jose_jwa::enc::cek_len(enc));
            let encrypted_key = jose_jwa::keymgmt::rsaes::wrap_oaep_sha1(&key.key, &cek)?;
            Ok(WrapOutcome { cek, encrypted_key, header })
        }
        KeyMgmtAlg::RsaOaep256 => {
            let cek = jose_b64::random_bytes(jose_jwa::enc::cek_len(enc));
            let encrypted_key = jose_jwa::keymgmt::rsaes::wrap_oaep_sha256(&key.key, &cek)?;
            Ok(WrapOutcome { cek, encrypted_key, header })
        }
    }
}

/// Wrap an already-generated `cek` for one recipient of a multi-recipient
/// JWE. `dir` and plain `ECDH-ES` each produce their own CEK from the
/// recipient's key rather than transporting one chosen elsewhere, so
/// neither can honor a shared CEK across recipients (RFC7516 §4.1 only
/// really supports them for a single recipient); using either here is an
/// error.
pub fn produce_for_cek(
    alg: KeyMgmtAlg,
    key: &Jwk,
    cek: &[u8],
    apu: Option<&[u8]>,
    apv: Option<&[u8]>,
) -> Result<WrapOutcome, Error> {
    if !jose_jwa::keymgmt::wraps_a_randomly_generated_cek(alg) {
        return Err(Error::InvalidParameter(format!(
            "{alg} cannot share a Content Encryption Key across multiple recipients"
        )));
    }

    let mut header = Header::default();

    match alg {
        KeyMgmtAlg::EcdhEsA128Kw | KeyMgmtAlg::EcdhEsA192Kw | KeyMgmtAlg::EcdhEsA256Kw => {
            let (kw_len, kw_name) = aes_kw_width(alg).expect("ECDH-ES+*KW always has a wrap width");
            let (epk, kek) = jose_jwa::keymgmt::ecdh_es::derive_sender(
                &key.key,
                kw_name,
                apu.unwrap_or(&[]),
                apv.unwrap_or(&[]),
                kw_len,
            )?;
            let kek_key = Key::Oct(Oct {
                k: jose_b64::B64Secret::new(kek),
            });
            let encrypted_key = jose_jwa::keymgmt::aes_kw::wrap(&kek_key, cek)?;
            header.epk = Some(epk_to_key(epk));
            header.apu = apu.map(|v| jose_b64::B64Bytes::new(v.to_vec()));
            header.apv = apv.map(|v| jose_b64::B64Bytes::new(v.to_vec()));
            Ok(WrapOutcome {
                cek: cek.to_vec(),
                encrypted_key,
                header,
            })
        }

        KeyMgmtAlg::Aes128Kw | KeyMgmtAlg::Aes192Kw | KeyMgmtAlg::Aes256Kw => {
            let encrypted_key = jose_jwa::keymgmt::aes_kw::wrap(&key.key, cek)?;
            Ok(WrapOutcome {
                cek: cek.to_vec(),
                encrypted_key,
                header,
            })
        }

        KeyMgmtAlg::Aes128GcmKw | KeyMgmtAlg::Aes192GcmKw | KeyMgmtAlg::Aes256GcmKw => {
            let iv: [u8; 12] = jose_b64::random_bytes(12)
                .try_into()
                .expect("random_bytes(12) is always 12 bytes");
            let (encrypted_key, tag) = jose_jwa::keymgmt::aes_gcm_kw::wrap(&key.key, &iv, cek)?;
            header.iv = Some(jose_b64::B64Bytes::new(iv));
            header.tag = Some(jose_b64::B64Bytes::new(tag));
            Ok(WrapOutcome {
                cek: cek.to_vec(),
                encrypted_key,
                header,
            })
        }

        KeyMgmtAlg::Pbes2Hs256A128Kw | KeyMgmtAlg::Pbes2Hs384A192Kw | KeyMgmtAlg::Pbes2Hs512A256Kw => {
            let hash_bits = pbes2_hash_bits(alg).expect("PBES2-* always has a hash width");
            let alg_id = alg.to_string();
            let salt = jose_b64::random_bytes(PBES2_SALT_LEN);
            let kek = jose_jwa::keymgmt::pbes2::derive_kek(
                &key.key,
                &alg_id,
                &salt,
                PBES2_ITERATIONS,
                hash_bits,
            )?;
            let kek_key = Key::Oct(Oct {
                k: jose_b64::B64Secret::new(kek),
            });
            let encrypted_key = jose_jwa::keymgmt::aes_kw::wrap(&kek_key, cek)?;
            header.p2s = Some(jose_b64::B64Bytes::new(salt));
            header.p2c = Some(PBES2_ITERATIONS);
            Ok(WrapOutcome {
                cek: cek.to_vec(),
                encrypted_key,
                header,
            })
        }

        KeyMgmtAlg::Rsa1to5 => {
            let encrypted_key = jose_jwa::keymgmt::rsaes::wrap_pkcs1(&key.key, cek)?;
            Ok(WrapOutcome { cek: cek.to_vec(), encrypted_key, header })
        }
        KeyMgmtAlg::RsaOaep => {
            let encrypted_key = jose_jwa::keymgmt::rsaes::wrap_oaep_sha1(&key.key, cek)?;
            Ok(WrapOutcome { cek: cek.to_vec(), encrypted_key, header })
        }
        KeyMgmtAlg::RsaOaep256 => {
            let encrypted_key = jose_jwa::keymgmt::rsaes::wrap_oaep_sha256(&key.key, cek)?;
            Ok(WrapOutcome { cek: cek.to_vec(), encrypted_key, header })
        }

        KeyMgmtAlg::Dir | KeyMgmtAlg::EcdhEs => unreachable!("rejected above"),
    }
}

/// Recover the CEK for one recipient given the effective (merged) header
/// and that recipient's `encrypted_key`.
pub fn consume(
    alg: KeyMgmtAlg,
    enc: EncryptionAlg,
    key: &Jwk,
    header: &Header,
    encrypted_key: &[u8],
) -> Result<Vec<u8>, Error> {
    match alg {
        KeyMgmtAlg::Dir => {
            let Key::Oct(oct) = &key.key else {
                return Err(jose_jwa::HandlerError::KeyMismatch("dir requires a symmetric key".into()).into());
            };
            Ok(oct.k.as_bytes().to_vec())
        }

        KeyMgmtAlg::EcdhEs => {
            let Some(epk) = &header.epk else {
                return Err(Error::InvalidParameter("ECDH-ES requires epk".into()));
            };
            let alg_id = enc.to_string();
            Ok(jose_jwa::keymgmt::ecdh_es::derive_recipient(
                &key.key,
                epk,
                &alg_id,
                header.apu.as_ref().map(|v| v.as_ref()).unwrap_or(&[]),
                header.apv.as_ref().map(|v| v.as_ref()).unwrap_or(&[]),
                jose_jwa::enc::cek_len(enc),
            )?)
        }

        KeyMgmtAlg::EcdhEsA128Kw | KeyMgmtAlg::EcdhEsA192Kw | KeyMgmtAlg::EcdhEsA256Kw => {
            let Some(epk) = &header.epk else {
                return Err(Error::InvalidParameter(format!("{alg} requires epk")));
            };
            let (kw_len, kw_name) = aes_kw_width(alg).expect("ECDH-ES+*KW always has a wrap width");
            let kek = jose_jwa::keymgmt::ecdh_es::derive_recipient(
                &key.key,
                epk,
                kw_name,
                header.apu.as_ref().map(|v| v.as_ref()).unwrap_or(&[]),
                header.apv.as_ref().map(|v| v.as_ref()).unwrap_or(&[]),
                kw_len,
            )?;
            let kek_key = Key::Oct(Oct {
                k: jose_b64::B64Secret::new(kek),
            });
            Ok(jose_jwa::keymgmt::aes_kw::unwrap(&kek_key, encrypted_key)?)
        }

        KeyMgmtAlg::Aes128Kw | KeyMgmtAlg::Aes192Kw | KeyMgmtAlg::Aes256Kw => {
            Ok(jose_jwa::keymgmt::aes_kw::unwrap(&key.key, encrypted_key)?)
        }

        KeyMgmtAlg::Aes128GcmKw | KeyMgmtAlg::Aes192GcmKw | KeyMgmtAlg::Aes256GcmKw => {
            let iv = header
                .iv
                .as_ref()
                .ok_or_else(|| Error::InvalidParameter(format!("{alg} requires iv")))?;
            let tag = header
                .tag
                .as_ref()
                .ok_or_else(|| Error::InvalidParameter(format!("{alg} requires tag")))?;
            Ok(jose_jwa::keymgmt::aes_gcm_kw::unwrap(
                &key.key,
                iv.as_ref().try_into().expect("iv is fixed-size"),
                tag.as_ref().try_into().expect("tag is fixed-size"),
                encrypted_key,
            )?)
        }

        KeyMgmtAlg::Pbes2Hs256A128Kw | KeyMgmtAlg::Pbes2Hs384A192Kw | KeyMgmtAlg::Pbes2Hs512A256Kw => {
            let hash_bits = pbes2_hash_bits(alg).expect("PBES2-* always has a hash width");
            let salt = header
                .p2s
                .as_ref()
                .ok_or_else(|| Error::InvalidParameter(format!("{alg} requires p2s")))?;
            let iterations = header
                .p2c
                .ok_or_else(|| Error::InvalidParameter(format!("{alg} requires p2c")))?;
            let alg_id = alg.to_string();
            let kek = jose_jwa::keymgmt::pbes2::derive_kek(
                &key.key,
                &alg_id,
                salt.as_ref(),
                iterations,
                hash_bits,
            )?;
            let kek_key = Key::Oct(Oct {
                k: jose_b64::B64Secret::new(kek),
            });
            Ok(jose_jwa::keymgmt::aes_kw::unwrap(&kek_key, encrypted_key)?)
        }

        KeyMgmtAlg::Rsa1to5 => Ok(jose_jwa::keymgmt::rsaes::unwrap_pkcs1(&key.key, encrypted_key)?),
        KeyMgmtAlg::RsaOaep => Ok(jose_jwa::keymgmt::rsaes::unwrap_oaep_sha1(&key.key, encrypted_key)?),
        KeyMgmtAlg::RsaOaep256 => {
            Ok(jose_jwa::keymgmt::rsaes::unwrap_oaep_sha256(&key.key, encrypted_key)?)
        }
    }
}
