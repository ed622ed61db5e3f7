//! JWE JSON Serialization (RFC7516 §7.2): the general and flattened forms,
//! including multi-recipient support.
//!
//! A single Content Encryption Key is generated once and wrapped separately
//! per recipient; the ciphertext and authentication tag are shared. The
//! AAD authenticated by the content encryption algorithm is
//! `ASCII(BASE64URL(protected)) || '.' || BASE64URL(aad)` when an explicit
//! `aad` member is present, matching the compact form's bare
//! `ASCII(BASE64URL(protected))` when it is not (RFC7516 §5.1 step 14).

use alloc::{format, string::String, vec::Vec};
use jose_b64::{B64Bytes, Json};
use jose_jwk::{EncryptionAlg, Jwk, JwkSet, KeyMgmtAlg};
use serde::{Deserialize, Serialize};

use crate::{engine, Error, Header};

/// One recipient's entry in the general JSON Serialization's `recipients`
/// array (or inlined in the flattened form).
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    /// Header parameters specific to this recipient, not integrity
    /// protected.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub header: Option<Header>,

    /// This recipient's JWE Encrypted Key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub encrypted_key: Option<B64Bytes>,
}

/// A JWE in the general JSON Serialization (RFC7516 §7.2.1).
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneralJson {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub protected: Option<Json<Header>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unprotected: Option<Header>,
    pub iv: B64Bytes,
    pub ciphertext: B64Bytes,
    pub tag: B64Bytes,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub aad: Option<B64Bytes>,
    pub recipients: Vec<Recipient>,
}

/// A JWE in the flattened JSON Serialization (RFC7516 §7.2.2): a shorthand
/// for exactly one recipient, with `header`/`encrypted_key` inlined at the
/// top level.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlattenedJson {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub protected: Option<Json<Header>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unprotected: Option<Header>,
    pub iv: B64Bytes,
    pub ciphertext: B64Bytes,
    pub tag: B64Bytes,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub aad: Option<B64Bytes>,
    #[serde(flatten)]
    pub recipient: Recipient,
}

fn content_aad(protected: &Json<Header>, aad: Option<&[u8]>) -> String {
    match aad {
        Some(aad) => format!("{}.{}", protected.encoded(), jose_b64::encode(aad)),
        None => protected.encoded(),
    }
}

/// Produce the flattened JSON Serialization: one recipient, `alg`/`enc` (and
/// any algorithm-specific parameters) recorded in the protected header.
pub fn produce_flattened(
    alg: KeyMgmtAlg,
    enc: EncryptionAlg,
    plaintext: &[u8],
    aad: Option<&[u8]>,
    key: &Jwk,
) -> Result<FlattenedJson, Error> {
    let outcome = engine::produce(alg, enc, key, None, None)?;
    let mut header = outcome.header;
    header.alg = Some(alg);
    header.enc = Some(enc);
    if !header.crit.is_empty() {
        return Err(Error::UnsupportedCritical(header.crit.join(", ")));
    }

    let protected = Json::new(header).map_err(|e| Error::Malformed(format!("{e}")))?;
    let iv = jose_b64::random_bytes(jose_jwa::enc::iv_len(enc));
    let (ciphertext, tag) = jose_jwa::enc::encrypt(
        enc,
        &outcome.cek,
        &iv,
        content_aad(&protected, aad).as_bytes(),
        plaintext,
    )?;

    Ok(FlattenedJson {
        protected: Some(protected),
        unprotected: None,
        iv: B64Bytes::new(iv),
        ciphertext: B64Bytes::new(ciphertext),
        tag: B64Bytes::new(tag),
        aad: aad.map(|v| B64Bytes::new(v.to_vec())),
        recipient: Recipient {
            header: None,
            encrypted_key: Some(B64Bytes::new(outcome.encrypted_key)),
        },
    })
}

/// Decrypt a flattened JSON Serialization.
pub fn consume_flattened(jws: &FlattenedJson, keys: &JwkSet) -> Result<(Header, Vec<u8>), Error> {
    let protected_header = jws
        .protected
        .as_ref()
        .map(|p| p.value().clone())
        .unwrap_or_default();
    let shared = jws
        .unprotected
        .clone()
        .map(|h| protected_header.merge(&h))
        .unwrap_or(protected_header.clone());
    let header = jws
        .recipient
        .header
        .clone()
        .map(|h| h.merge(&shared))
        .unwrap_or(shared);

    let alg = header.alg.ok_or_else(|| Error::Malformed("missing alg".into()))?;
    let enc = header.enc.ok_or_else(|| Error::Malformed("missing enc".into()))?;
    if !header.crit.is_empty() {
        return Err(Error::UnsupportedCritical(header.crit.join(", ")));
    }

    let encrypted_key = jws
        .recipient
        .encrypted_key
        .as_ref()
        .map(|v| v.as_ref().to_vec())
        .unwrap_or_default();
    let aad_bytes = jws.aad.as_ref().map(|v| v.as_ref());
    let content_aad_bytes = match &jws.protected {
        Some(protected) => content_aad(protected, aad_bytes),
        None => String::new(),
    };

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
        if let Ok(plaintext) = jose_jwa::enc::decrypt(
            enc,
            &cek,
            jws.iv.as_ref(),
            content_aad_bytes.as_bytes(),
            jws.ciphertext.as_ref(),
            jws.tag.as_ref(),
        ) {
            return Ok((header, plaintext));
        }
    }
    Err(Error::DecryptionFailed)
}

/// Produce the general JSON Serialization: one shared Content Encryption
/// Key, independently wrapped to each `(alg, key)` pair. Every `alg` must be
/// able to wrap an externally supplied CEK (`dir` and plain `ECDH-ES`
/// cannot, and are rejected with [`Error::InvalidParameter`]).
pub fn produce_general(
    enc: EncryptionAlg,
    plaintext: &[u8],
    aad: Option<&[u8]>,
    recipients: &[(KeyMgmtAlg, &Jwk)],
) -> Result<GeneralJson, Error> {
    if recipients.is_empty() {
        return Err(Error::InvalidParameter("at least one recipient is required".into()));
    }

    let cek = jose_b64::random_bytes(jose_jwa::enc::cek_len(enc));
    let mut out_recipients = Vec::with_capacity(recipients.len());
    for (alg, key) in recipients {
        let outcome = engine::produce_for_cek(*alg, key, &cek, None, None)?;
        let mut header = outcome.header;
        header.alg = Some(*alg);
        if !header.crit.is_empty() {
            return Err(Error::UnsupportedCritical(header.crit.join(", ")));
        }
        out_recipients.push(Recipient {
            header: Some(header),
            encrypted_key: Some(B64Bytes::new(outcome.encrypted_key)),
        });
    }

    // `alg` is per-recipient; the shared protected header carries only `enc`.
    let shared_header = Header {
        enc: Some(enc),
        ..Header::default()
    };
    let protected = Json::new(shared_header).map_err(|e| Error::Malformed(format!("{e}")))?;

    let iv = jose_b64::random_bytes(jose_jwa::enc::iv_len(enc));
    let (ciphertext, tag) = jose_jwa::enc::encrypt(
        enc,
        &cek,
        &iv,
        content_aad(&protected, aad).as_bytes(),
        plaintext,
    )?;

    Ok(GeneralJson {
        protected: Some(protected),
        unprotected: None,
        iv: B64Bytes::new(iv),
        ciphertext: B64Bytes::new(ciphertext),
        tag: B64Bytes::new(tag),
        aad: aad.map(|v| B64Bytes::new(v.to_vec())),
        recipients: out_recipients,
    })
}

/// Decrypt a general JSON Serialization: each recipient entry is tried with
/// its corresponding candidate key(s) until one yields a CEK that also
/// authenticates the ciphertext.
pub fn consume_general(jws: &GeneralJson, keys: &JwkSet) -> Result<(Header, Vec<u8>), Error> {
    let protected_header = jws
        .protected
        .as_ref()
        .map(|p| p.value().clone())
        .unwrap_or_default();
    let shared = jws
        .unprotected
        .clone()
        .map(|h| protected_header.merge(&h))
        .unwrap_or(protected_header.clone());

    let aad_bytes = jws.aad.as_ref().map(|v| v.as_ref());
    let content_aad_bytes = match &jws.protected {
        Some(protected) => content_aad(protected, aad_bytes),
        None => String::new(),
    };

    for recipient in &jws.recipients {
        let header = recipient
            .header
            .clone()
            .map(|h| h.merge(&shared))
            .unwrap_or_else(|| shared.clone());
        let Some(alg) = header.alg else { continue };
        let Some(enc) = header.enc else { continue };
        if !header.crit.is_empty() {
            continue;
        }

        let encrypted_key = recipient
            .encrypted_key
            .as_ref()
            .map(|v| v.as_ref().to_vec())
            .unwrap_or_default();

        let criteria = jose_jwa::registry::key_mgmt_key_criteria(alg);
        let candidates: Vec<&Jwk> = match &header.kid {
            Some(kid) => keys.select(&criteria, Some(kid)).into_iter().collect(),
            None => keys.select_all(&criteria).collect(),
        };

        for candidate in candidates {
            let Ok(cek) = engine::consume(alg, enc, candidate, &header, &encrypted_key) else {
                continue;
            };
            if let Ok(plaintext) = jose_jwa::enc::decrypt(
                enc,
                &cek,
                jws.iv.as_ref(),
                content_aad_bytes.as_bytes(),
                jws.ciphertext.as_ref(),
                jws.tag.as_ref(),
            ) {
                return Ok((header, plaintext));
            }
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
            k: B64Secret::new(alloc::vec![0x11; len]),
        }))
    }

    #[test]
    fn flattened_roundtrips() {
        let key = oct_jwk(32);
        let jws = produce_flattened(
            KeyMgmtAlg::Dir,
            EncryptionAlg::Aes128CbcHs256,
            b"hello",
            None,
            &key,
        )
        .unwrap();

        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let (header, plaintext) = consume_flattened(&jws, &set).unwrap();
        assert_eq!(header.enc, Some(EncryptionAlg::Aes128CbcHs256));
        assert_eq!(plaintext, b"hello");
    }

    #[test]
    fn general_delivers_to_every_recipient() {
        let mut key_a = oct_jwk(16);
        key_a.params.kid = Some("a".into());
        let mut key_b = oct_jwk(16);
        key_b.params.kid = Some("b".into());

        let jws = produce_general(
            EncryptionAlg::Aes128Gcm,
            b"shared secret",
            None,
            &[(KeyMgmtAlg::Aes128Kw, &key_a), (KeyMgmtAlg::Aes128Kw, &key_b)],
        )
        .unwrap();
        assert_eq!(jws.recipients.len(), 2);

        let mut set_a = JwkSet::new();
        set_a.add(key_a).unwrap();
        let (_, plaintext_a) = consume_general(&jws, &set_a).unwrap();
        assert_eq!(plaintext_a, b"shared secret");

        let mut set_b = JwkSet::new();
        set_b.add(key_b).unwrap();
        let (_, plaintext_b) = consume_general(&jws, &set_b).unwrap();
        assert_eq!(plaintext_b, b"shared secret");
    }

    #[test]
    fn general_rejects_dir_with_multiple_recipients() {
        let key_a = oct_jwk(32);
        let key_b = oct_jwk(32);
        let err = produce_general(
            EncryptionAlg::Aes128CbcHs256,
            b"x",
            None,
            &[(KeyMgmtAlg::Dir, &key_a), (KeyMgmtAlg::Dir, &key_b)],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }
}
