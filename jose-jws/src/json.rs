//! JWS JSON Serialization (RFC7515 §7.2): the general and flattened forms.
//!
//! Both forms carry the same three ingredients as the compact form -- a
//! protected header, a payload, and one or more signatures -- just spread
//! across JSON object members instead of dot-joined base64url segments.
//! This means the *signing input* for each signature is still
//! `ASCII(BASE64URL(protected) || '.' || BASE64URL(payload))`, computed per
//! signature from that signature's own protected header.

use alloc::{string::String, vec::Vec};
use jose_b64::{B64Bytes, Json};
use jose_jwk::{Jwk, JwkSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Header};

/// One signature over a JWS payload, as it appears in the `signatures` array
/// of the general JSON Serialization (or inlined in the flattened form).
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// The protected header, carried as the exact base64url bytes it was
    /// produced from or parsed out of (RFC7515 §5.1/§5.2 authenticate these
    /// octets, not a re-serialization of the parsed JSON).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub protected: Option<Json<Header>>,

    /// Header parameters that apply to this signature but are not
    /// integrity-protected.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub header: Option<Map<String, Value>>,

    /// The signature itself.
    pub signature: B64Bytes,
}

impl Signature {
    fn merged_header(&self) -> Result<Header, Error> {
        let Some(protected) = &self.protected else {
            return Err(Error::Malformed(
                "a signature without a protected header carries no alg".into(),
            ));
        };
        Ok(protected.value().clone())
    }
}

/// A JWS in the general JSON Serialization (RFC7515 §7.2.1): one payload
/// secured by one or more independent signatures, each potentially under a
/// different key and algorithm.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneralJson {
    /// The JWS Payload.
    pub payload: B64Bytes,
    /// One entry per signature.
    pub signatures: Vec<Signature>,
}

/// A JWS in the flattened JSON Serialization (RFC7515 §7.2.2): a shorthand
/// for exactly one signature, with `protected`/`header`/`signature` inlined
/// at the top level instead of nested in a one-element `signatures` array.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlattenedJson {
    /// The JWS Payload.
    pub payload: B64Bytes,
    #[serde(flatten)]
    pub signature: Signature,
}

/// Produce the flattened JSON Serialization of `payload`, signed once with
/// `key` under `header`.
pub fn produce_flattened(
    header: &Header,
    payload: &[u8],
    key: &Jwk,
) -> Result<FlattenedJson, Error> {
    if !header.crit.is_empty() {
        return Err(Error::UnsupportedCritical(header.crit.join(", ")));
    }
    let protected =
        Json::new(header.clone()).map_err(|e| Error::Malformed(alloc::format!("{e}")))?;
    let signing_input = signing_input(&protected, payload);
    let signature = jose_jwa::sign(header.alg, &key.key, signing_input.as_bytes())?;

    Ok(FlattenedJson {
        payload: B64Bytes::new(payload.to_vec()),
        signature: Signature {
            protected: Some(protected),
            header: None,
            signature: B64Bytes::new(signature),
        },
    })
}

/// Verify a flattened JSON Serialization, selecting a candidate key from
/// `keys` exactly as [`crate::consume`] does for the compact form.
pub fn consume_flattened(jws: &FlattenedJson, keys: &JwkSet) -> Result<(Header, Vec<u8>), Error> {
    verify_one(&jws.signature, jws.payload.as_ref(), keys)?;
    let header = jws.signature.merged_header()?;
    Ok((header, jws.payload.as_ref().to_vec()))
}

/// Produce the general JSON Serialization of `payload`, signed once per
/// `(header, key)` pair -- one entry in the `signatures` array per pair, in
/// order.
pub fn produce_general(
    payload: &[u8],
    signers: &[(Header, &Jwk)],
) -> Result<GeneralJson, Error> {
    let mut signatures = Vec::with_capacity(signers.len());
    for (header, key) in signers {
        if !header.crit.is_empty() {
            return Err(Error::UnsupportedCritical(header.crit.join(", ")));
        }
        let protected =
            Json::new(header.clone()).map_err(|e| Error::Malformed(alloc::format!("{e}")))?;
        let signing_input = signing_input(&protected, payload);
        let signature = jose_jwa::sign(header.alg, &key.key, signing_input.as_bytes())?;
        signatures.push(Signature {
            protected: Some(protected),
            header: None,
            signature: B64Bytes::new(signature),
        });
    }

    Ok(GeneralJson {
        payload: B64Bytes::new(payload.to_vec()),
        signatures,
    })
}

/// Verify a general JSON Serialization: each signature entry is tried in
/// turn against its candidate key(s); the first one that verifies wins.
/// Returns that signature's header alongside the payload. Exhausting every
/// entry without a single success is [`Error::VerificationFailed`].
pub fn consume_general(jws: &GeneralJson, keys: &JwkSet) -> Result<(Header, Vec<u8>), Error> {
    for signature in &jws.signatures {
        match verify_one(signature, jws.payload.as_ref(), keys) {
            Ok(()) => {
                let header = signature.merged_header()?;
                return Ok((header, jws.payload.as_ref().to_vec()));
            }
            Err(Error::KeyNotFound) | Err(Error::VerificationFailed) => continue,
            Err(other) => return Err(other),
        }
    }
    Err(Error::VerificationFailed)
}

fn signing_input(protected: &Json<Header>, payload: &[u8]) -> String {
    alloc::format!("{}.{}", protected.encoded(), jose_b64::encode(payload))
}

fn verify_one(signature: &Signature, payload: &[u8], keys: &JwkSet) -> Result<(), Error> {
    let header = signature.merged_header()?;
    if header.alg == jose_jwk::SigningAlg::None {
        return Err(Error::Malformed("alg: none is never accepted".into()));
    }
    if !header.crit.is_empty() {
        return Err(Error::UnsupportedCritical(header.crit.join(", ")));
    }
    let protected = signature
        .protected
        .as_ref()
        .expect("merged_header already rejected a missing protected header");
    let signing_input = signing_input(protected, payload);

    let criteria = jose_jwa::registry::signing_key_criteria(header.alg);
    let candidates: Vec<&Jwk> = match &header.kid {
        Some(kid) => keys.select(&criteria, Some(kid)).into_iter().collect(),
        None => keys.select_all(&criteria).collect(),
    };
    if candidates.is_empty() {
        return Err(Error::KeyNotFound);
    }

    let verified = candidates.iter().any(|key| {
        jose_jwa::verify(
            header.alg,
            &key.key,
            signing_input.as_bytes(),
            signature.signature.as_ref(),
        )
        .is_ok()
    });
    if verified {
        Ok(())
    } else {
        Err(Error::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use jose_b64::B64Secret;
    use jose_jwk::{Key, Oct, SigningAlg};

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
    fn flattened_roundtrips() {
        let key = hs256_jwk();
        let header = Header::new(SigningAlg::Hs256);
        let jws = produce_flattened(&header, b"hello", &key).unwrap();

        let mut set = JwkSet::new();
        set.add(key).unwrap();

        let (parsed_header, payload) = consume_flattened(&jws, &set).unwrap();
        assert_eq!(parsed_header.alg, SigningAlg::Hs256);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn general_succeeds_if_any_signature_verifies() {
        let key_a = hs256_jwk();
        let mut key_b = hs256_jwk();
        key_b.params.kid = Some("b".into());

        let header_a = Header::new(SigningAlg::Hs256);
        let header_b = Header::new(SigningAlg::Hs256).with_kid("b");

        let mut jws =
            produce_general(b"hello", &[(header_a, &key_a), (header_b, &key_b)]).unwrap();
        // Corrupt the first signature; only the second (key_b) is in the set,
        // so the first can never verify against it either -- the point is
        // that one surviving signature is still enough.
        let corrupt = jws.signatures[0].signature.as_ref().to_vec();
        let mut corrupt = corrupt;
        corrupt[0] ^= 0xFF;
        jws.signatures[0].signature = B64Bytes::new(corrupt);

        let mut set = JwkSet::new();
        set.add(key_b).unwrap();

        let (header, payload) = consume_general(&jws, &set).unwrap();
        assert_eq!(header.kid.as_deref(), Some("b"));
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn general_rejects_if_every_signature_fails() {
        let key_a = hs256_jwk();
        let mut set = JwkSet::new();
        set.add(key_a.clone()).unwrap();

        let header_a = Header::new(SigningAlg::Hs256);
        let mut jws = produce_general(b"hello", &[(header_a, &key_a)]).unwrap();
        let corrupt = jws.signatures[0].signature.as_ref().to_vec();
        let mut corrupt = corrupt;
        corrupt[0] ^= 0xFF;
        jws.signatures[0].signature = B64Bytes::new(corrupt);

        assert!(matches!(
            consume_general(&jws, &set),
            Err(Error::VerificationFailed)
        ));
    }
}
