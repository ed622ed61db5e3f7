use alloc::{string::String, vec::Vec};
use jose_b64::B64Bytes;
use jose_jwk::{EncryptionAlg, Key, KeyMgmtAlg};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JOSE header, as shared between the protected, shared-unprotected, and
/// per-recipient-unprotected halves of a JWE (RFC7516 §4).
///
/// Every field is optional at the type level, even `alg`/`enc`, because
/// which half of a JSON-serialized JWE a given parameter lives in is a
/// per-message choice (RFC7516 §4.2/4.3): the compact serialization puts
/// everything here, while a multi-recipient JSON serialization might split
/// `enc` into the shared protected header and `alg`/`epk`/... into each
/// recipient's own unprotected header. [`Header::merge`] combines the
/// pieces back into one effective header for a given recipient.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Key management algorithm used to determine the Content Encryption Key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alg: Option<KeyMgmtAlg>,

    /// Content encryption algorithm.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub enc: Option<EncryptionAlg>,

    /// Key ID: which key in a [`jose_jwk::JwkSet`] this recipient's entry
    /// was encrypted to.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kid: Option<String>,

    /// Ephemeral public key, for ECDH-ES and its key-wrapping variants
    /// (RFC7518 §4.6.1.1).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub epk: Option<Key>,

    /// Agreement PartyUInfo, for ECDH-ES (RFC7518 §4.6.1.2).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub apu: Option<B64Bytes>,

    /// Agreement PartyVInfo, for ECDH-ES (RFC7518 §4.6.1.3).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub apv: Option<B64Bytes>,

    /// Initialization Vector, for `A{128,192,256}GCMKW` (RFC7518 §4.7.1.1).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iv: Option<B64Bytes<[u8; 12]>>,

    /// Authentication Tag, for `A{128,192,256}GCMKW` (RFC7518 §4.7.1.2).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tag: Option<B64Bytes<[u8; 16]>>,

    /// PBES2 salt input, for `PBES2-*` (RFC7518 §4.8.1.1).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub p2s: Option<B64Bytes>,

    /// PBES2 iteration count, for `PBES2-*` (RFC7518 §4.8.1.2).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub p2c: Option<u32>,

    /// Declared media type of the complete JWE (`typ`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub typ: Option<String>,

    /// Declared media type of the plaintext (`cty`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cty: Option<String>,

    /// Header parameters that a consumer must understand and process, or
    /// else reject the JWE outright (RFC7516 §4.1.13). This implementation
    /// understands none, so any non-empty `crit` is always rejected.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub crit: Vec<String>,

    /// Any other header parameter, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Header {
    /// A header naming only the key management and content encryption
    /// algorithms.
    pub fn new(alg: KeyMgmtAlg, enc: EncryptionAlg) -> Self {
        Self {
            alg: Some(alg),
            enc: Some(enc),
            ..Self::default()
        }
    }

    /// Set `kid`, builder-style.
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Combine this header with `other`, preferring `self`'s value for any
    /// field both set. Used to compute the effective header seen by a given
    /// recipient of a JSON-serialized JWE: `protected.merge(&shared).merge(&
    /// per_recipient)` in increasing specificity, or any subset thereof.
    pub fn merge(&self, other: &Header) -> Header {
        Header {
            alg: self.alg.or(other.alg),
            enc: self.enc.or(other.enc),
            kid: self.kid.clone().or_else(|| other.kid.clone()),
            epk: self.epk.clone().or_else(|| other.epk.clone()),
            apu: self.apu.clone().or_else(|| other.apu.clone()),
            apv: self.apv.clone().or_else(|| other.apv.clone()),
            iv: self.iv.clone().or_else(|| other.iv.clone()),
            tag: self.tag.clone().or_else(|| other.tag.clone()),
            p2s: self.p2s.clone().or_else(|| other.p2s.clone()),
            p2c: self.p2c.or(other.p2c),
            typ: self.typ.clone().or_else(|| other.typ.clone()),
            cty: self.cty.clone().or_else(|| other.cty.clone()),
            crit: if self.crit.is_empty() {
                other.crit.clone()
            } else {
                self.crit.clone()
            },
            extra: {
                let mut extra = other.extra.clone();
                extra.extend(self.extra.clone());
                extra
            },
        }
    }
}
