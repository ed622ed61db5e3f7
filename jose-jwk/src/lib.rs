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
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

mod algorithm;
pub mod error;
mod key;
#[cfg(feature = "pem")]
mod pem;
pub mod select;
mod thumbprint;

use alloc::{boxed::Box, collections::BTreeSet, string::String, vec::Vec};
use jose_b64::{base64ct::Base64, B64Bytes};
use serde::{Deserialize, Serialize};

pub use algorithm::{Algorithm, EncryptionAlg, KeyMgmtAlg, SigningAlg};
pub use error::KeyError;
pub use key::{Ec, EcCurve, Key, Oct, Okp, OkpCurve, Rsa, RsaOtherPrimes, RsaPrivate};
pub use select::{Criteria, Requirement};

extern crate alloc;

/// Strongly typed JWK
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    /// The key itself. This field contains the important information, all other
    /// top-level fields are
    #[serde(flatten)]
    pub key: Key,

    #[serde(flatten)]
    pub params: Parameters,
}

impl Jwk {
    /// Create a new JWK from a key, using default parameters
    pub fn new(key: Key) -> Self {
        Self {
            key,
            params: Default::default(),
        }
    }

    /// The RFC7638 thumbprint of this key's canonical form.
    pub fn thumbprint(&self) -> String {
        thumbprint::thumbprint(&self.key)
    }

    /// Set `kid` to this key's thumbprint if it is not already set.
    ///
    /// Idempotent: calling this twice leaves `kid` unchanged the second
    /// time, since the thumbprint is a pure function of the key material.
    pub fn complete_kid(&mut self) {
        if self.params.kid.is_none() {
            self.params.kid = Some(self.thumbprint());
        }
    }
}

#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// The algorithm used with this key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alg: Option<Algorithm>,

    /// Identifier of this key
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kid: Option<String>,

    /// Intended use of this public key (named `use` in the rfc)
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub use_for: Option<UseFor>,

    /// Intended operations for this key; optional
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub key_ops: BTreeSet<Operations>,

    /// X.509 options
    #[serde(flatten)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x509: Option<Box<X509>>,
}

/// Additional X.509 options for a JWK
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct X509 {
    /// The URL of the X.509 certificate associated with this key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[cfg(feature = "url")]
    pub x5u: Option<url::Url>,

    /// The X.509 certificate associated with this key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x5c: Option<Vec<B64Bytes<Box<[u8]>, Base64>>>, // base64, not base64url

    /// An X.509 thumbprint (SHA-1).
    #[serde(skip_serializing_if = "Option::is_none", rename = "x5t", default)]
    pub x5t: Option<B64Bytes<[u8; 20]>>,

    /// An X.509 thumbprint (SHA-2 256).
    #[serde(skip_serializing_if = "Option::is_none", rename = "x5t#S256", default)]
    pub x5t_s256: Option<B64Bytes<[u8; 32]>>,
}

/// A set of JSON Web Keys.
///
/// This type is defined in [RFC7517 Section 5].
///
/// [RFC7517 Section 5]: https://datatracker.ietf.org/doc/html/rfc7517#section-5
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JwkSet {
    /// The keys in the set.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// An empty key set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key to the set.
    ///
    /// Keys without a `kid` may coexist freely (a consumer then tries every
    /// candidate in turn); a `kid` present on an incoming key must not
    /// collide with one already in the set.
    pub fn add(&mut self, key: Jwk) -> Result<(), KeyError> {
        if let Some(kid) = &key.params.kid {
            if self
                .keys
                .iter()
                .any(|existing| existing.params.kid.as_deref() == Some(kid.as_str()))
            {
                return Err(KeyError::DuplicateKid(kid.clone()));
            }
        }
        self.keys.push(key);
        Ok(())
    }

    /// Remove every key with the given `kid`, returning how many were removed.
    pub fn remove(&mut self, kid: &str) -> usize {
        let before = self.keys.len();
        self.keys
            .retain(|key| key.params.kid.as_deref() != Some(kid));
        before - self.keys.len()
    }
}

/// Intended use of this key
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum UseFor {
    /// The key should be used for encryption
    #[serde(rename = "enc")]
    Encryption,
    /// The key should be used for signing
    #[serde(rename = "sig")]
    Signing,
}

/// Possible values for `key_ops`, specified in RFC7517 section 4.3.
// NOTE: Keep in lexicographical order for BTreeSet
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operations {
    /// Decrypt content and validate decryption, if applicable
    Decrypt,
    /// Derive bits not to be used as a key
    DeriveBits,
    /// Derive key
    DeriveKey,
    /// Encrypt key
    Encrypt,
    /// Compute digital signature or MAC
    Sign,
    /// Decrypt key and validate decryption, if applicable
    UnwrapKey,
    /// Verify digital signature or MAC
    Verify,
    /// Encrypt content
    WrapKey,
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::key::Oct;

    fn oct_key(bytes: &[u8]) -> Jwk {
        Jwk::new(Key::Oct(Oct {
            k: jose_b64::B64Secret::new(bytes.to_vec()),
        }))
    }

    #[test]
    fn rejects_duplicate_kid() {
        let mut set = JwkSet::new();
        let mut a = oct_key(b"key-a");
        a.params.kid = Some(String::from("1"));
        let mut b = oct_key(b"key-b");
        b.params.kid = Some(String::from("1"));

        set.add(a).unwrap();
        assert!(matches!(set.add(b), Err(KeyError::DuplicateKid(kid)) if kid == "1"));
    }

    #[test]
    fn allows_multiple_keys_without_kid() {
        let mut set = JwkSet::new();
        set.add(oct_key(b"key-a")).unwrap();
        set.add(oct_key(b"key-b")).unwrap();
        assert_eq!(set.keys.len(), 2);

        assert_eq!(set.remove("nonexistent"), 0);
    }

    #[test]
    fn complete_kid_is_idempotent_and_thumbprint_derived() {
        let mut key = oct_key(b"01234567890123456789012345678901");
        assert!(key.params.kid.is_none());

        key.complete_kid();
        let kid = key.params.kid.clone().unwrap();
        assert_eq!(kid, key.thumbprint());

        key.complete_kid();
        assert_eq!(key.params.kid, Some(kid));
    }
}
