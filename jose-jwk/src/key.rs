use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use jose_b64::{B64Bytes, B64Secret};

/// A key type suitable for use in a JWK, per RFC7517 / RFC7518 §6.
///
/// Public and private material share a single variant per key type: a key
/// that carries only the public fields is a public key, one that also
/// carries its type's private field(s) is a private (or symmetric, which has
/// no public/private distinction) key. This mirrors how the wire format
/// itself works -- there is no separate "this is a private key" tag, only
/// the presence or absence of `d` (and friends).
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", tag = "kty")]
pub enum Key {
    /// An elliptic curve key (RFC7518 §6.2)
    Ec(Ec),
    /// An RSA key (RFC7518 §6.3)
    Rsa(Rsa),
    /// A symmetric key (RFC7518 §6.4)
    #[serde(rename = "oct")]
    Oct(Oct),
    /// An octet key pair: Ed25519/Ed448/X25519/X448 (RFC8037)
    #[serde(rename = "OKP")]
    Okp(Okp),
}

impl Key {
    /// Whether this key carries private material (or, for [`Oct`], any
    /// material at all -- a symmetric key is always "private").
    pub fn is_private(&self) -> bool {
        match self {
            Key::Ec(k) => k.d.is_some(),
            Key::Rsa(k) => k.private.is_some(),
            Key::Oct(_) => true,
            Key::Okp(k) => k.d.is_some(),
        }
    }
}

impl From<Ec> for Key {
    fn from(key: Ec) -> Self {
        Self::Ec(key)
    }
}

impl From<Rsa> for Key {
    fn from(key: Rsa) -> Self {
        Self::Rsa(key)
    }
}

impl From<Oct> for Key {
    fn from(key: Oct) -> Self {
        Self::Oct(key)
    }
}

impl From<Okp> for Key {
    fn from(key: Okp) -> Self {
        Self::Okp(key)
    }
}

/// An elliptic curve key, public or private.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ec {
    /// DSS curve identifier
    pub crv: EcCurve,

    /// X coordinate for the elliptic curve point
    pub x: B64Bytes,

    /// Y coordinate for the elliptic curve point
    pub y: B64Bytes,

    /// Private scalar; present iff this is a private key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub d: Option<B64Secret>,
}

/// An elliptic curve DSS identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EcCurve {
    /// P-256
    #[serde(rename = "P-256")]
    P256,

    /// P-384
    #[serde(rename = "P-384")]
    P384,

    /// P-521
    #[serde(rename = "P-521")]
    P521,

    /// secp256k1
    #[serde(rename = "secp256k1")]
    P256K,
}

impl EcCurve {
    /// Coordinate width in bytes for this curve (RFC7518 §6.2.1.2/6.2.1.3 and
    /// the fixed-width JWS ECDSA signature encoding of RFC7518 §3.4).
    pub const fn coordinate_len(self) -> usize {
        match self {
            EcCurve::P256 | EcCurve::P256K => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }
}

/// An RSA key, public or private.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rsa {
    /// RSA modulus parameter
    pub n: B64Bytes,

    /// RSA public exponent parameter
    pub e: B64Bytes,

    /// Private material; present iff this is a private key.
    #[serde(flatten)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub private: Option<RsaPrivate>,
}

/// RSA private key material (RFC7518 §6.3.2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaPrivate {
    /// Private key exponent.
    pub d: B64Secret,

    /// Private first prime factor.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub p: Option<B64Secret>,

    /// Private second prime factor.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub q: Option<B64Secret>,

    /// Private first factor CRT exponent.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dp: Option<B64Secret>,

    /// Private second factor CRT exponent.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dq: Option<B64Secret>,

    /// Private first CRT coefficient.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub qi: Option<B64Secret>,

    /// Additional RSA private primes, for keys with more than two factors.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub oth: Vec<RsaOtherPrimes>,
}

/// One additional RSA private prime, beyond the first two (RFC7518 §6.3.2.7).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaOtherPrimes {
    /// A private prime factor
    pub r: B64Secret,

    /// A private factor CRT exponent
    pub d: B64Secret,

    /// A private factor CRT coefficient
    pub t: B64Secret,
}

/// A symmetric octet-sequence key (RFC7518 §6.4).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oct {
    /// The symmetric key material.
    pub k: B64Secret,
}

/// An octet key pair: Ed25519, Ed448, X25519 or X448 (RFC8037).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Okp {
    /// The subtype of key pair.
    pub crv: OkpCurve,

    /// The public key, the curve's standard encoding (RFC8032/RFC7748).
    pub x: B64Bytes,

    /// The private key; present iff this is a private key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub d: Option<B64Secret>,
}

/// The subtype of an [`Okp`] key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum OkpCurve {
    /// Ed25519 signature algorithm key pairs
    Ed25519,
    /// Ed448 signature algorithm key pairs (recognized, not implemented --
    /// see crate-level docs)
    Ed448,
    /// X25519 function key pairs
    X25519,
    /// X448 function key pairs (recognized, not implemented)
    X448,
}

impl OkpCurve {
    /// Whether this curve has a handler wired up in `jose-jwa`.
    pub const fn is_implemented(self) -> bool {
        matches!(self, OkpCurve::Ed25519 | OkpCurve::X25519)
    }
}
