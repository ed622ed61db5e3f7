//! PEM / DER conversion between [`crate::Key`] and the standard RSA and EC
//! key encodings: PKCS#1 or SubjectPublicKeyInfo/PKCS#8 for RSA, SEC1 or
//! PKCS#8 for EC (spec §6). X.509 certificate chains are out of scope; only
//! bare keys are handled.
//!
//! Conversion here is pure byte-shuffling between ASN.1 DER and base64url:
//! RSA's `n`/`e`/`d`/... and an EC point's `x`/`y`/`d` are already
//! fixed-width big-endian integers on both sides of the wire, so no
//! big-integer arithmetic is needed -- see the design notes on this in
//! `DESIGN.md`.

use alloc::{string::ToString, vec::Vec};

use der::{asn1::UintRef, Decode, Encode};
use pkcs1::{RsaPrivateKey as Pkcs1PrivateKey, RsaPublicKey as Pkcs1PublicKey};
use pkcs8::{PrivateKeyInfo, SubjectPublicKeyInfoRef};
use sec1::EcPrivateKey;

use crate::{
    error::KeyError,
    key::{Ec, EcCurve, Rsa, RsaOtherPrimes, RsaPrivate},
    Key,
};
use jose_b64::{B64Bytes, B64Secret};

/// OID for `rsaEncryption` (PKCS#1), used in a PKCS#8/SPKI `AlgorithmIdentifier`.
const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
/// OID for `id-ecPublicKey`.
const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
/// Curve OIDs, used as the SEC1/PKCS8 `parameters` of an EC key.
const OID_P256: &str = "1.2.840.10045.3.1.7";
const OID_P384: &str = "1.3.132.0.34";
const OID_P521: &str = "1.3.132.0.35";

impl Key {
    /// Parse a PEM-encoded RSA or EC key (PKCS#1, SEC1, or PKCS#8, public or
    /// private) into a [`Key`].
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let (label, der_bytes) =
            der::pem::decode_vec(pem.as_bytes()).map_err(|e| KeyError::Encoding(e.to_string()))?;
        match label {
            "RSA PRIVATE KEY" => rsa_from_pkcs1_private(&der_bytes),
            "RSA PUBLIC KEY" => rsa_from_pkcs1_public(&der_bytes),
            "EC PRIVATE KEY" => ec_from_sec1(&der_bytes),
            "PRIVATE KEY" => key_from_pkcs8(&der_bytes),
            "PUBLIC KEY" => key_from_spki(&der_bytes),
            other => Err(KeyError::Encoding(alloc::format!("unsupported PEM label {other}"))),
        }
    }

    /// Emit this key as a PEM-encoded document, using PKCS#1 for RSA and
    /// SEC1 for EC private keys, and SubjectPublicKeyInfo for public keys.
    pub fn to_pem(&self) -> Result<alloc::string::String, KeyError> {
        match self {
            Key::Rsa(rsa) => rsa_to_pem(rsa),
            Key::Ec(ec) => ec_to_pem(ec),
            _ => Err(KeyError::UnsupportedForPem),
        }
    }
}

fn rsa_from_pkcs1_private(der_bytes: &[u8]) -> Result<Key, KeyError> {
    let key = Pkcs1PrivateKey::from_der(der_bytes).map_err(|e| KeyError::Encoding(e.to_string()))?;
    Ok(Key::Rsa(Rsa {
        n: B64Bytes::from(key.modulus.as_bytes().to_vec()),
        e: B64Bytes::from(key.public_exponent.as_bytes().to_vec()),
        private: Some(RsaPrivate {
            d: B64Secret::new(key.private_exponent.as_bytes().to_vec()),
            p: Some(B64Secret::new(key.prime1.as_bytes().to_vec())),
            q: Some(B64Secret::new(key.prime2.as_bytes().to_vec())),
            dp: Some(B64Secret::new(key.exponent1.as_bytes().to_vec())),
            dq: Some(B64Secret::new(key.exponent2.as_bytes().to_vec())),
            qi: Some(B64Secret::new(key.coefficient.as_bytes().to_vec())),
            oth: Vec::new(),
        }),
    }))
}

fn rsa_from_pkcs1_public(der_bytes: &[u8]) -> Result<Key, KeyError> {
    let key = Pkcs1PublicKey::from_der(der_bytes).map_err(|e| KeyError::Encoding(e.to_string()))?;
    Ok(Key::Rsa(Rsa {
        n: B64Bytes::from(key.modulus.as_bytes().to_vec()),
        e: B64Bytes::from(key.public_exponent.as_bytes().to_vec()),
        private: None,
    }))
}

fn ec_from_sec1(der_bytes: &[u8]) -> Result<Key, KeyError> {
    let key = EcPrivateKey::from_der(der_bytes).map_err(|e| KeyError::Encoding(e.to_string()))?;
    let oid = key
        .parameters
        .ok_or_else(|| KeyError::Encoding("SEC1 key missing curve parameters".into()))?
        .named_curve()
        .ok_or_else(|| KeyError::Encoding("SEC1 key parameters are not a named curve".into()))?;
    let crv = curve_from_oid(&oid.to_string())?;
    let public = key
        .public_key
        .ok_or_else(|| KeyError::Encoding("SEC1 key missing public point".into()))?;
    let (x, y) = split_uncompressed_point(public, crv)?;
    Ok(Key::Ec(Ec {
        crv,
        x: B64Bytes::from(x),
        y: B64Bytes::from(y),
        d: Some(B64Secret::new(key.private_key.to_vec())),
    }))
}

fn key_from_pkcs8(der_bytes: &[u8]) -> Result<Key, KeyError> {
    let info = PrivateKeyInfo::from_der(der_bytes).map_err(|e| KeyError::Encoding(e.to_string()))?;
    let oid = info.algorithm.oid.to_string();
    if oid == OID_RSA_ENCRYPTION {
        rsa_from_pkcs1_private(info.private_key)
    } else if oid == OID_EC_PUBLIC_KEY {
        // the private key octets inside PKCS#8 are themselves a SEC1
        // ECPrivateKey SEQUENCE, minus the curve OID (carried in the
        // PKCS#8 AlgorithmIdentifier parameters instead)
        let inner = EcPrivateKey::from_der(info.private_key).map_err(|e| KeyError::Encoding(e.to_string()))?;
        let params = info
            .algorithm
            .parameters
            .ok_or_else(|| KeyError::Encoding("PKCS#8 EC key missing curve parameters".into()))?;
        let oid = params
            .decode_as::<der::asn1::ObjectIdentifier>()
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let crv = curve_from_oid(&oid.to_string())?;
        let public = inner
            .public_key
            .ok_or_else(|| KeyError::Encoding("PKCS#8 EC key missing public point".into()))?;
        let (x, y) = split_uncompressed_point(public, crv)?;
        Ok(Key::Ec(Ec {
            crv,
            x: B64Bytes::from(x),
            y: B64Bytes::from(y),
            d: Some(B64Secret::new(inner.private_key.to_vec())),
        }))
    } else {
        Err(KeyError::Encoding(alloc::format!("unsupported PKCS#8 algorithm OID {oid}")))
    }
}

fn key_from_spki(der_bytes: &[u8]) -> Result<Key, KeyError> {
    let info = SubjectPublicKeyInfoRef::from_der(der_bytes).map_err(|e| KeyError::Encoding(e.to_string()))?;
    let oid = info.algorithm.oid.to_string();
    let bits = info
        .subject_public_key
        .as_bytes()
        .ok_or_else(|| KeyError::Encoding("SPKI BIT STRING is not byte-aligned".into()))?;
    if oid == OID_RSA_ENCRYPTION {
        rsa_from_pkcs1_public(bits)
    } else if oid == OID_EC_PUBLIC_KEY {
        let params = info
            .algorithm
            .parameters
            .ok_or_else(|| KeyError::Encoding("SPKI EC key missing curve parameters".into()))?;
        let oid = params
            .decode_as::<der::asn1::ObjectIdentifier>()
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let crv = curve_from_oid(&oid.to_string())?;
        let (x, y) = split_uncompressed_point(bits, crv)?;
        Ok(Key::Ec(Ec {
            crv,
            x: B64Bytes::from(x),
            y: B64Bytes::from(y),
            d: None,
        }))
    } else {
        Err(KeyError::Encoding(alloc::format!("unsupported SPKI algorithm OID {oid}")))
    }
}

fn rsa_to_pem(rsa: &Rsa) -> Result<alloc::string::String, KeyError> {
    use der::pem::PemLabel;
    let n = UintRef::new(rsa.n.as_ref()).map_err(|e| KeyError::Encoding(e.to_string()))?;
    let e = UintRef::new(rsa.e.as_ref()).map_err(|e| KeyError::Encoding(e.to_string()))?;
    let der_bytes = if let Some(priv_key) = &rsa.private {
        let d = UintRef::new(priv_key.d.as_bytes()).map_err(|e| KeyError::Encoding(e.to_string()))?;
        let p = UintRef::new(priv_key.p.as_ref().map(B64Secret::as_bytes).unwrap_or(&[]))
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let q = UintRef::new(priv_key.q.as_ref().map(B64Secret::as_bytes).unwrap_or(&[]))
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let dp = UintRef::new(priv_key.dp.as_ref().map(B64Secret::as_bytes).unwrap_or(&[]))
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let dq = UintRef::new(priv_key.dq.as_ref().map(B64Secret::as_bytes).unwrap_or(&[]))
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let qi = UintRef::new(priv_key.qi.as_ref().map(B64Secret::as_bytes).unwrap_or(&[]))
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        Pkcs1PrivateKey {
            modulus: n,
            public_exponent: e,
            private_exponent: d,
            prime1: p,
            prime2: q,
            exponent1: dp,
            exponent2: dq,
            coefficient: qi,
            other_prime_infos: None,
        }
        .to_der()
        .map_err(|e| KeyError::Encoding(e.to_string()))?
    } else {
        Pkcs1PublicKey {
            modulus: n,
            public_exponent: e,
        }
        .to_der()
        .map_err(|e| KeyError::Encoding(e.to_string()))?
    };
    let label = if rsa.private.is_some() {
        Pkcs1PrivateKey::PEM_LABEL
    } else {
        Pkcs1PublicKey::PEM_LABEL
    };
    der::pem::encode_string(label, Default::default(), &der_bytes)
        .map_err(|e| KeyError::Encoding(e.to_string()))
}

fn ec_to_pem(ec: &Ec) -> Result<alloc::string::String, KeyError> {
    let oid_str = match ec.crv {
        EcCurve::P256 => OID_P256,
        EcCurve::P384 => OID_P384,
        EcCurve::P521 => OID_P521,
        EcCurve::P256K => return Err(KeyError::UnsupportedForPem),
    };
    let oid: der::asn1::ObjectIdentifier =
        oid_str.parse().map_err(|_| KeyError::Encoding("bad curve OID".into()))?;
    let mut point = alloc::vec![0x04u8];
    point.extend_from_slice(ec.x.as_ref());
    point.extend_from_slice(ec.y.as_ref());

    let Some(d) = &ec.d else {
        return Err(KeyError::UnsupportedForPem);
    };
    let private = EcPrivateKey {
        private_key: d.as_bytes(),
        parameters: Some(sec1::EcParameters::NamedCurve(oid)),
        public_key: Some(&point),
    };
    let der_bytes = private.to_der().map_err(|e| KeyError::Encoding(e.to_string()))?;
    use der::pem::PemLabel;
    der::pem::encode_string(EcPrivateKey::PEM_LABEL, Default::default(), &der_bytes)
        .map_err(|e| KeyError::Encoding(e.to_string()))
}

fn curve_from_oid(oid: &str) -> Result<EcCurve, KeyError> {
    match oid {
        OID_P256 => Ok(EcCurve::P256),
        OID_P384 => Ok(EcCurve::P384),
        OID_P521 => Ok(EcCurve::P521),
        other => Err(KeyError::Encoding(alloc::format!("unsupported curve OID {other}"))),
    }
}

/// Split an uncompressed SEC1 point (`0x04 || X || Y`) into its coordinates.
fn split_uncompressed_point(point: &[u8], crv: EcCurve) -> Result<(Vec<u8>, Vec<u8>), KeyError> {
    let n = crv.coordinate_len();
    if point.len() != 1 + 2 * n || point[0] != 0x04 {
        return Err(KeyError::Encoding("expected uncompressed EC point".into()));
    }
    Ok((point[1..1 + n].to_vec(), point[1 + n..1 + 2 * n].to_vec()))
}
