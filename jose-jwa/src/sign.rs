//! Signing algorithm handlers: HMAC, RSASSA-PKCS1-v1_5, RSASSA-PSS, ECDSA,
//! EdDSA (RFC7518 §3).

use alloc::{format, string::ToString, vec::Vec};
use hmac::{Hmac, Mac};
use jose_jwk::{Key, SigningAlg};
use sha2::{Sha256, Sha384, Sha512};

use crate::error::HandlerError;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Compute the signature/MAC for `signing_input` (`ASCII(BASE64URL(header))
/// || '.' || ASCII(BASE64URL(payload))`, per RFC7515 §5.1) using `key`.
pub fn sign(alg: SigningAlg, key: &Key, signing_input: &[u8]) -> Result<Vec<u8>, HandlerError> {
    match alg {
        SigningAlg::Hs256 => hmac_sign::<HmacSha256>(key, signing_input),
        SigningAlg::Hs384 => hmac_sign::<HmacSha384>(key, signing_input),
        SigningAlg::Hs512 => hmac_sign::<HmacSha512>(key, signing_input),
        #[cfg(feature = "rsa")]
        SigningAlg::Rs256 => rsa_pkcs1_sign::<Sha256>(key, signing_input),
        #[cfg(feature = "rsa")]
        SigningAlg::Rs384 => rsa_pkcs1_sign::<Sha384>(key, signing_input),
        #[cfg(feature = "rsa")]
        SigningAlg::Rs512 => rsa_pkcs1_sign::<Sha512>(key, signing_input),
        #[cfg(feature = "rsa")]
        SigningAlg::Ps256 => rsa_pss_sign::<Sha256>(key, signing_input),
        #[cfg(feature = "rsa")]
        SigningAlg::Ps384 => rsa_pss_sign::<Sha384>(key, signing_input),
        #[cfg(feature = "rsa")]
        SigningAlg::Ps512 => rsa_pss_sign::<Sha512>(key, signing_input),
        #[cfg(feature = "p256")]
        SigningAlg::Es256 => ecdsa_p256_sign(key, signing_input),
        #[cfg(feature = "p384")]
        SigningAlg::Es384 => ecdsa_p384_sign(key, signing_input),
        #[cfg(feature = "p521")]
        SigningAlg::Es512 => ecdsa_p521_sign(key, signing_input),
        #[cfg(feature = "eddsa")]
        SigningAlg::EdDsa => eddsa_sign(key, signing_input),
        SigningAlg::None => Err(HandlerError::Unsupported("none".to_string())),
        #[allow(unreachable_patterns)]
        other => Err(HandlerError::Unsupported(other.to_string())),
    }
}

/// Verify `signature` over `signing_input` using `key`. Always fails closed:
/// an unsupported or mismatched algorithm is a verification failure, never a
/// silent success.
pub fn verify(
    alg: SigningAlg,
    key: &Key,
    signing_input: &[u8],
    signature: &[u8],
) -> Result<(), HandlerError> {
    match alg {
        SigningAlg::Hs256 => hmac_verify::<HmacSha256>(key, signing_input, signature),
        SigningAlg::Hs384 => hmac_verify::<HmacSha384>(key, signing_input, signature),
        SigningAlg::Hs512 => hmac_verify::<HmacSha512>(key, signing_input, signature),
        #[cfg(feature = "rsa")]
        SigningAlg::Rs256 => rsa_pkcs1_verify::<Sha256>(key, signing_input, signature),
        #[cfg(feature = "rsa")]
        SigningAlg::Rs384 => rsa_pkcs1_verify::<Sha384>(key, signing_input, signature),
        #[cfg(feature = "rsa")]
        SigningAlg::Rs512 => rsa_pkcs1_verify::<Sha512>(key, signing_input, signature),
        #[cfg(feature = "rsa")]
        SigningAlg::Ps256 => rsa_pss_verify::<Sha256>(key, signing_input, signature),
        #[cfg(feature = "rsa")]
        SigningAlg::Ps384 => rsa_pss_verify::<Sha384>(key, signing_input, signature),
        #[cfg(feature = "rsa")]
        SigningAlg::Ps512 => rsa_pss_verify::<Sha512>(key, signing_input, signature),
        #[cfg(feature = "p256")]
        SigningAlg::Es256 => ecdsa_p256_verify(key, signing_input, signature),
        #[cfg(feature = "p384")]
        SigningAlg::Es384 => ecdsa_p384_verify(key, signing_input, signature),
        #[cfg(feature = "p521")]
        SigningAlg::Es512 => ecdsa_p521_verify(key, signing_input, signature),
        #[cfg(feature = "eddsa")]
        SigningAlg::EdDsa => eddsa_verify(key, signing_input, signature),
        // "none" is a recognized identifier but this core never accepts it:
        // a caller must opt in explicitly at a layer above, if ever.
        SigningAlg::None => Err(HandlerError::VerificationFailed),
        #[allow(unreachable_patterns)]
        _ => Err(HandlerError::VerificationFailed),
    }
}

fn oct_bytes(key: &Key) -> Result<&[u8], HandlerError> {
    match key {
        Key::Oct(oct) => Ok(oct.k.as_bytes()),
        _ => Err(HandlerError::KeyMismatch("expected a symmetric (oct) key".into())),
    }
}

fn hmac_sign<M: Mac + hmac::digest::KeyInit>(key: &Key, signing_input: &[u8]) -> Result<Vec<u8>, HandlerError> {
    let mut mac =
        M::new_from_slice(oct_bytes(key)?).map_err(|e| HandlerError::Library(format!("{e}")))?;
    mac.update(signing_input);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_verify<M: Mac + hmac::digest::KeyInit>(
    key: &Key,
    signing_input: &[u8],
    signature: &[u8],
) -> Result<(), HandlerError> {
    let expected = hmac_sign::<M>(key, signing_input)?;
    if jose_b64::ct_eq(&expected, signature) {
        Ok(())
    } else {
        Err(HandlerError::VerificationFailed)
    }
}

#[cfg(feature = "rsa")]
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
    for other in &private.oth {
        primes.push(rsa::BigUint::from_bytes_be(other.r.as_bytes()));
    }
    rsa::RsaPrivateKey::from_components(n, e, d, primes)
        .map_err(|e| HandlerError::Library(format!("invalid RSA private key: {e}")))
}

#[cfg(feature = "rsa")]
fn rsa_public_key(key: &Key) -> Result<rsa::RsaPublicKey, HandlerError> {
    let Key::Rsa(rsa_key) = key else {
        return Err(HandlerError::KeyMismatch("expected an RSA key".into()));
    };
    let n = rsa::BigUint::from_bytes_be(rsa_key.n.as_ref());
    let e = rsa::BigUint::from_bytes_be(rsa_key.e.as_ref());
    rsa::RsaPublicKey::new(n, e).map_err(|e| HandlerError::Library(format!("invalid RSA public key: {e}")))
}

#[cfg(feature = "rsa")]
fn rsa_pkcs1_sign<D>(key: &Key, signing_input: &[u8]) -> Result<Vec<u8>, HandlerError>
where
    D: digest::Digest + rsa::pkcs1v15::RsaSignatureAssociatedOid,
{
    use rsa::signature::Signer;
    let private = rsa_private_key(key)?;
    let signing_key = rsa::pkcs1v15::SigningKey::<D>::new(private);
    Ok(signing_key
        .try_sign(signing_input)
        .map_err(|e| HandlerError::Library(format!("{e}")))?
        .to_vec())
}

#[cfg(feature = "rsa")]
fn rsa_pkcs1_verify<D>(key: &Key, signing_input: &[u8], signature: &[u8]) -> Result<(), HandlerError>
where
    D: digest::Digest + rsa::pkcs1v15::RsaSignatureAssociatedOid,
{
    use rsa::signature::Verifier;
    let public = rsa_public_key(key)?;
    let verifying_key = rsa::pkcs1v15::VerifyingKey::<D>::new(public);
    let sig = rsa::pkcs1v15::Signature::try_from(signature)
        .map_err(|_| HandlerError::VerificationFailed)?;
    verifying_key
        .verify(signing_input, &sig)
        .map_err(|_| HandlerError::VerificationFailed)
}

#[cfg(feature = "rsa")]
fn rsa_pss_sign<D>(key: &Key, signing_input: &[u8]) -> Result<Vec<u8>, HandlerError>
where
    D: digest::Digest + digest::FixedOutputReset,
{
    use rsa::signature::RandomizedSigner;
    let private = rsa_private_key(key)?;
    let signing_key = rsa::pss::SigningKey::<D>::new(private);
    let mut rng = rand_from_jose_b64();
    Ok(signing_key
        .try_sign_with_rng(&mut rng, signing_input)
        .map_err(|e| HandlerError::Library(format!("{e}")))?
        .to_vec())
}

#[cfg(feature = "rsa")]
fn rsa_pss_verify<D>(key: &Key, signing_input: &[u8], signature: &[u8]) -> Result<(), HandlerError>
where
    D: digest::Digest + digest::FixedOutputReset,
{
    use rsa::signature::Verifier;
    let public = rsa_public_key(key)?;
    let verifying_key = rsa::pss::VerifyingKey::<D>::new(public);
    let sig = rsa::pss::Signature::try_from(signature).map_err(|_| HandlerError::VerificationFailed)?;
    verifying_key
        .verify(signing_input, &sig)
        .map_err(|_| HandlerError::VerificationFailed)
}

/// A CSPRNG adapter so the RSA PSS path can draw from the same entropy
/// source as the rest of the crate (`jose_b64::random_bytes`) without every
/// signer needing its own `OsRng` import.
#[cfg(feature = "rsa")]
fn rand_from_jose_b64() -> impl rand_core::CryptoRng + rand_core::RngCore {
    rand_core::OsRng
}

#[cfg(feature = "p256")]
fn ecdsa_p256_sign(key: &Key, signing_input: &[u8]) -> Result<Vec<u8>, HandlerError> {
    use p256::ecdsa::{signature::Signer, Signature, SigningKey};
    let Key::Ec(ec) = key else {
        return Err(HandlerError::KeyMismatch("expected an EC key".into()));
    };
    let Some(d) = &ec.d else {
        return Err(HandlerError::KeyMismatch("EC key has no private component".into()));
    };
    let signing_key =
        SigningKey::from_bytes(d.as_bytes().into()).map_err(|e| HandlerError::Library(format!("{e}")))?;
    let signature: Signature = signing_key.sign(signing_input);
    crate::asn1::der_to_jws(signature.to_der().as_bytes(), jose_jwk::EcCurve::P256.coordinate_len())
}

#[cfg(feature = "p256")]
fn ecdsa_p256_verify(key: &Key, signing_input: &[u8], signature: &[u8]) -> Result<(), HandlerError> {
    use p256::ecdsa::{signature::Verifier, Signature, VerifyingKey};
    let elliptic_curve_point::Generic::P256(point) = ec_encoded_point(key)? else {
        return Err(HandlerError::KeyMismatch("expected a P-256 key".into()));
    };
    let verifying_key =
        VerifyingKey::from_encoded_point(&point).map_err(|_| HandlerError::VerificationFailed)?;
    let der = crate::asn1::jws_to_der(signature, jose_jwk::EcCurve::P256.coordinate_len())?;
    let sig = Signature::from_der(&der).map_err(|_| HandlerError::VerificationFailed)?;
    verifying_key
        .verify(signing_input, &sig)
        .map_err(|_| HandlerError::VerificationFailed)
}

#[cfg(feature = "p384")]
fn ecdsa_p384_sign(key: &Key, signing_input: &[u8]) -> Result<Vec<u8>, HandlerError> {
    use p384::ecdsa::{signature::Signer, Signature, SigningKey};
    let Key::Ec(ec) = key else {
        return Err(HandlerError::KeyMismatch("expected an EC key".into()));
    };
    let Some(d) = &ec.d else {
        return Err(HandlerError::KeyMismatch("EC key has no private component".into()));
    };
    let signing_key =
        SigningKey::from_bytes(d.as_bytes().into()).map_err(|e| HandlerError::Library(format!("{e}")))?;
    let signature: Signature = signing_key.sign(signing_input);
    crate::asn1::der_to_jws(signature.to_der().as_bytes(), jose_jwk::EcCurve::P384.coordinate_len())
}

#[cfg(feature = "p384")]
fn ecdsa_p384_verify(key: &Key, signing_input: &[u8], signature: &[u8]) -> Result<(), HandlerError> {
    use p384::ecdsa::{signature::Verifier, Signature, VerifyingKey};
    let elliptic_curve_point::Generic::P384(point) = ec_encoded_point(key)? else {
        return Err(HandlerError::KeyMismatch("expected a P-384 key".into()));
    };
    let verifying_key =
        VerifyingKey::from_encoded_point(&point).map_err(|_| HandlerError::VerificationFailed)?;
    let der = crate::asn1::jws_to_der(signature, jose_jwk::EcCurve::P384.coordinate_len())?;
    let sig = Signature::from_der(&der).map_err(|_| HandlerError::VerificationFailed)?;
    verifying_key
        .verify(signing_input, &sig)
        .map_err(|_| HandlerError::VerificationFailed)
}

#[cfg(feature = "p521")]
fn ecdsa_p521_sign(key: &Key, signing_input: &[u8]) -> Result<Vec<u8>, HandlerError> {
    use p521::ecdsa::{signature::Signer, Signature, SigningKey};
    let Key::Ec(ec) = key else {
        return Err(HandlerError::KeyMismatch("expected an EC key".into()));
    };
    let Some(d) = &ec.d else {
        return Err(HandlerError::KeyMismatch("EC key has no private component".into()));
    };
    let signing_key =
        SigningKey::from_bytes(d.as_bytes().into()).map_err(|e| HandlerError::Library(format!("{e}")))?;
    let signature: Signature = signing_key.sign(signing_input);
    crate::asn1::der_to_jws(signature.to_der().as_bytes(), jose_jwk::EcCurve::P521.coordinate_len())
}

#[cfg(feature = "p521")]
fn ecdsa_p521_verify(key: &Key, signing_input: &[u8], signature: &[u8]) -> Result<(), HandlerError> {
    use p521::ecdsa::{signature::Verifier, Signature, VerifyingKey};
    let elliptic_curve_point::Generic::P521(point) = ec_encoded_point(key)? else {
        return Err(HandlerError::KeyMismatch("expected a P-521 key".into()));
    };
    let verifying_key =
        VerifyingKey::from_encoded_point(&point).map_err(|_| HandlerError::VerificationFailed)?;
    let der = crate::asn1::jws_to_der(signature, jose_jwk::EcCurve::P521.coordinate_len())?;
    let sig = Signature::from_der(&der).map_err(|_| HandlerError::VerificationFailed)?;
    verifying_key
        .verify(signing_input, &sig)
        .map_err(|_| HandlerError::VerificationFailed)
}

#[cfg(any(feature = "p256", feature = "p384", feature = "p521"))]
fn ec_encoded_point(key: &Key) -> Result<elliptic_curve_point::Generic, HandlerError> {
    elliptic_curve_point::from_key(key)
}

/// A tiny indirection so the three curve verify functions above can share
/// one "build an uncompressed point from x/y" helper despite each curve
/// crate defining its own `EncodedPoint` type.
#[cfg(any(feature = "p256", feature = "p384", feature = "p521"))]
mod elliptic_curve_point {
    use jose_jwk::Key;

    use super::HandlerError;

    pub enum Generic {
        #[cfg(feature = "p256")]
        P256(p256::EncodedPoint),
        #[cfg(feature = "p384")]
        P384(p384::EncodedPoint),
        #[cfg(feature = "p521")]
        P521(p521::EncodedPoint),
    }

    pub fn from_key(key: &Key) -> Result<Generic, HandlerError> {
        let Key::Ec(ec) = key else {
            return Err(HandlerError::KeyMismatch("expected an EC key".into()));
        };
        match ec.crv {
            #[cfg(feature = "p256")]
            jose_jwk::EcCurve::P256 => Ok(Generic::P256(p256::EncodedPoint::from_affine_coordinates(
                p256::FieldBytes::from_slice(ec.x.as_ref()),
                p256::FieldBytes::from_slice(ec.y.as_ref()),
                false,
            ))),
            #[cfg(feature = "p384")]
            jose_jwk::EcCurve::P384 => Ok(Generic::P384(p384::EncodedPoint::from_affine_coordinates(
                p384::FieldBytes::from_slice(ec.x.as_ref()),
                p384::FieldBytes::from_slice(ec.y.as_ref()),
                false,
            ))),
            #[cfg(feature = "p521")]
            jose_jwk::EcCurve::P521 => Ok(Generic::P521(p521::EncodedPoint::from_affine_coordinates(
                p521::FieldBytes::from_slice(ec.x.as_ref()),
                p521::FieldBytes::from_slice(ec.y.as_ref()),
                false,
            ))),
            _ => Err(HandlerError::KeyMismatch("unsupported EC curve".into())),
        }
    }
}

#[cfg(feature = "eddsa")]
fn eddsa_sign(key: &Key, signing_input: &[u8]) -> Result<Vec<u8>, HandlerError> {
    use ed25519_dalek::{Signer, SigningKey};
    let Key::Okp(okp) = key else {
        return Err(HandlerError::KeyMismatch("expected an OKP key".into()));
    };
    if okp.crv != jose_jwk::OkpCurve::Ed25519 {
        return Err(HandlerError::Unsupported(format!("EdDSA over {:?}", okp.crv)));
    }
    let Some(d) = &okp.d else {
        return Err(HandlerError::KeyMismatch("OKP key has no private component".into()));
    };
    let seed: [u8; 32] = d
        .as_bytes()
        .try_into()
        .map_err(|_| HandlerError::KeyMismatch("Ed25519 private key must be 32 bytes".into()))?;
    let signing_key = SigningKey::from_bytes(&seed);
    Ok(signing_key.sign(signing_input).to_bytes().to_vec())
}

#[cfg(feature = "eddsa")]
fn eddsa_verify(key: &Key, signing_input: &[u8], signature: &[u8]) -> Result<(), HandlerError> {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    let Key::Okp(okp) = key else {
        return Err(HandlerError::KeyMismatch("expected an OKP key".into()));
    };
    if okp.crv != jose_jwk::OkpCurve::Ed25519 {
        return Err(HandlerError::VerificationFailed);
    }
    let x: [u8; 32] = okp
        .x
        .as_ref()
        .try_into()
        .map_err(|_| HandlerError::VerificationFailed)?;
    let verifying_key = VerifyingKey::from_bytes(&x).map_err(|_| HandlerError::VerificationFailed)?;
    let sig = Signature::from_slice(signature).map_err(|_| HandlerError::VerificationFailed)?;
    verifying_key
        .verify_strict(signing_input, &sig)
        .map_err(|_| HandlerError::VerificationFailed)
}
