//! Maps an algorithm identifier to the [`jose_jwk::select::Criteria`] a
//! candidate key must satisfy, and to whether this build has a handler for
//! it at all.

use jose_jwk::{select::Criteria, EncryptionAlg, KeyMgmtAlg, SigningAlg};

/// The criteria a handler places on a candidate key, per algorithm (spec
/// §4.1). `alg` is always a preferred match: a key that doesn't carry an
/// `alg` of its own is never disqualified on that basis alone.
pub fn signing_key_criteria(alg: SigningAlg) -> Criteria {
    let name = alg.to_string();
    let base = Criteria::new().preferred("alg", name.clone());
    match alg {
        SigningAlg::Hs256 | SigningAlg::Hs384 | SigningAlg::Hs512 => {
            base.exact("kty", "oct")
        }
        SigningAlg::Rs256
        | SigningAlg::Rs384
        | SigningAlg::Rs512
        | SigningAlg::Ps256
        | SigningAlg::Ps384
        | SigningAlg::Ps512 => base.exact("kty", "RSA"),
        SigningAlg::Es256 => base.exact("kty", "EC").exact("crv", "P-256"),
        SigningAlg::Es384 => base.exact("kty", "EC").exact("crv", "P-384"),
        SigningAlg::Es512 => base.exact("kty", "EC").exact("crv", "P-521"),
        SigningAlg::Es256K => base.exact("kty", "EC").exact("crv", "secp256k1"),
        SigningAlg::EdDsa => base.exact("kty", "OKP").exact("crv", "Ed25519"),
        SigningAlg::None => base,
    }
}

/// Criteria for a JWE `alg` (key management) algorithm.
pub fn key_mgmt_key_criteria(alg: KeyMgmtAlg) -> Criteria {
    let name = alg.to_string();
    let base = Criteria::new().preferred("alg", name.clone());
    match alg {
        KeyMgmtAlg::Rsa1to5 | KeyMgmtAlg::RsaOaep | KeyMgmtAlg::RsaOaep256 => {
            base.exact("kty", "RSA")
        }
        KeyMgmtAlg::Aes128Kw
        | KeyMgmtAlg::Aes192Kw
        | KeyMgmtAlg::Aes256Kw
        | KeyMgmtAlg::Aes128GcmKw
        | KeyMgmtAlg::Aes192GcmKw
        | KeyMgmtAlg::Aes256GcmKw
        | KeyMgmtAlg::Dir
        | KeyMgmtAlg::Pbes2Hs256A128Kw
        | KeyMgmtAlg::Pbes2Hs384A192Kw
        | KeyMgmtAlg::Pbes2Hs512A256Kw => base.exact("kty", "oct"),
        KeyMgmtAlg::EcdhEs
        | KeyMgmtAlg::EcdhEsA128Kw
        | KeyMgmtAlg::EcdhEsA192Kw
        | KeyMgmtAlg::EcdhEsA256Kw => {
            base.intersecting("crv", ["P-256", "P-384", "P-521", "X25519"])
        }
    }
}

/// Whether this build has a handler for `alg`, given the crypto features it
/// was compiled with.
pub fn signing_alg_implemented(alg: SigningAlg) -> bool {
    match alg {
        SigningAlg::Hs256 | SigningAlg::Hs384 | SigningAlg::Hs512 => true,
        SigningAlg::Rs256 | SigningAlg::Rs384 | SigningAlg::Rs512 => cfg!(feature = "rsa"),
        SigningAlg::Ps256 | SigningAlg::Ps384 | SigningAlg::Ps512 => cfg!(feature = "rsa"),
        SigningAlg::Es256 => cfg!(feature = "p256"),
        SigningAlg::Es384 => cfg!(feature = "p384"),
        SigningAlg::Es512 => cfg!(feature = "p521"),
        SigningAlg::Es256K => false,
        SigningAlg::EdDsa => cfg!(feature = "eddsa"),
        SigningAlg::None => true,
    }
}

/// Whether this build has a handler for a JWE `enc` algorithm.
pub fn enc_alg_implemented(_alg: EncryptionAlg) -> bool {
    cfg!(feature = "aes")
}

/// Whether this build has a handler for a JWE `alg` (key management) algorithm.
pub fn key_mgmt_alg_implemented(alg: KeyMgmtAlg) -> bool {
    match alg {
        KeyMgmtAlg::Dir => true,
        KeyMgmtAlg::Aes128Kw
        | KeyMgmtAlg::Aes192Kw
        | KeyMgmtAlg::Aes256Kw
        | KeyMgmtAlg::Aes128GcmKw
        | KeyMgmtAlg::Aes192GcmKw
        | KeyMgmtAlg::Aes256GcmKw => cfg!(feature = "aes"),
        KeyMgmtAlg::Pbes2Hs256A128Kw | KeyMgmtAlg::Pbes2Hs384A192Kw | KeyMgmtAlg::Pbes2Hs512A256Kw => {
            cfg!(feature = "pbes2")
        }
        KeyMgmtAlg::Rsa1to5 | KeyMgmtAlg::RsaOaep | KeyMgmtAlg::RsaOaep256 => cfg!(feature = "rsa"),
        KeyMgmtAlg::EcdhEs | KeyMgmtAlg::EcdhEsA128Kw | KeyMgmtAlg::EcdhEsA192Kw | KeyMgmtAlg::EcdhEsA256Kw => {
            cfg!(feature = "p256") || cfg!(feature = "p384") || cfg!(feature = "p521") || cfg!(feature = "eddsa")
        }
    }
}
