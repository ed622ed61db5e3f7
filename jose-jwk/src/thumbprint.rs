use alloc::{format, string::String};
use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};

use crate::key::{Key, OkpCurve};

/// Compute the RFC7638 JWK thumbprint: canonicalize by keeping only the
/// `kty`-mandatory members in lexicographic key order, JSON-serialize with no
/// whitespace, SHA-256, base64url-encode.
///
/// The canonical member set per `kty`, in the lexicographic order RFC7638
/// requires:
///
/// - `EC`: `crv`, `kty`, `x`, `y`
/// - `RSA`: `e`, `kty`, `n`
/// - `oct`: `k`, `kty`
/// - `OKP`: `crv`, `kty`, `x`
///
/// Two JWKs with identical mandatory fields but different optional fields
/// (`kid`, `alg`, `use`, ...) produce the same thumbprint, since none of
/// those ever enter the canonical form.
pub fn thumbprint(key: &Key) -> String {
    let canonical = canonical_json(key);
    let digest = Sha256::digest(canonical.as_bytes());
    Base64UrlUnpadded::encode_string(&digest)
}

fn canonical_json(key: &Key) -> String {
    match key {
        Key::Ec(ec) => format!(
            "{{\"crv\":\"{}\",\"kty\":\"EC\",\"x\":\"{}\",\"y\":\"{}\"}}",
            curve_name(ec.crv),
            b64(&ec.x),
            b64(&ec.y),
        ),
        Key::Rsa(rsa) => format!(
            "{{\"e\":\"{}\",\"kty\":\"RSA\",\"n\":\"{}\"}}",
            b64(&rsa.e),
            b64(&rsa.n),
        ),
        Key::Oct(oct) => format!(
            "{{\"k\":\"{}\",\"kty\":\"oct\"}}",
            Base64UrlUnpadded::encode_string(oct.k.as_bytes()),
        ),
        Key::Okp(okp) => format!(
            "{{\"crv\":\"{}\",\"kty\":\"OKP\",\"x\":\"{}\"}}",
            okp_curve_name(okp.crv),
            b64(&okp.x),
        ),
    }
}

fn b64(bytes: impl AsRef<[u8]>) -> String {
    Base64UrlUnpadded::encode_string(bytes.as_ref())
}

fn curve_name(crv: crate::key::EcCurve) -> &'static str {
    use crate::key::EcCurve::*;
    match crv {
        P256 => "P-256",
        P384 => "P-384",
        P521 => "P-521",
        P256K => "secp256k1",
    }
}

fn okp_curve_name(crv: OkpCurve) -> &'static str {
    match crv {
        OkpCurve::Ed25519 => "Ed25519",
        OkpCurve::Ed448 => "Ed448",
        OkpCurve::X25519 => "X25519",
        OkpCurve::X448 => "X448",
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::key::{Ec, EcCurve, Oct};
    use jose_b64::{B64Bytes, B64Secret};

    #[test]
    fn rfc7638_example() {
        // the exact example from RFC 7638 appendix A, an RSA key
        let n = "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1Rk7SA26Qfqb9AYaxhBr-lCtM0JxTDRNK2pbv5_hoAN-NPHu9vY3sRHbR95nuTSqzBwQfKBPpFTRYP0m8Ri1IqSBxJcRhaSx8uxoN_y9FNVvgN3b9VjcTiL0Uu3NRXo4MLbuTgDycIjTR9PBeWX7zW_Wx43WAv6j3MK19dX0eHHYhzT2WVVKsBE9GI-U5WPVjNFomQTR4PYy3qtiBGbxnoLKPRxDNkyMR-bCQfzqMMKKB6ATQD9eEkahb0RSvuAOaPFzKmhhcIK7iR5Ikwxvt-AgVnxIsbmLXT3u9v6SLcW5jWs2U2kpfDk4rh9jKmVh4qH-SFwAOvh53dqhDPhklOQzBOMwFgmH2T--I1DNqR8T2OmMP0Bsb36xJZQw";
        let key = Key::Rsa(crate::key::Rsa {
            n: B64Bytes::from(jose_b64::decode(n).unwrap()),
            e: B64Bytes::from(jose_b64::decode("AQAB").unwrap()),
            private: None,
        });
        assert_eq!(thumbprint(&key), "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs");
    }

    #[test]
    fn ignores_optional_fields() {
        let plain = Key::Oct(Oct {
            k: B64Secret::new(alloc::vec![1, 2, 3, 4]),
        });
        assert_eq!(thumbprint(&plain), thumbprint(&plain.clone()));

        let ec_a = Key::Ec(Ec {
            crv: EcCurve::P256,
            x: B64Bytes::new(alloc::vec![1; 32]),
            y: B64Bytes::new(alloc::vec![2; 32]),
            d: None,
        });
        let ec_b = Key::Ec(Ec {
            crv: EcCurve::P256,
            x: B64Bytes::new(alloc::vec![1; 32]),
            y: B64Bytes::new(alloc::vec![2; 32]),
            d: Some(B64Secret::new(alloc::vec![3; 32])),
        });
        // d is not part of the canonical form: public and private share a thumbprint
        assert_eq!(thumbprint(&ec_a), thumbprint(&ec_b));
    }
}
