//! Transcoding between the fixed-width `R || S` signature JWS requires for
//! ECDSA (RFC7518 §3.4) and the ASN.1 `Ecdsa-Sig-Value` DER encoding the
//! underlying `p256`/`p384`/`p521` crates speak.

use alloc::vec::Vec;
use der::{asn1::UintRef, Decode, Encode, Sequence};

use crate::error::HandlerError;

#[derive(Sequence)]
struct EcdsaSigValue<'a> {
    r: UintRef<'a>,
    s: UintRef<'a>,
}

/// Concatenate `r` and `s`, each fixed to `coord_len` bytes, as RFC7518 §3.4
/// requires for a JWS ECDSA signature.
pub fn der_to_jws(der_sig: &[u8], coord_len: usize) -> Result<Vec<u8>, HandlerError> {
    let parsed = EcdsaSigValue::from_der(der_sig)
        .map_err(|e| HandlerError::Library(alloc::format!("invalid ECDSA DER signature: {e}")))?;
    let mut out = alloc::vec![0u8; 2 * coord_len];
    copy_unsigned(parsed.r.as_bytes(), &mut out[..coord_len])?;
    copy_unsigned(parsed.s.as_bytes(), &mut out[coord_len..])?;
    Ok(out)
}

/// Split a fixed-width `R || S` JWS signature back into DER for verification
/// by the underlying curve crate.
pub fn jws_to_der(jws_sig: &[u8], coord_len: usize) -> Result<Vec<u8>, HandlerError> {
    if jws_sig.len() != 2 * coord_len {
        return Err(HandlerError::VerificationFailed);
    }
    let r = UintRef::new(trim_leading_zeros(&jws_sig[..coord_len]))
        .map_err(|e| HandlerError::Library(alloc::format!("{e}")))?;
    let s = UintRef::new(trim_leading_zeros(&jws_sig[coord_len..]))
        .map_err(|e| HandlerError::Library(alloc::format!("{e}")))?;
    EcdsaSigValue { r, s }
        .to_der()
        .map_err(|e| HandlerError::Library(alloc::format!("{e}")))
}

fn copy_unsigned(src: &[u8], dst: &mut [u8]) -> Result<(), HandlerError> {
    if src.len() > dst.len() {
        return Err(HandlerError::Library(
            "ECDSA signature component wider than the curve's coordinate".into(),
        ));
    }
    dst[dst.len() - src.len()..].copy_from_slice(src);
    Ok(())
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    &bytes[first_nonzero..]
}
