use alloc::{string::String, vec::Vec};
use base64ct::{Base64UrlUnpadded, Encoding};
use core::fmt;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret key material carried as base64url text on the wire.
///
/// Unlike [`crate::B64Bytes`] this type zeroizes its backing buffer on drop
/// and compares in constant time, and its `Debug` impl never prints the
/// material. Use this for anything that would be a private scalar, a
/// symmetric key, or a derived key -- never for public coordinates.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct B64Secret(Vec<u8>);

impl B64Secret {
    /// Wrap raw secret bytes.
    pub fn new(inner: Vec<u8>) -> Self {
        Self(inner)
    }

    /// Borrow the secret bytes.
    ///
    /// Callers must not log, copy without zeroizing, or otherwise extend the
    /// lifetime of this material beyond what the cryptographic operation at
    /// hand requires.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes of secret material.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there is no secret material (an empty key is never valid, but
    /// this type doesn't assume a minimum length -- that's algorithm-specific).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for B64Secret {
    fn eq(&self, other: &Self) -> bool {
        crate::ct_eq(&self.0, &other.0)
    }
}
impl Eq for B64Secret {}

impl fmt::Debug for B64Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("B64Secret").field(&"<redacted>").finish()
    }
}

impl Serialize for B64Secret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&Base64UrlUnpadded::encode_string(&self.0))
    }
}

impl<'de> Deserialize<'de> for B64Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let raw = Base64UrlUnpadded::decode_vec(&text)
            .map_err(|_| de::Error::custom("invalid base64url encoding"))?;
        Ok(Self::new(raw))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn redacts_debug_output() {
        let secret = B64Secret::new(alloc::vec![1, 2, 3]);
        let debug = alloc::format!("{secret:?}");
        assert!(!debug.contains('1'));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn roundtrip() {
        let secret = B64Secret::new(alloc::vec![9, 8, 7, 6]);
        let json = serde_json::to_string(&secret).unwrap();
        let back: B64Secret = serde_json::from_str(&json).unwrap();
        assert_eq!(secret, back);
    }
}
