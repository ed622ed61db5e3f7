use alloc::{boxed::Box, vec::Vec};
use base64ct::Encoding;
use core::{fmt, marker::PhantomData};

#[cfg(feature = "serde")]
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A byte buffer that serializes as base64, with the concrete alphabet
/// selected by `E` (defaults to unpadded base64url, the JOSE default; the
/// padded `base64ct::Base64` alphabet is used for `x5c` certificate chains
/// per RFC 7517 §4.7, which are base64-standard, not base64url).
#[derive(Clone, PartialEq, Eq, Default)]
pub struct B64Bytes<T = Vec<u8>, E = base64ct::Base64UrlUnpadded>(T, PhantomData<E>);

impl<T, E> B64Bytes<T, E> {
    /// Wrap raw bytes for base64 (de)serialization.
    pub fn new(inner: T) -> Self {
        Self(inner, PhantomData)
    }

    /// Unwrap the inner byte container.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: AsRef<[u8]>, E> AsRef<[u8]> for B64Bytes<T, E> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<T: AsRef<[u8]>, E> fmt::Debug for B64Bytes<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("B64Bytes")
            .field(&base64ct::Base64UrlUnpadded::encode_string(self.0.as_ref()))
            .finish()
    }
}

impl<T: From<Vec<u8>>> From<Vec<u8>> for B64Bytes<T> {
    fn from(value: Vec<u8>) -> Self {
        Self::new(T::from(value))
    }
}

impl From<Vec<u8>> for B64Bytes<Box<[u8]>> {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value.into_boxed_slice())
    }
}

#[cfg(feature = "serde")]
impl<T: AsRef<[u8]>, E: Encoding> Serialize for B64Bytes<T, E> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&E::encode_string(self.0.as_ref()))
    }
}

#[cfg(feature = "serde")]
impl<'de, T, E> Deserialize<'de> for B64Bytes<T, E>
where
    T: TryFrom<Vec<u8>>,
    E: Encoding,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = alloc::string::String::deserialize(deserializer)?;
        let raw = E::decode_vec(&text).map_err(|_| de::Error::custom("invalid base64 encoding"))?;
        let inner = T::try_from(raw).map_err(|_| de::Error::custom("wrong byte length"))?;
        Ok(Self::new(inner))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn roundtrip_vec() {
        let original: B64Bytes = B64Bytes::new(alloc::vec![1, 2, 3, 255]);
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, "\"AQIDAP8\"");
        let back: B64Bytes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn roundtrip_fixed_array() {
        let original: B64Bytes<[u8; 4]> = B64Bytes::new([1, 2, 3, 4]);
        let json = serde_json::to_string(&original).unwrap();
        let back: B64Bytes<[u8; 4]> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }
}
