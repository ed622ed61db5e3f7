use alloc::{boxed::Box, string::String};
use base64ct::{Base64UrlUnpadded, Encoding};
use core::fmt;
use serde::{de::DeserializeOwned, de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// A JSON value that is carried, on the wire, as base64url of its *exact*
/// serialized bytes.
///
/// This is the shape of a JWS/JWE protected header: RFC 7515 §5.1 and RFC
/// 7516 §5.1 both authenticate the base64url-encoded octets, not a
/// structurally-equal re-serialization of the parsed JSON. `Json<T>`
/// therefore retains the original bytes it was parsed from (or produced when
/// constructed) and always serializes back to exactly those bytes, so that
/// anything that hashes or MACs `Json::encoded()` gets a stable answer
/// independent of `T`'s field order or whitespace.
#[derive(Clone)]
pub struct Json<T> {
    raw: Box<[u8]>,
    value: T,
}

impl<T> Json<T> {
    /// Build from an in-memory value, serializing it to canonical JSON now.
    pub fn new(value: T) -> Result<Self, Error>
    where
        T: Serialize,
    {
        let raw = serde_json::to_vec(&value)
            .map_err(|e| Error::Json(alloc::format!("{e}")))?
            .into_boxed_slice();
        Ok(Self { raw, value })
    }

    /// Parse from base64url text, keeping the decoded bytes verbatim.
    pub fn parse(encoded: &str) -> Result<Self, Error>
    where
        T: DeserializeOwned,
    {
        let raw = Base64UrlUnpadded::decode_vec(encoded)
            .map_err(|_| Error::InvalidEncoding)?
            .into_boxed_slice();
        let value = serde_json::from_slice(&raw).map_err(|e| Error::Json(alloc::format!("{e}")))?;
        Ok(Self { raw, value })
    }

    /// The base64url encoding of the exact bytes this was built/parsed from.
    pub fn encoded(&self) -> String {
        Base64UrlUnpadded::encode_string(&self.raw)
    }

    /// The raw (decoded) JSON bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The parsed value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwrap into the parsed value, discarding the raw bytes.
    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T> AsRef<T> for Json<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Json")
            .field("encoded", &self.encoded())
            .field("value", &self.value)
            .finish()
    }
}

impl<T: PartialEq> PartialEq for Json<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Serialize for Json<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encoded())
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Json<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(|e| D::Error::custom(alloc::format!("{e}")))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use serde_json::json;

    #[test]
    fn preserves_encoded_bytes_through_parse() {
        // the RFC 7515 appendix A.1 example protected header
        let encoded = "eyJ0eXAiOiJKV1QiLA0KICJhbGciOiJIUzI1NiJ9";
        let parsed: Json<serde_json::Value> = Json::parse(encoded).unwrap();
        assert_eq!(parsed.encoded(), encoded);
        assert_eq!(parsed.value()["alg"], json!("HS256"));
    }

    #[test]
    fn new_then_serialize_roundtrips() {
        let value = json!({"alg": "none"});
        let wrapped: Json<serde_json::Value> = Json::new(value).unwrap();
        let reparsed: Json<serde_json::Value> = Json::parse(&wrapped.encoded()).unwrap();
        assert_eq!(wrapped, reparsed);
    }
}
