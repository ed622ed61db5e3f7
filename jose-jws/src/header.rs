use alloc::{string::String, vec::Vec};
use jose_jwk::SigningAlg;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JOSE header, as shared between the protected and unprotected halves of
/// a JWS (RFC7515 §4). Recognized members get typed fields; everything else
/// round-trips through `extra`.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// The algorithm used to secure the JWS.
    pub alg: SigningAlg,

    /// Key ID: which key in a [`jose_jwk::JwkSet`] secured this JWS.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kid: Option<String>,

    /// Declared media type of the complete JWS (`typ`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub typ: Option<String>,

    /// Declared media type of the payload (`cty`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cty: Option<String>,

    /// Header parameters that a consumer must understand and process, or
    /// else reject the JWS outright (RFC7515 §4.1.11). This implementation
    /// understands none, so any non-empty `crit` is always rejected.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub crit: Vec<String>,

    /// Any other header parameter, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Header {
    /// A minimal header naming only the signing algorithm.
    pub fn new(alg: SigningAlg) -> Self {
        Self {
            alg,
            kid: None,
            typ: None,
            cty: None,
            crit: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Set `kid`, builder-style.
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }
}
