use alloc::{string::String, vec::Vec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// The `aud` (Audience) claim (RFC7519 §4.1.3): either a single
/// case-sensitive string identifier, or an array of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// Whether `principal` is named by this claim, under either of its wire
    /// shapes.
    pub fn contains(&self, principal: &str) -> bool {
        match self {
            Audience::One(aud) => aud == principal,
            Audience::Many(auds) => auds.iter().any(|aud| aud == principal),
        }
    }
}

/// The registered claims of a JSON Web Token (RFC7519 §4.1), plus whatever
/// private or public claims the caller added, preserved verbatim in
/// [`Claims::extra`].
///
/// Temporal claims (`nbf`, `exp`) are `NumericDate`s: seconds since the Unix
/// epoch (RFC7519 §2). This crate is `no_std` and has no clock of its own —
/// call [`Claims::validate_temporal`] with the current time from wherever
/// the caller gets it.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer (`iss`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iss: Option<String>,

    /// Subject (`sub`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sub: Option<String>,

    /// Audience (`aud`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub aud: Option<Audience>,

    /// Expiration time (`exp`): the token must not be accepted after this
    /// instant.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exp: Option<i64>,

    /// Not-before time (`nbf`): the token must not be accepted before this
    /// instant.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nbf: Option<i64>,

    /// Issued-at time (`iat`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iat: Option<i64>,

    /// JWT ID (`jti`): a unique identifier for this token.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub jti: Option<String>,

    /// Any other claim, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// An empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `aud` names `principal`. `false` if `aud` is absent.
    pub fn audience_contains(&self, principal: &str) -> bool {
        self.aud.as_ref().is_some_and(|aud| aud.contains(principal))
    }

    /// Check `nbf`/`exp` against `now` (seconds since the Unix epoch), with
    /// `leeway` seconds of clock-skew tolerance applied to both bounds.
    ///
    /// The core token engine never calls this: `nbf`/`exp` are decoded and
    /// returned as-is on every successful verification, unenforced, so that
    /// a caller can apply whatever leeway and clock source fits its own
    /// deployment before deciding whether the token is temporally valid.
    pub fn validate_temporal(&self, now: i64, leeway: i64) -> Result<(), Error> {
        if let Some(nbf) = self.nbf {
            if now < nbf.saturating_sub(leeway) {
                return Err(Error::TooEarly(nbf));
            }
        }
        if let Some(exp) = self.exp {
            if now >= exp.saturating_add(leeway) {
                return Err(Error::TooLate(exp));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn audience_matches_either_shape() {
        let one = Audience::One("api".into());
        assert!(one.contains("api"));
        assert!(!one.contains("other"));

        let many = Audience::Many(alloc::vec!["api".into(), "web".into()]);
        assert!(many.contains("web"));
        assert!(!many.contains("other"));
    }

    #[test]
    fn validate_temporal_rejects_not_yet_valid() {
        let claims = Claims {
            nbf: Some(1_000),
            ..Claims::new()
        };
        assert!(matches!(
            claims.validate_temporal(500, 0),
            Err(Error::TooEarly(1_000))
        ));
        assert!(claims.validate_temporal(1_000, 0).is_ok());
    }

    #[test]
    fn validate_temporal_rejects_expired() {
        let claims = Claims {
            exp: Some(1_000),
            ..Claims::new()
        };
        assert!(claims.validate_temporal(999, 0).is_ok());
        assert!(matches!(
            claims.validate_temporal(1_000, 0),
            Err(Error::TooLate(1_000))
        ));
    }

    #[test]
    fn validate_temporal_applies_leeway_to_both_bounds() {
        let claims = Claims {
            nbf: Some(1_000),
            exp: Some(2_000),
            ..Claims::new()
        };
        assert!(claims.validate_temporal(995, 10).is_ok());
        assert!(claims.validate_temporal(2_005, 10).is_ok());
        assert!(claims.validate_temporal(2_015, 10).is_err());
    }
}
