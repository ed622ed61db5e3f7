use alloc::{
    collections::BTreeSet,
    string::{String, ToString},
    vec::Vec,
};

use crate::{Jwk, JwkSet, Operations, UseFor};

/// One requirement a [`Criteria`] places on a candidate key's field.
///
/// Mirrors the three prefixes a handler's `key_criteria()` map can use
/// (spec §4.1):
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// No prefix: the field must be present and equal to this value.
    Exact(String),
    /// `~name`: if the key carries the field, it must match; otherwise the
    /// key is unconstrained by it.
    Preferred(String),
    /// `@name`: the key's value (itself possibly a set) must contain all of
    /// these values.
    Intersect(BTreeSet<String>),
}

/// The criteria a handler requires of a candidate key, keyed by JWK field
/// name (`kty`, `alg`, `use`, `key_ops`, `crv`, ...).
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    requirements: Vec<(String, Requirement)>,
}

impl Criteria {
    /// An empty criteria set: any key matches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an exact match on `field`.
    pub fn exact(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements
            .push((field.into(), Requirement::Exact(value.into())));
        self
    }

    /// Prefer a match on `field`: constrains the key only if the key has an
    /// opinion (RFC7518 leaves this ambiguous for e.g. a symmetric key's
    /// `alg`; spec §9 resolves it as preferred everywhere).
    pub fn preferred(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements
            .push((field.into(), Requirement::Preferred(value.into())));
        self
    }

    /// Require the key's value for `field` to be a superset of `values`.
    pub fn intersecting(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.requirements.push((
            field.into(),
            Requirement::Intersect(values.into_iter().map(Into::into).collect()),
        ));
        self
    }

    fn matches(&self, key: &Jwk) -> bool {
        self.requirements
            .iter()
            .all(|(field, req)| field_matches(key, field, req))
    }
}

fn field_matches(key: &Jwk, field: &str, req: &Requirement) -> bool {
    match field {
        "kty" => match req {
            Requirement::Exact(v) => kty_name(key) == v,
            Requirement::Preferred(v) => kty_name(key) == v,
            Requirement::Intersect(set) => set.contains(kty_name(key)),
        },
        "crv" => match crv_name(key) {
            Some(crv) => match req {
                Requirement::Exact(v) | Requirement::Preferred(v) => crv == v,
                Requirement::Intersect(set) => set.contains(&crv.to_string()),
            },
            None => false,
        },
        "alg" => match &key.params.alg {
            Some(alg) => {
                let alg = alg.to_string();
                match req {
                    Requirement::Exact(v) | Requirement::Preferred(v) => &alg == v,
                    Requirement::Intersect(set) => set.contains(&alg),
                }
            }
            None => matches!(req, Requirement::Preferred(_)),
        },
        "use" => match &key.params.use_for {
            Some(u) => {
                let u = match u {
                    UseFor::Encryption => "enc",
                    UseFor::Signing => "sig",
                };
                match req {
                    Requirement::Exact(v) | Requirement::Preferred(v) => u == v,
                    Requirement::Intersect(set) => set.contains(u),
                }
            }
            None => matches!(req, Requirement::Preferred(_)),
        },
        "key_ops" => {
            let ops: BTreeSet<String> = key
                .params
                .key_ops
                .iter()
                .map(|op| operation_name(*op).to_string())
                .collect();
            match req {
                Requirement::Exact(v) | Requirement::Preferred(v) => ops.contains(v),
                Requirement::Intersect(set) => set.is_subset(&ops),
            }
        }
        _ => false,
    }
}

fn kty_name(key: &Jwk) -> &'static str {
    match &key.key {
        crate::Key::Ec(_) => "EC",
        crate::Key::Rsa(_) => "RSA",
        crate::Key::Oct(_) => "oct",
        crate::Key::Okp(_) => "OKP",
    }
}

fn crv_name(key: &Jwk) -> Option<&'static str> {
    match &key.key {
        crate::Key::Ec(ec) => Some(match ec.crv {
            crate::EcCurve::P256 => "P-256",
            crate::EcCurve::P384 => "P-384",
            crate::EcCurve::P521 => "P-521",
            crate::EcCurve::P256K => "secp256k1",
        }),
        crate::Key::Okp(okp) => Some(match okp.crv {
            crate::OkpCurve::Ed25519 => "Ed25519",
            crate::OkpCurve::Ed448 => "Ed448",
            crate::OkpCurve::X25519 => "X25519",
            crate::OkpCurve::X448 => "X448",
        }),
        _ => None,
    }
}

fn operation_name(op: Operations) -> &'static str {
    match op {
        Operations::Decrypt => "decrypt",
        Operations::DeriveBits => "deriveBits",
        Operations::DeriveKey => "deriveKey",
        Operations::Encrypt => "encrypt",
        Operations::Sign => "sign",
        Operations::UnwrapKey => "unwrapKey",
        Operations::Verify => "verify",
        Operations::WrapKey => "wrapKey",
    }
}

impl JwkSet {
    /// Select a key matching `criteria`, per spec §4.1: `kid`, when given,
    /// is a hard filter; otherwise the first key (in insertion order)
    /// matching every criterion wins.
    pub fn select(&self, criteria: &Criteria, kid: Option<&str>) -> Option<&Jwk> {
        self.keys.iter().find(|key| {
            if let Some(kid) = kid {
                if key.params.kid.as_deref() != Some(kid) {
                    return false;
                }
            }
            criteria.matches(key)
        })
    }

    /// All keys matching `criteria`, in insertion order, ignoring `kid`.
    /// Used by the JWS/JWE consume state machine when no `kid` narrows the
    /// search and every candidate must be tried in turn.
    pub fn select_all<'a>(&'a self, criteria: &'a Criteria) -> impl Iterator<Item = &'a Jwk> {
        self.keys.iter().filter(move |key| criteria.matches(key))
    }
}
