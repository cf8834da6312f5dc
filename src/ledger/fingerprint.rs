//! Fingerprints: stable SHA-256 digests used as uniqueness keys.
//!
//! Digests must stay identical across processes and releases because
//! callers persist them, so `std::hash` is not an option here.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

/// What a fingerprint was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FingerprintKind {
    /// Canonical selection tuple: namespace, list option keys, spun text.
    Structural,
    /// Final assembled text.
    Content,
}

impl FingerprintKind {
    fn prefix(self) -> &'static str {
        match self {
            FingerprintKind::Structural => "s",
            FingerprintKind::Content => "c",
        }
    }
}

/// A uniqueness key, rendered as `s:<hex>` or `c:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    kind: FingerprintKind,
    digest: String,
}

impl Fingerprint {
    /// Fingerprint of a combination's identifying selections.
    ///
    /// `selections` are `(dimension id, option key)` pairs in dimension
    /// order; `spun` is the template after spintax resolution, so two
    /// slot choices that render the same text share a fingerprint.
    pub fn structural(namespace: &str, selections: &[(&str, &str)], spun: &str) -> Self {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, namespace);
        for (dimension, key) in selections {
            update_field(&mut hasher, dimension);
            update_field(&mut hasher, key);
        }
        update_field(&mut hasher, spun);
        Self {
            kind: FingerprintKind::Structural,
            digest: format!("{:x}", hasher.finalize()),
        }
    }

    /// Fingerprint of final article text within a namespace.
    pub fn content(namespace: &str, text: &str) -> Self {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, namespace);
        update_field(&mut hasher, text);
        Self {
            kind: FingerprintKind::Content,
            digest: format!("{:x}", hasher.finalize()),
        }
    }

    pub fn kind(&self) -> FingerprintKind {
        self.kind
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Length-prefix each field so `("ab", "c")` and `("a", "bc")` differ.
fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.prefix(), self.digest)
    }
}

/// Error parsing a fingerprint from its text form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a fingerprint: '{0}'")]
pub struct ParseFingerprintError(String);

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFingerprintError(s.to_string());
        let (prefix, digest) = s.split_once(':').ok_or_else(err)?;
        let kind = match prefix {
            "s" => FingerprintKind::Structural,
            "c" => FingerprintKind::Content,
            _ => return Err(err()),
        };
        if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        Ok(Self {
            kind,
            digest: digest.to_ascii_lowercase(),
        })
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
