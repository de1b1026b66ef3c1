//! Short numeric codes embedded in QR links.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest generated identifier.
pub const MIN_QR_ID: i64 = 1;
/// Largest generated identifier.
pub const MAX_QR_ID: i64 = 999_999;

/// Identifier half of an association key.
///
/// Generated values fall in `MIN_QR_ID..=MAX_QR_ID`; values supplied by
/// clients are taken as-is.
#[derive(Copy, Clone, Debug, Deserialize, Serialize, Eq, Hash, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct QrId(i64);

impl QrId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for QrId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for QrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of fresh identifiers. Implementations give no uniqueness guarantee.
pub trait IdentifierSource: Send + Sync {
    fn next_id(&self) -> QrId;
}

/// Uniform draw from the thread-local RNG. Not suitable as a secret.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdentifier;

impl IdentifierSource for RandomIdentifier {
    fn next_id(&self) -> QrId {
        QrId(rand::rng().random_range(MIN_QR_ID..=MAX_QR_ID))
    }
}
