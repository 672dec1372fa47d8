//! Identifiers and the content fingerprint of catalog source tables.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identifier of an activity (the `Index` column).
pub type ActivityIndex = u32;

/// Identifier of a collection log item.
pub type ItemId = u32;

/// SHA256 digest over the raw catalog tables.
///
/// Two catalogs built from byte-identical tables share a fingerprint, so a
/// reload can tell whether anything changed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogFingerprint(String);

impl CatalogFingerprint {
    /// Digest the given tables in order. Tables are length-prefixed so that
    /// moving bytes from one table to the other changes the digest.
    pub fn of_tables(tables: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for table in tables {
            hasher.update((table.len() as u64).to_le_bytes());
            hasher.update(table);
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Short form used in log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CatalogFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CatalogFingerprint({})", self.short())
    }
}
