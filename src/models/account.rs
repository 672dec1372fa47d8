//! Account variants that select a completions-per-hour column.

use serde::{Deserialize, Serialize};

/// Which throughput column applies to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountVariant {
    #[default]
    Main,
    /// Restricted accounts that cannot trade for supplies.
    Iron,
}

impl AccountVariant {
    pub fn from_is_iron(is_iron: bool) -> Self {
        if is_iron {
            AccountVariant::Iron
        } else {
            AccountVariant::Main
        }
    }

    pub fn is_iron(&self) -> bool {
        matches!(self, AccountVariant::Iron)
    }

    /// Map a collection log `accountType` (e.g. `NORMAL`, `IRONMAN`,
    /// `HARDCORE_IRONMAN`, `GROUP_IRONMAN`) to a variant.
    /// Unknown or blank types fall back to `Main`.
    pub fn from_account_type(account_type: &str) -> Self {
        if account_type.to_ascii_uppercase().contains("IRON") {
            AccountVariant::Iron
        } else {
            AccountVariant::Main
        }
    }
}

impl std::fmt::Display for AccountVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountVariant::Main => write!(f, "main"),
            AccountVariant::Iron => write!(f, "iron"),
        }
    }
}
