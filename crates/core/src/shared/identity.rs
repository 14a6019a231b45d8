use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::constants::UNKNOWN_IDENTITY;

/// Key under which visits are logged: a recognizer label or the `"Unknown"`
/// sentinel.
///
/// All unrecognized faces share the single `"Unknown"` key, so two strangers
/// visible in the same frame are one visitor as far as the ledger is
/// concerned.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_IDENTITY.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_IDENTITY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identity {
    fn from(name: String) -> Self {
        Self(name)
    }
}
