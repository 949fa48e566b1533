use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::task::{ParseEnumError, normalize};

/// Individual or business customer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerKind {
    Individual,
    Business,
}

impl CustomerKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for CustomerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "individual" => Ok(Self::Individual),
            "business" => Ok(Self::Business),
            _ => Err(ParseEnumError {
                expected: "customer kind",
                got: s.to_string(),
            }),
        }
    }
}

/// A customer registry entry.
///
/// Email is unique case-insensitively when present. Deletion is soft,
/// mirroring products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub kind: CustomerKind,
    pub name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub abn: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Case-insensitive email comparison used for uniqueness and lookups.
    #[must_use]
    pub fn email_matches(&self, email: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(email))
    }
}

#[cfg(test)]
mod tests {
    use super::CustomerKind;
    use std::str::FromStr;

    #[test]
    fn kind_roundtrips() {
        for kind in [CustomerKind::Individual, CustomerKind::Business] {
            assert_eq!(CustomerKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert!(CustomerKind::from_str("trust").is_err());
    }
}
