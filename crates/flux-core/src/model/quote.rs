use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::task::{ParseEnumError, normalize};

/// Quote lifecycle states. Any status may move to any other; the engine
/// only reports whether a change actually happened so callers can decide
/// to fire `quote.status_changed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl QuoteStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            _ => Err(ParseEnumError {
                expected: "quote status",
                got: s.to_string(),
            }),
        }
    }
}

/// One priced line on a quote.
///
/// `product_sku`/`product_name`/`unit_price` are captured from the catalog
/// when the line is built and never refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLineItem {
    pub id: String,
    pub product_id: String,
    pub product_sku: String,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Percentage discount, 0–100.
    pub discount: Decimal,
    pub line_total: Decimal,
}

/// A point-in-time sales quote snapshot.
///
/// All monetary fields are derived from the line items at create/update
/// time; `customer_name` is a display snapshot that only refreshes when the
/// quote is explicitly re-pointed at a different customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub quote_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub line_items: Vec<QuoteLineItem>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub status: QuoteStatus,
    pub issue_date: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::QuoteStatus;
    use std::str::FromStr;

    #[test]
    fn status_roundtrips() {
        for status in [
            QuoteStatus::Draft,
            QuoteStatus::Sent,
            QuoteStatus::Accepted,
            QuoteStatus::Rejected,
            QuoteStatus::Expired,
        ] {
            assert_eq!(QuoteStatus::from_str(&status.to_string()).unwrap(), status);
        }
        assert!(QuoteStatus::from_str("paid").is_err());
    }
}
