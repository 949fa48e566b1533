use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog entry.
///
/// SKU is unique case-insensitively; uniqueness is enforced inside the
/// store's create/update path. Deletion is soft (`is_active = false`);
/// quotes keep their own snapshot of product identity and pricing, so a
/// later price or name change never rewrites issued quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub cost_price: Decimal,
    pub sell_price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub description: String,
    /// Vehicle/application fitment notes, free-form.
    #[serde(default)]
    pub fitment: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn default_currency() -> String {
    "AUD".to_string()
}

impl Product {
    /// Case-insensitive SKU comparison used for uniqueness and lookups.
    #[must_use]
    pub fn sku_matches(&self, sku: &str) -> bool {
        self.sku.eq_ignore_ascii_case(sku)
    }
}
