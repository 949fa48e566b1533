//! Quote computation: line-item pricing, totals, numbering, lifecycle.

pub mod engine;
pub mod money;

pub use engine::{
    DEFAULT_VALID_DAYS, LineItemInput, QuoteFilters, QuoteInput, QuotePatch, QuoteStatusChange,
    default_tax_rate,
};
pub use money::{line_total, round2};
