//! Quote lifecycle: creation, recomputation, numbering, status changes.
//!
//! A quote is a point-in-time snapshot. Product identity and unit prices
//! are captured when line items are built; customer display name is
//! captured when the quote is created or explicitly re-pointed. Later
//! catalog or registry renames never rewrite an issued quote.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::info;

use super::money;
use crate::error::CoreError;
use crate::id::{self, prefix};
use crate::model::{Quote, QuoteLineItem, QuoteStatus};
use crate::store::Store;

/// Quotes expire this many days after issue unless overridden.
pub const DEFAULT_VALID_DAYS: i64 = 30;

/// GST-style default tax rate, percent.
#[must_use]
pub fn default_tax_rate() -> Decimal {
    Decimal::from(10)
}

/// One requested line. `unit_price` falls back to the product's current
/// `sell_price`, `quantity` to 1, `discount` to 0.
#[derive(Debug, Clone)]
pub struct LineItemInput {
    pub product_id: String,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub discount: Option<Decimal>,
}

/// Fields for a new quote.
#[derive(Debug, Clone)]
pub struct QuoteInput {
    pub customer_id: String,
    pub line_items: Vec<LineItemInput>,
    pub tax_rate: Option<Decimal>,
    pub valid_days: Option<i64>,
    pub status: Option<QuoteStatus>,
    pub notes: Option<String>,
    pub terms: Option<String>,
}

/// Partial update. Supplying `line_items` replaces them wholesale and
/// recomputes every derived total; supplying `tax_rate` alone recomputes
/// tax and total from the existing subtotal. Re-pointing `customer_id`
/// refreshes the `customer_name` snapshot.
#[derive(Debug, Clone, Default)]
pub struct QuotePatch {
    pub customer_id: Option<String>,
    pub line_items: Option<Vec<LineItemInput>>,
    pub tax_rate: Option<Decimal>,
    pub status: Option<QuoteStatus>,
    pub notes: Option<String>,
    pub terms: Option<String>,
}

/// Quote list filters.
#[derive(Debug, Clone, Default)]
pub struct QuoteFilters {
    pub customer_id: Option<String>,
    pub status: Option<QuoteStatus>,
}

/// Result of a status mutation, carrying what a `quote.status_changed`
/// payload needs.
#[derive(Debug, Clone)]
pub struct QuoteStatusChange {
    pub quote: Quote,
    pub previous: QuoteStatus,
    pub changed: bool,
}

impl Store {
    #[must_use]
    pub fn quotes(&self, filters: &QuoteFilters) -> Vec<&Quote> {
        self.data()
            .quotes
            .iter()
            .filter(|q| {
                filters
                    .customer_id
                    .as_deref()
                    .is_none_or(|c| q.customer_id == c)
            })
            .filter(|q| filters.status.is_none_or(|s| q.status == s))
            .collect()
    }

    #[must_use]
    pub fn quote(&self, id: &str) -> Option<&Quote> {
        self.data().quotes.iter().find(|q| q.id == id)
    }

    /// Create a quote from resolvable references.
    ///
    /// Fails with a validation error when the customer or any product
    /// cannot be resolved, the line-item list is empty, or a discount or
    /// quantity is out of range.
    pub fn create_quote(&mut self, input: QuoteInput) -> Result<Quote, CoreError> {
        let customer_name = self
            .customer(&input.customer_id)
            .map(|c| c.name.clone())
            .ok_or_else(|| {
                CoreError::Validation(format!("unknown customer '{}'", input.customer_id))
            })?;
        let line_items = self.build_line_items(&input.line_items)?;

        let tax_rate = input.tax_rate.unwrap_or_else(default_tax_rate);
        let line_totals: Vec<Decimal> = line_items.iter().map(|li| li.line_total).collect();
        let (subtotal, tax_amount, total) = money::totals(&line_totals, tax_rate);

        let now = Utc::now();
        let valid_days = input.valid_days.unwrap_or(DEFAULT_VALID_DAYS);
        let quote = Quote {
            id: id::new_id(prefix::QUOTE),
            quote_number: next_quote_number(&self.data().quotes, now),
            customer_id: input.customer_id,
            customer_name,
            line_items,
            subtotal,
            tax_rate,
            tax_amount,
            total,
            status: input.status.unwrap_or(QuoteStatus::Draft),
            issue_date: now,
            valid_until: now + Duration::days(valid_days),
            notes: input.notes,
            terms: input.terms,
            created_at: now,
            updated_at: now,
        };
        info!(quote = %quote.id, number = %quote.quote_number, total = %quote.total, "create quote");
        self.commit(|data| {
            data.quotes.push(quote.clone());
            quote
        })
    }

    /// Partial update with full recomputation where derived figures are
    /// affected. Returns `Ok(None)` when the id is unknown.
    pub fn update_quote(&mut self, id: &str, patch: QuotePatch) -> Result<Option<Quote>, CoreError> {
        let Some(current) = self.quote(id) else {
            return Ok(None);
        };

        let customer = match patch.customer_id {
            Some(customer_id) => {
                let name = self
                    .customer(&customer_id)
                    .map(|c| c.name.clone())
                    .ok_or_else(|| {
                        CoreError::Validation(format!("unknown customer '{customer_id}'"))
                    })?;
                Some((customer_id, name))
            }
            None => None,
        };
        let line_items = match patch.line_items {
            Some(ref inputs) => Some(self.build_line_items(inputs)?),
            None => None,
        };
        let tax_rate = patch.tax_rate.unwrap_or(current.tax_rate);
        let recompute = line_items.is_some() || patch.tax_rate.is_some();

        let id = id.to_string();
        self.commit(move |data| {
            let quote = data.quotes.iter_mut().find(|q| q.id == id)?;
            if let Some((customer_id, customer_name)) = customer {
                quote.customer_id = customer_id;
                quote.customer_name = customer_name;
            }
            if let Some(line_items) = line_items {
                quote.line_items = line_items;
            }
            if recompute {
                let line_totals: Vec<Decimal> =
                    quote.line_items.iter().map(|li| li.line_total).collect();
                let (subtotal, tax_amount, total) = money::totals(&line_totals, tax_rate);
                quote.tax_rate = tax_rate;
                quote.subtotal = subtotal;
                quote.tax_amount = tax_amount;
                quote.total = total;
            }
            if let Some(status) = patch.status {
                quote.status = status;
            }
            if let Some(notes) = patch.notes {
                quote.notes = Some(notes);
            }
            if let Some(terms) = patch.terms {
                quote.terms = Some(terms);
            }
            quote.updated_at = Utc::now();
            Some(quote.clone())
        })
    }

    /// Status-only mutation reporting whether anything actually changed,
    /// so the caller can decide to fire `quote.status_changed`.
    pub fn update_quote_status(
        &mut self,
        id: &str,
        status: QuoteStatus,
    ) -> Result<Option<QuoteStatusChange>, CoreError> {
        let Some(current) = self.quote(id) else {
            return Ok(None);
        };
        let previous = current.status;
        let quote = match self.update_quote(
            id,
            QuotePatch {
                status: Some(status),
                ..QuotePatch::default()
            },
        )? {
            Some(quote) => quote,
            None => return Ok(None),
        };
        Ok(Some(QuoteStatusChange {
            changed: previous != quote.status,
            previous,
            quote,
        }))
    }

    /// Hard delete; nothing references a quote, so there is no cascade.
    pub fn delete_quote(&mut self, id: &str) -> Result<bool, CoreError> {
        if self.quote(id).is_none() {
            return Ok(false);
        }
        let id = id.to_string();
        self.commit(move |data| {
            data.quotes.retain(|q| q.id != id);
            true
        })
    }

    fn build_line_items(
        &self,
        inputs: &[LineItemInput],
    ) -> Result<Vec<QuoteLineItem>, CoreError> {
        if inputs.is_empty() {
            return Err(CoreError::Validation(
                "a quote requires at least one line item".to_string(),
            ));
        }
        inputs
            .iter()
            .map(|input| {
                let product = self.product(&input.product_id).ok_or_else(|| {
                    CoreError::Validation(format!("unknown product '{}'", input.product_id))
                })?;
                let quantity = input.quantity.unwrap_or(Decimal::ONE);
                if quantity <= Decimal::ZERO {
                    return Err(CoreError::Validation(format!(
                        "quantity must be positive, got {quantity}"
                    )));
                }
                let discount = input.discount.unwrap_or(Decimal::ZERO);
                if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
                    return Err(CoreError::Validation(format!(
                        "discount must be between 0 and 100, got {discount}"
                    )));
                }
                let unit_price = input.unit_price.unwrap_or(product.sell_price);
                Ok(QuoteLineItem {
                    id: id::new_id(prefix::LINE_ITEM),
                    product_id: product.id.clone(),
                    product_sku: product.sku.clone(),
                    product_name: product.name.clone(),
                    quantity,
                    unit_price,
                    discount,
                    line_total: money::line_total(quantity, unit_price, discount),
                })
            })
            .collect()
    }
}

/// Next `Q-<year>-<seq>` number: globally monotonic sequence, zero-padded,
/// year taken from the issue date. The store is single-writer per process
/// under the file-lock adapter, so scanning for the max is collision-free.
fn next_quote_number(quotes: &[Quote], now: chrono::DateTime<Utc>) -> String {
    use chrono::Datelike;
    let max_seq = quotes
        .iter()
        .filter_map(|q| q.quote_number.rsplit('-').next())
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("Q-{}-{:04}", now.year(), max_seq + 1)
}

#[cfg(test)]
mod tests {
    use super::{LineItemInput, QuoteFilters, QuoteInput, QuotePatch};
    use crate::error::CoreError;
    use crate::model::QuoteStatus;
    use crate::store::Store;
    use crate::store::tests_support::{seed_customer, seed_product};
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn line(product_id: &str, qty: i64, price: Option<i64>, discount: i64) -> LineItemInput {
        LineItemInput {
            product_id: product_id.to_string(),
            quantity: Some(Decimal::from(qty)),
            unit_price: price.map(Decimal::from),
            discount: Some(Decimal::from(discount)),
        }
    }

    fn quote_input(customer_id: &str, line_items: Vec<LineItemInput>) -> QuoteInput {
        QuoteInput {
            customer_id: customer_id.to_string(),
            line_items,
            tax_rate: Some(Decimal::from(10)),
            valid_days: None,
            status: None,
            notes: None,
            terms: None,
        }
    }

    #[test]
    fn create_computes_reference_totals() {
        let mut store = Store::in_memory();
        let customer = seed_customer(&mut store, "Jo");
        let widget = seed_product(&mut store, "WID-01", 100);
        let gadget = seed_product(&mut store, "GAD-01", 50);

        let quote = store
            .create_quote(quote_input(
                &customer.id,
                vec![line(&widget.id, 2, None, 10), line(&gadget.id, 1, None, 0)],
            ))
            .unwrap();

        assert_eq!(quote.line_items[0].line_total, Decimal::new(18000, 2));
        assert_eq!(quote.line_items[1].line_total, Decimal::new(5000, 2));
        assert_eq!(quote.subtotal, Decimal::new(23000, 2));
        assert_eq!(quote.tax_amount, Decimal::new(2300, 2));
        assert_eq!(quote.total, Decimal::new(25300, 2));
        assert_eq!(quote.status, QuoteStatus::Draft);
        assert_eq!(quote.customer_name, "Jo");
        assert_eq!(quote.valid_until - quote.issue_date, Duration::days(30));
    }

    #[test]
    fn unit_price_defaults_to_current_sell_price_snapshot() {
        let mut store = Store::in_memory();
        let customer = seed_customer(&mut store, "Jo");
        let widget = seed_product(&mut store, "WID-01", 100);

        let quote = store
            .create_quote(quote_input(&customer.id, vec![line(&widget.id, 1, None, 0)]))
            .unwrap();
        assert_eq!(quote.line_items[0].unit_price, Decimal::from(100));

        // A later price change must not rewrite the issued quote.
        store
            .update_product(
                &widget.id,
                crate::store::ProductPatch {
                    sell_price: Some(Decimal::from(999)),
                    ..crate::store::ProductPatch::default()
                },
            )
            .unwrap();
        let unchanged = store.quote(&quote.id).unwrap();
        assert_eq!(unchanged.line_items[0].unit_price, Decimal::from(100));
        assert_eq!(unchanged.total, quote.total);
    }

    #[test]
    fn validation_failures_throw() {
        let mut store = Store::in_memory();
        let customer = seed_customer(&mut store, "Jo");
        let widget = seed_product(&mut store, "WID-01", 100);

        let unknown_customer = store
            .create_quote(quote_input("cu-missing1", vec![line(&widget.id, 1, None, 0)]))
            .unwrap_err();
        assert!(matches!(unknown_customer, CoreError::Validation(_)));

        let empty = store
            .create_quote(quote_input(&customer.id, vec![]))
            .unwrap_err();
        assert!(matches!(empty, CoreError::Validation(_)));

        let unknown_product = store
            .create_quote(quote_input(&customer.id, vec![line("pd-missing1", 1, None, 0)]))
            .unwrap_err();
        assert!(matches!(unknown_product, CoreError::Validation(_)));

        let silly_discount = store
            .create_quote(quote_input(&customer.id, vec![line(&widget.id, 1, None, 150)]))
            .unwrap_err();
        assert!(matches!(silly_discount, CoreError::Validation(_)));

        assert!(store.data().quotes.is_empty(), "no partial quotes");
    }

    #[test]
    fn quote_numbers_increase_within_the_year() {
        let mut store = Store::in_memory();
        let customer = seed_customer(&mut store, "Jo");
        let widget = seed_product(&mut store, "WID-01", 100);

        let numbers: Vec<String> = (0..3)
            .map(|_| {
                store
                    .create_quote(quote_input(&customer.id, vec![line(&widget.id, 1, None, 0)]))
                    .unwrap()
                    .quote_number
            })
            .collect();

        assert_eq!(numbers.len(), 3);
        let mut sorted = numbers.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 3, "numbers are distinct");
        assert!(numbers.windows(2).all(|w| w[0] < w[1]), "strictly increasing");

        let year = chrono::Datelike::year(&chrono::Utc::now());
        assert!(numbers[0].starts_with(&format!("Q-{year}-")));
    }

    #[test]
    fn replacing_line_items_recomputes_totals() {
        let mut store = Store::in_memory();
        let customer = seed_customer(&mut store, "Jo");
        let widget = seed_product(&mut store, "WID-01", 100);
        let quote = store
            .create_quote(quote_input(&customer.id, vec![line(&widget.id, 2, None, 10)]))
            .unwrap();
        assert_eq!(quote.total, Decimal::new(19800, 2));

        let updated = store
            .update_quote(
                &quote.id,
                QuotePatch {
                    line_items: Some(vec![line(&widget.id, 1, Some(80), 0)]),
                    ..QuotePatch::default()
                },
            )
            .unwrap()
            .expect("exists");
        assert_eq!(updated.subtotal, Decimal::new(8000, 2));
        assert_eq!(updated.total, Decimal::new(8800, 2));
        assert_eq!(updated.quote_number, quote.quote_number, "number is stable");
    }

    #[test]
    fn tax_rate_change_alone_recomputes_tax_and_total() {
        let mut store = Store::in_memory();
        let customer = seed_customer(&mut store, "Jo");
        let widget = seed_product(&mut store, "WID-01", 100);
        let quote = store
            .create_quote(quote_input(&customer.id, vec![line(&widget.id, 1, None, 0)]))
            .unwrap();

        let updated = store
            .update_quote(
                &quote.id,
                QuotePatch {
                    tax_rate: Some(Decimal::ZERO),
                    ..QuotePatch::default()
                },
            )
            .unwrap()
            .expect("exists");
        assert_eq!(updated.subtotal, quote.subtotal);
        assert_eq!(updated.tax_amount, Decimal::ZERO);
        assert_eq!(updated.total, updated.subtotal);
        assert_eq!(updated.line_items, quote.line_items, "items preserved");
    }

    #[test]
    fn repointing_customer_refreshes_name_snapshot() {
        let mut store = Store::in_memory();
        let jo = seed_customer(&mut store, "Jo");
        let shop = seed_customer(&mut store, "Speed Shop");
        let widget = seed_product(&mut store, "WID-01", 100);
        let quote = store
            .create_quote(quote_input(&jo.id, vec![line(&widget.id, 1, None, 0)]))
            .unwrap();

        let updated = store
            .update_quote(
                &quote.id,
                QuotePatch {
                    customer_id: Some(shop.id.clone()),
                    ..QuotePatch::default()
                },
            )
            .unwrap()
            .expect("exists");
        assert_eq!(updated.customer_name, "Speed Shop");

        let bad = store
            .update_quote(
                &quote.id,
                QuotePatch {
                    customer_id: Some("cu-missing1".to_string()),
                    ..QuotePatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(bad, CoreError::Validation(_)));
    }

    #[test]
    fn status_change_reports_whether_it_changed() {
        let mut store = Store::in_memory();
        let customer = seed_customer(&mut store, "Jo");
        let widget = seed_product(&mut store, "WID-01", 100);
        let quote = store
            .create_quote(quote_input(&customer.id, vec![line(&widget.id, 1, None, 0)]))
            .unwrap();

        let change = store
            .update_quote_status(&quote.id, QuoteStatus::Sent)
            .unwrap()
            .expect("exists");
        assert!(change.changed);
        assert_eq!(change.previous, QuoteStatus::Draft);

        let noop = store
            .update_quote_status(&quote.id, QuoteStatus::Sent)
            .unwrap()
            .expect("exists");
        assert!(!noop.changed);

        assert!(
            store
                .update_quote_status("qt-missing1", QuoteStatus::Sent)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn filters_and_delete() {
        let mut store = Store::in_memory();
        let jo = seed_customer(&mut store, "Jo");
        let shop = seed_customer(&mut store, "Shop");
        let widget = seed_product(&mut store, "WID-01", 100);

        let for_jo = store
            .create_quote(quote_input(&jo.id, vec![line(&widget.id, 1, None, 0)]))
            .unwrap();
        store
            .create_quote(quote_input(&shop.id, vec![line(&widget.id, 1, None, 0)]))
            .unwrap();

        let jo_quotes = store.quotes(&QuoteFilters {
            customer_id: Some(jo.id.clone()),
            ..QuoteFilters::default()
        });
        assert_eq!(jo_quotes.len(), 1);

        assert!(store.delete_quote(&for_jo.id).unwrap());
        assert!(!store.delete_quote(&for_jo.id).unwrap());
        assert_eq!(store.data().quotes.len(), 1);
    }
}
