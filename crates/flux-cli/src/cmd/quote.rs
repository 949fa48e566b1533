//! `flux quote` — quote creation and lifecycle.
//!
//! Line items are given as `--item <product_id>[:qty[:price[:discount]]]`;
//! omitted parts fall back to quantity 1, the product's current sell
//! price, and no discount.

use anyhow::{Context, bail};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::json;
use std::io::Write;
use std::str::FromStr;

use flux_core::model::{EventKind, QuoteStatus};
use flux_core::quote::{LineItemInput, QuoteFilters, QuoteInput, QuotePatch};

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;

#[derive(Subcommand, Debug)]
pub enum QuoteCmd {
    /// Create a quote for a customer.
    Add(AddArgs),
    /// List quotes.
    List(ListArgs),
    /// Show one quote with its line items.
    Show(IdArg),
    /// Move a quote to a new status.
    Status(StatusArgs),
    /// Replace a quote's line items and recompute totals.
    Reprice(RepriceArgs),
    /// Delete a quote.
    Rm(IdArg),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Customer id.
    #[arg(long)]
    pub customer: String,

    /// Line items: `<product_id>[:qty[:price[:discount]]]`, repeatable.
    #[arg(long = "item", required = true)]
    pub items: Vec<String>,

    /// Tax rate percent (defaults from config).
    #[arg(long = "tax-rate")]
    pub tax_rate: Option<Decimal>,

    /// Validity window in days (defaults from config).
    #[arg(long = "valid-days")]
    pub valid_days: Option<i64>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub terms: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Restrict to one customer.
    #[arg(long)]
    pub customer: Option<String>,

    /// Restrict to one status.
    #[arg(long)]
    pub status: Option<QuoteStatus>,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Quote id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Quote id.
    pub id: String,

    /// Target status.
    pub status: QuoteStatus,
}

#[derive(Args, Debug)]
pub struct RepriceArgs {
    /// Quote id.
    pub id: String,

    /// Replacement line items, same syntax as `quote add --item`.
    #[arg(long = "item", required = true)]
    pub items: Vec<String>,

    #[arg(long = "tax-rate")]
    pub tax_rate: Option<Decimal>,
}

/// Parse `<product_id>[:qty[:price[:discount]]]`.
fn parse_item(spec: &str) -> anyhow::Result<LineItemInput> {
    let mut parts = spec.split(':');
    let product_id = parts
        .next()
        .filter(|p| !p.is_empty())
        .with_context(|| format!("empty product id in item '{spec}'"))?
        .to_string();
    let mut numbers = parts.map(|part| {
        Decimal::from_str(part).with_context(|| format!("bad number '{part}' in item '{spec}'"))
    });
    let quantity = numbers.next().transpose()?;
    let unit_price = numbers.next().transpose()?;
    let discount = numbers.next().transpose()?;
    if numbers.next().is_some() {
        bail!("too many fields in item '{spec}'");
    }
    Ok(LineItemInput {
        product_id,
        quantity,
        unit_price,
        discount,
    })
}

fn parse_items(specs: &[String]) -> anyhow::Result<Vec<LineItemInput>> {
    specs.iter().map(|s| parse_item(s)).collect()
}

pub fn run(cmd: QuoteCmd, mode: OutputMode) -> anyhow::Result<()> {
    let mut ws = Workspace::discover()?;
    match cmd {
        QuoteCmd::Add(args) => {
            let default_rate = Decimal::try_from(ws.config.quote.tax_rate)
                .context("config quote.tax_rate is not a valid decimal")?;
            let quote = ws.store.create_quote(QuoteInput {
                customer_id: args.customer,
                line_items: parse_items(&args.items)?,
                tax_rate: Some(args.tax_rate.unwrap_or(default_rate)),
                valid_days: Some(args.valid_days.unwrap_or(ws.config.quote.valid_days)),
                status: None,
                notes: args.notes,
                terms: args.terms,
            })?;
            ws.notify(EventKind::QuoteCreated, json!({ "quote": quote }), None)?;
            render(mode, &quote, |q, w| {
                kv(w, "created", format!("{} ({})", q.quote_number, q.id))?;
                kv(w, "total", format!("{} inc. tax", q.total))
            })
        }
        QuoteCmd::List(args) => {
            let filters = QuoteFilters {
                customer_id: args.customer,
                status: args.status,
            };
            let quotes: Vec<_> = ws.store.quotes(&filters).into_iter().cloned().collect();
            render(mode, &quotes, |quotes, w| {
                for q in quotes {
                    writeln!(
                        w,
                        "{}  {}  {:<9}  {:>10}  {}",
                        q.id,
                        q.quote_number,
                        q.status.to_string(),
                        q.total.to_string(),
                        q.customer_name
                    )?;
                }
                Ok(())
            })
        }
        QuoteCmd::Show(args) => {
            let Some(quote) = ws.store.quote(&args.id).cloned() else {
                bail!("quote '{}' not found", args.id);
            };
            render(mode, &quote, |q, w| {
                kv(w, "quote", &q.quote_number)?;
                kv(w, "customer", format!("{} ({})", q.customer_name, q.customer_id))?;
                kv(w, "status", q.status.to_string())?;
                for li in &q.line_items {
                    writeln!(
                        w,
                        "  {:<16} {} x {} -{}% = {}",
                        li.product_sku, li.quantity, li.unit_price, li.discount, li.line_total
                    )?;
                }
                kv(w, "subtotal", q.subtotal.to_string())?;
                kv(w, "tax", format!("{} ({}%)", q.tax_amount, q.tax_rate))?;
                kv(w, "total", q.total.to_string())
            })
        }
        QuoteCmd::Status(args) => {
            let Some(change) = ws.store.update_quote_status(&args.id, args.status)? else {
                bail!("quote '{}' not found", args.id);
            };
            if change.changed {
                ws.notify(
                    EventKind::QuoteStatusChanged,
                    json!({
                        "quote": change.quote,
                        "previous": { "status": change.previous },
                    }),
                    None,
                )?;
            }
            render(mode, &change.quote, |q, w| {
                kv(w, "status", format!("{} -> {}", change.previous, q.status))
            })
        }
        QuoteCmd::Reprice(args) => {
            let Some(quote) = ws.store.update_quote(
                &args.id,
                QuotePatch {
                    customer_id: None,
                    line_items: Some(parse_items(&args.items)?),
                    tax_rate: args.tax_rate,
                    status: None,
                    notes: None,
                    terms: None,
                },
            )?
            else {
                bail!("quote '{}' not found", args.id);
            };
            ws.notify(EventKind::QuoteUpdated, json!({ "quote": quote }), None)?;
            render(mode, &quote, |q, w| {
                kv(w, "repriced", &q.quote_number)?;
                kv(w, "total", q.total.to_string())
            })
        }
        QuoteCmd::Rm(args) => {
            let Some(quote) = ws.store.quote(&args.id).cloned() else {
                bail!("quote '{}' not found", args.id);
            };
            ws.store.delete_quote(&args.id)?;
            ws.notify(EventKind::QuoteDeleted, json!({ "quote": quote }), None)?;
            render(mode, &json!({ "deleted": args.id }), |v, w| {
                kv(w, "deleted", v["deleted"].as_str().unwrap_or(""))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_item;
    use rust_decimal::Decimal;

    #[test]
    fn item_spec_parses_progressively() {
        let bare = parse_item("pd-abc12345").unwrap();
        assert_eq!(bare.product_id, "pd-abc12345");
        assert_eq!(bare.quantity, None);
        assert_eq!(bare.unit_price, None);
        assert_eq!(bare.discount, None);

        let full = parse_item("pd-abc12345:2:99.95:10").unwrap();
        assert_eq!(full.quantity, Some(Decimal::from(2)));
        assert_eq!(full.unit_price, Some(Decimal::new(9995, 2)));
        assert_eq!(full.discount, Some(Decimal::from(10)));
    }

    #[test]
    fn bad_item_specs_are_rejected() {
        assert!(parse_item("").is_err());
        assert!(parse_item("pd-x:two").is_err());
        assert!(parse_item("pd-x:1:2:3:4").is_err());
    }
}
