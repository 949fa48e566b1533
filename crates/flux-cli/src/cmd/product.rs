//! `flux product` — catalog CRUD.

use anyhow::bail;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::json;
use std::io::Write;

use flux_core::model::EventKind;
use flux_core::store::{NewProduct, ProductFilters, ProductPatch};

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;

#[derive(Subcommand, Debug)]
pub enum ProductCmd {
    /// Add a catalog entry.
    Add(AddArgs),
    /// List/search the catalog.
    List(ListArgs),
    /// Change price or details.
    Edit(EditArgs),
    /// Soft-delete (deactivate) a product.
    Rm(IdArg),
    /// Hard-delete a product for good.
    Purge(IdArg),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Unique SKU (case-insensitive).
    pub sku: String,

    /// Display name.
    #[arg(long)]
    pub name: String,

    /// Sell price.
    #[arg(long)]
    pub price: Decimal,

    #[arg(long)]
    pub cost: Option<Decimal>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub subcategory: Option<String>,

    #[arg(long)]
    pub brand: Option<String>,

    #[arg(long)]
    pub currency: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Fitment notes, repeatable.
    #[arg(long)]
    pub fitment: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub brand: Option<String>,

    /// Only active (or only inactive) products.
    #[arg(long)]
    pub active: Option<bool>,

    #[arg(long = "min-price")]
    pub min_price: Option<Decimal>,

    #[arg(long = "max-price")]
    pub max_price: Option<Decimal>,

    /// Substring search across sku/name/brand/category/description.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Product id.
    pub id: String,

    #[arg(long)]
    pub sku: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub price: Option<Decimal>,

    #[arg(long)]
    pub cost: Option<Decimal>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub brand: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Reactivate or deactivate.
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Product id.
    pub id: String,
}

pub fn run(cmd: ProductCmd, mode: OutputMode) -> anyhow::Result<()> {
    let mut ws = Workspace::discover()?;
    match cmd {
        ProductCmd::Add(args) => {
            let product = ws.store.create_product(NewProduct {
                sku: args.sku,
                name: args.name,
                category: args.category,
                subcategory: args.subcategory,
                brand: args.brand,
                cost_price: args.cost,
                sell_price: args.price,
                currency: args.currency,
                description: args.description,
                fitment: args.fitment,
            })?;
            ws.notify(EventKind::ProductCreated, json!({ "product": product }), None)?;
            render(mode, &product, |p, w| {
                kv(w, "created", format!("{} ({})", p.sku, p.id))
            })
        }
        ProductCmd::List(args) => {
            let filters = ProductFilters {
                category: args.category,
                subcategory: None,
                brand: args.brand,
                is_active: args.active,
                min_price: args.min_price,
                max_price: args.max_price,
                search: args.search,
            };
            let products: Vec<_> = ws.store.products(&filters).into_iter().cloned().collect();
            render(mode, &products, |products, w| {
                for p in products {
                    let flag = if p.is_active { "" } else { " [inactive]" };
                    writeln!(
                        w,
                        "{}  {:<16}  {} {}  {}{}",
                        p.id, p.sku, p.sell_price, p.currency, p.name, flag
                    )?;
                }
                Ok(())
            })
        }
        ProductCmd::Edit(args) => {
            let Some(product) = ws.store.update_product(
                &args.id,
                ProductPatch {
                    sku: args.sku,
                    name: args.name,
                    category: args.category,
                    subcategory: None,
                    brand: args.brand,
                    cost_price: args.cost,
                    sell_price: args.price,
                    currency: None,
                    description: args.description,
                    fitment: None,
                    is_active: args.active,
                },
            )?
            else {
                bail!("product '{}' not found", args.id);
            };
            ws.notify(EventKind::ProductUpdated, json!({ "product": product }), None)?;
            render(mode, &product, |p, w| kv(w, "updated", &p.id))
        }
        ProductCmd::Rm(args) => {
            let Some(product) = ws.store.product(&args.id).cloned() else {
                bail!("product '{}' not found", args.id);
            };
            ws.store.delete_product(&args.id)?;
            ws.notify(EventKind::ProductDeleted, json!({ "product": product }), None)?;
            render(mode, &json!({ "deactivated": args.id }), |v, w| {
                kv(w, "deactivated", v["deactivated"].as_str().unwrap_or(""))
            })
        }
        ProductCmd::Purge(args) => {
            if !ws.store.purge_product(&args.id)? {
                bail!("product '{}' not found", args.id);
            }
            render(mode, &json!({ "purged": args.id }), |v, w| {
                kv(w, "purged", v["purged"].as_str().unwrap_or(""))
            })
        }
    }
}
