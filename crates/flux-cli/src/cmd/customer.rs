//! `flux customer` — registry CRUD.

use anyhow::bail;
use clap::{Args, Subcommand};
use serde_json::json;
use std::io::Write;

use flux_core::model::{CustomerKind, EventKind};
use flux_core::store::{CustomerFilters, CustomerPatch, NewCustomer};

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;

#[derive(Subcommand, Debug)]
pub enum CustomerCmd {
    /// Add a customer.
    Add(AddArgs),
    /// List/search customers.
    List(ListArgs),
    /// Change customer details.
    Edit(EditArgs),
    /// Soft-delete (deactivate) a customer.
    Rm(IdArg),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Customer or business name.
    pub name: String,

    /// individual or business (defaults to individual).
    #[arg(long)]
    pub kind: Option<CustomerKind>,

    #[arg(long)]
    pub contact: Option<String>,

    /// Unique email (case-insensitive).
    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub mobile: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub abn: Option<String>,

    /// Tags, repeatable.
    #[arg(long)]
    pub tag: Vec<String>,

    /// Where this customer came from.
    #[arg(long)]
    pub source: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub kind: Option<CustomerKind>,

    #[arg(long)]
    pub source: Option<String>,

    #[arg(long)]
    pub tag: Option<String>,

    #[arg(long)]
    pub active: Option<bool>,

    /// Substring search across name/contact/email/phone.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Customer id.
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub kind: Option<CustomerKind>,

    #[arg(long)]
    pub contact: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Customer id.
    pub id: String,
}

pub fn run(cmd: CustomerCmd, mode: OutputMode) -> anyhow::Result<()> {
    let mut ws = Workspace::discover()?;
    match cmd {
        CustomerCmd::Add(args) => {
            let customer = ws.store.create_customer(NewCustomer {
                name: args.name,
                kind: args.kind,
                contact_name: args.contact,
                email: args.email,
                phone: args.phone,
                mobile: args.mobile,
                address: args.address,
                abn: args.abn,
                tags: args.tag,
                source: args.source,
                notes: args.notes,
            })?;
            ws.notify(
                EventKind::CustomerCreated,
                json!({ "customer": customer }),
                None,
            )?;
            render(mode, &customer, |c, w| {
                kv(w, "created", format!("{} ({})", c.name, c.id))
            })
        }
        CustomerCmd::List(args) => {
            let filters = CustomerFilters {
                kind: args.kind,
                source: args.source,
                tag: args.tag,
                is_active: args.active,
                search: args.search,
            };
            let customers: Vec<_> = ws.store.customers(&filters).into_iter().cloned().collect();
            render(mode, &customers, |customers, w| {
                for c in customers {
                    let email = c.email.as_deref().unwrap_or("-");
                    let flag = if c.is_active { "" } else { " [inactive]" };
                    writeln!(w, "{}  {:<10}  {}  <{}>{}", c.id, c.kind.to_string(), c.name, email, flag)?;
                }
                Ok(())
            })
        }
        CustomerCmd::Edit(args) => {
            let Some(customer) = ws.store.update_customer(
                &args.id,
                CustomerPatch {
                    name: args.name,
                    kind: args.kind,
                    contact_name: args.contact,
                    email: args.email,
                    phone: args.phone,
                    mobile: None,
                    address: None,
                    abn: None,
                    tags: None,
                    source: None,
                    notes: args.notes,
                    is_active: args.active,
                },
            )?
            else {
                bail!("customer '{}' not found", args.id);
            };
            ws.notify(
                EventKind::CustomerUpdated,
                json!({ "customer": customer }),
                None,
            )?;
            render(mode, &customer, |c, w| kv(w, "updated", &c.id))
        }
        CustomerCmd::Rm(args) => {
            let Some(customer) = ws.store.customer(&args.id).cloned() else {
                bail!("customer '{}' not found", args.id);
            };
            ws.store.delete_customer(&args.id)?;
            ws.notify(
                EventKind::CustomerDeleted,
                json!({ "customer": customer }),
                None,
            )?;
            render(mode, &json!({ "deactivated": args.id }), |v, w| {
                kv(w, "deactivated", v["deactivated"].as_str().unwrap_or(""))
            })
        }
    }
}
