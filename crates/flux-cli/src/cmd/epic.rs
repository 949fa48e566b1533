//! `flux epic` — epic CRUD within a project.

use anyhow::bail;
use clap::{Args, Subcommand};
use serde_json::json;
use std::io::Write;

use flux_core::model::{EventKind, Status};
use flux_core::store::{EpicPatch, NewEpic};

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;

#[derive(Subcommand, Debug)]
pub enum EpicCmd {
    /// Create an epic.
    Add(AddArgs),
    /// List epics, optionally for one project.
    List(ListArgs),
    /// Change an epic's title, status, or notes.
    Edit(EditArgs),
    /// Delete an epic; its tasks survive unassigned.
    Rm(IdArg),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Epic title.
    pub title: String,

    /// Owning project id.
    #[arg(long)]
    pub project: String,

    /// Initial status (defaults to planning).
    #[arg(long)]
    pub status: Option<Status>,

    /// Epic ids this epic depends on.
    #[arg(long = "depends-on")]
    pub depends_on: Vec<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Restrict to one project.
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Epic id.
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub status: Option<Status>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Epic id.
    pub id: String,
}

pub fn run(cmd: EpicCmd, mode: OutputMode) -> anyhow::Result<()> {
    let mut ws = Workspace::discover()?;
    match cmd {
        EpicCmd::Add(args) => {
            let epic = ws.store.create_epic(NewEpic {
                title: args.title,
                project_id: args.project,
                status: args.status,
                depends_on: args.depends_on,
                notes: args.notes,
            })?;
            ws.notify(
                EventKind::EpicCreated,
                json!({ "epic": epic }),
                Some(&epic.project_id),
            )?;
            render(mode, &epic, |e, w| {
                kv(w, "created", format!("{} ({})", e.title, e.id))
            })
        }
        EpicCmd::List(args) => {
            let epics: Vec<_> = ws
                .store
                .epics(args.project.as_deref())
                .into_iter()
                .cloned()
                .collect();
            render(mode, &epics, |epics, w| {
                for e in epics {
                    writeln!(w, "{}  {:<11}  {}", e.id, e.status.to_string(), e.title)?;
                }
                Ok(())
            })
        }
        EpicCmd::Edit(args) => {
            let Some(epic) = ws.store.update_epic(
                &args.id,
                EpicPatch {
                    title: args.title,
                    status: args.status,
                    depends_on: None,
                    notes: args.notes,
                },
            )?
            else {
                bail!("epic '{}' not found", args.id);
            };
            ws.notify(
                EventKind::EpicUpdated,
                json!({ "epic": epic }),
                Some(&epic.project_id),
            )?;
            render(mode, &epic, |e, w| kv(w, "updated", &e.id))
        }
        EpicCmd::Rm(args) => {
            let Some(epic) = ws.store.epic(&args.id).cloned() else {
                bail!("epic '{}' not found", args.id);
            };
            ws.store.delete_epic(&args.id)?;
            ws.notify(
                EventKind::EpicDeleted,
                json!({ "epic": epic }),
                Some(&epic.project_id),
            )?;
            render(mode, &json!({ "deleted": args.id }), |v, w| {
                kv(w, "deleted", v["deleted"].as_str().unwrap_or(""))
            })
        }
    }
}
