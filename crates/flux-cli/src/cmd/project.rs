//! `flux project` — project CRUD.

use anyhow::bail;
use clap::{Args, Subcommand};
use serde_json::json;
use std::io::Write;

use flux_core::model::EventKind;
use flux_core::store::{NewProject, ProjectPatch};

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;

#[derive(Subcommand, Debug)]
pub enum ProjectCmd {
    /// Create a project.
    Add(AddArgs),
    /// List projects.
    List,
    /// Show one project with board counts.
    Show(IdArg),
    /// Rename or re-describe a project.
    Edit(EditArgs),
    /// Delete a project and everything on its board.
    Rm(IdArg),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project name.
    pub name: String,

    /// Optional description.
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Project id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Project id.
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

pub fn run(cmd: ProjectCmd, mode: OutputMode) -> anyhow::Result<()> {
    let mut ws = Workspace::discover()?;
    match cmd {
        ProjectCmd::Add(args) => {
            let project = ws.store.create_project(NewProject {
                name: args.name,
                description: args.description,
            })?;
            ws.notify(
                EventKind::ProjectCreated,
                json!({ "project": project }),
                Some(&project.id),
            )?;
            render(mode, &project, |p, w| {
                kv(w, "created", format!("{} ({})", p.name, p.id))
            })
        }
        ProjectCmd::List => {
            let projects = ws.store.projects().to_vec();
            render(mode, &projects, |projects, w| {
                for p in projects {
                    writeln!(w, "{}  {}", p.id, p.name)?;
                }
                Ok(())
            })
        }
        ProjectCmd::Show(args) => {
            let Some(project) = ws.store.project(&args.id).cloned() else {
                bail!("project '{}' not found", args.id);
            };
            let epics = ws.store.epics(Some(&project.id)).len();
            let tasks = ws
                .store
                .tasks(&flux_core::store::TaskFilters {
                    project_id: Some(project.id.clone()),
                    ..flux_core::store::TaskFilters::default()
                })
                .len();
            let out = json!({ "project": project, "epics": epics, "tasks": tasks });
            render(mode, &out, |v, w| {
                kv(w, "project", v["project"]["name"].as_str().unwrap_or(""))?;
                kv(w, "id", v["project"]["id"].as_str().unwrap_or(""))?;
                kv(w, "epics", v["epics"].to_string())?;
                kv(w, "tasks", v["tasks"].to_string())
            })
        }
        ProjectCmd::Edit(args) => {
            let Some(project) = ws.store.update_project(
                &args.id,
                ProjectPatch {
                    name: args.name,
                    description: args.description,
                },
            )?
            else {
                bail!("project '{}' not found", args.id);
            };
            ws.notify(
                EventKind::ProjectUpdated,
                json!({ "project": project }),
                Some(&project.id),
            )?;
            render(mode, &project, |p, w| kv(w, "updated", &p.id))
        }
        ProjectCmd::Rm(args) => {
            let Some(project) = ws.store.project(&args.id).cloned() else {
                bail!("project '{}' not found", args.id);
            };
            ws.store.delete_project(&args.id)?;
            ws.notify(
                EventKind::ProjectDeleted,
                json!({ "project": project }),
                Some(&project.id),
            )?;
            render(mode, &json!({ "deleted": args.id }), |v, w| {
                kv(w, "deleted", v["deleted"].as_str().unwrap_or(""))
            })
        }
    }
}
