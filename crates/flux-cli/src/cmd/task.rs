//! `flux task` — task CRUD, dependencies, and status moves.

use anyhow::bail;
use clap::{Args, Subcommand};
use serde_json::json;
use std::io::Write;

use flux_core::model::{EventKind, Status};
use flux_core::store::{NewTask, TaskFilters};

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;

#[derive(Subcommand, Debug)]
pub enum TaskCmd {
    /// Create a task.
    Add(AddArgs),
    /// List tasks with filters.
    List(ListArgs),
    /// Show one task, including blockers.
    Show(IdArg),
    /// Move a task to a new status.
    Status(StatusArgs),
    /// Delete a task and prune dependency references to it.
    Rm(IdArg),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task title.
    pub title: String,

    /// Owning project id.
    #[arg(long)]
    pub project: String,

    /// Optional owning epic id.
    #[arg(long)]
    pub epic: Option<String>,

    /// Initial status (defaults to planning).
    #[arg(long)]
    pub status: Option<Status>,

    /// Task ids this task depends on.
    #[arg(long = "depends-on")]
    pub depends_on: Vec<String>,

    /// Agent or person the task is assigned to.
    #[arg(long)]
    pub agent: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Restrict to one project.
    #[arg(long)]
    pub project: Option<String>,

    /// Restrict to one epic.
    #[arg(long)]
    pub epic: Option<String>,

    /// Restrict to one status.
    #[arg(long)]
    pub status: Option<Status>,

    /// Restrict to one assignee.
    #[arg(long)]
    pub agent: Option<String>,

    /// Include archived tasks.
    #[arg(long)]
    pub archived: bool,

    /// Only tasks that are ready to pick up (requires --project).
    #[arg(long)]
    pub ready: bool,

    /// Substring search over title and notes.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Task id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Task id.
    pub id: String,

    /// Target status.
    pub status: Status,
}

pub fn run(cmd: TaskCmd, mode: OutputMode) -> anyhow::Result<()> {
    let mut ws = Workspace::discover()?;
    match cmd {
        TaskCmd::Add(args) => {
            let task = ws.store.create_task(NewTask {
                title: args.title,
                project_id: args.project,
                epic_id: args.epic,
                status: args.status,
                depends_on: args.depends_on,
                notes: args.notes,
                agent: args.agent,
            })?;
            ws.notify(
                EventKind::TaskCreated,
                json!({ "task": task }),
                Some(&task.project_id),
            )?;
            render(mode, &task, |t, w| {
                kv(w, "created", format!("{} ({})", t.title, t.id))
            })
        }
        TaskCmd::List(args) => {
            if args.ready {
                let Some(project) = args.project.as_deref() else {
                    bail!("--ready requires --project");
                };
                let ready: Vec<_> = ws.store.ready_tasks(project).into_iter().cloned().collect();
                return render(mode, &ready, |tasks, w| {
                    for t in tasks {
                        writeln!(w, "{}  {:<11}  {}", t.id, t.status.to_string(), t.title)?;
                    }
                    Ok(())
                });
            }
            let filters = TaskFilters {
                project_id: args.project,
                epic_id: args.epic,
                status: args.status,
                agent: args.agent,
                include_archived: args.archived,
                search: args.search,
            };
            let tasks: Vec<_> = ws.store.tasks(&filters).into_iter().cloned().collect();
            let blocked: Vec<bool> = tasks.iter().map(|t| ws.store.is_blocked(&t.id)).collect();
            render(mode, &tasks, |tasks, w| {
                for (t, is_blocked) in tasks.iter().zip(&blocked) {
                    let flag = if *is_blocked { " [blocked]" } else { "" };
                    writeln!(
                        w,
                        "{}  {:<11}  {}{}",
                        t.id,
                        t.status.to_string(),
                        t.title,
                        flag
                    )?;
                }
                Ok(())
            })
        }
        TaskCmd::Show(args) => {
            let Some(task) = ws.store.task(&args.id).cloned() else {
                bail!("task '{}' not found", args.id);
            };
            let blockers: Vec<_> = ws.store.blockers(&args.id).into_iter().cloned().collect();
            let out = json!({
                "task": task,
                "blocked": !blockers.is_empty(),
                "blockers": blockers,
            });
            render(mode, &out, |v, w| {
                kv(w, "task", v["task"]["title"].as_str().unwrap_or(""))?;
                kv(w, "id", v["task"]["id"].as_str().unwrap_or(""))?;
                kv(w, "status", v["task"]["status"].as_str().unwrap_or(""))?;
                kv(w, "blocked", v["blocked"].to_string())?;
                if let Some(blockers) = v["blockers"].as_array() {
                    for b in blockers {
                        kv(
                            w,
                            "waiting on",
                            format!(
                                "{} ({})",
                                b["title"].as_str().unwrap_or(""),
                                b["id"].as_str().unwrap_or("")
                            ),
                        )?;
                    }
                }
                Ok(())
            })
        }
        TaskCmd::Status(args) => {
            let Some(change) = ws.store.update_task_status(&args.id, args.status)? else {
                bail!("task '{}' not found", args.id);
            };
            if change.changed {
                ws.notify(
                    EventKind::TaskStatusChanged,
                    json!({
                        "task": change.task,
                        "previous": { "status": change.previous },
                    }),
                    Some(&change.task.project_id),
                )?;
            }
            render(mode, &change.task, |t, w| {
                kv(w, "status", format!("{} -> {}", change.previous, t.status))
            })
        }
        TaskCmd::Rm(args) => {
            let Some(task) = ws.store.task(&args.id).cloned() else {
                bail!("task '{}' not found", args.id);
            };
            ws.store.delete_task(&args.id)?;
            ws.notify(
                EventKind::TaskDeleted,
                json!({ "task": task }),
                Some(&task.project_id),
            )?;
            render(mode, &json!({ "deleted": args.id }), |v, w| {
                kv(w, "deleted", v["deleted"].as_str().unwrap_or(""))
            })
        }
    }
}
