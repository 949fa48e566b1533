//! `flux cleanup` — archive done tasks and delete empty epics.

use anyhow::bail;
use clap::Args;
use serde_json::json;

use flux_core::graph::CleanupOptions;
use flux_core::model::EventKind;

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Project to sweep.
    #[arg(long)]
    pub project: String,

    /// Skip the done-task archive sweep.
    #[arg(long = "no-tasks")]
    pub no_tasks: bool,

    /// Skip the empty-epic delete sweep.
    #[arg(long = "no-epics")]
    pub no_epics: bool,
}

pub fn run(args: CleanupArgs, mode: OutputMode) -> anyhow::Result<()> {
    let mut ws = Workspace::discover()?;
    if ws.store.project(&args.project).is_none() {
        bail!("project '{}' not found", args.project);
    }

    let mut archived_tasks = 0;
    let mut deleted_epics = 0;
    let options = CleanupOptions {
        archive_tasks: !args.no_tasks,
        archive_epics: !args.no_epics,
    };

    if options.archive_tasks {
        let archived = ws.store.archive_done_tasks(&args.project)?;
        archived_tasks = archived.len();
        for task in archived {
            ws.notify(
                EventKind::TaskArchived,
                json!({ "task": task }),
                Some(&args.project),
            )?;
        }
    }
    if options.archive_epics {
        let deleted = ws.store.archive_empty_epics(&args.project)?;
        deleted_epics = deleted.len();
        for epic in deleted {
            ws.notify(
                EventKind::EpicDeleted,
                json!({ "epic": epic }),
                Some(&args.project),
            )?;
        }
    }

    let out = json!({
        "project": args.project,
        "archived_tasks": archived_tasks,
        "deleted_epics": deleted_epics,
    });
    render(mode, &out, |v, w| {
        kv(w, "archived", format!("{} task(s)", v["archived_tasks"]))?;
        kv(w, "deleted", format!("{} empty epic(s)", v["deleted_epics"]))
    })
}
