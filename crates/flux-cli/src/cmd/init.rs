//! `flux init` — create the `.flux/` workspace directory.

use anyhow::Context;
use serde::Serialize;

use flux_core::DataSet;

use crate::config::CliConfig;
use crate::output::{OutputMode, kv, render};
use crate::workspace::{DATA_FILE, FLUX_DIR};

#[derive(Debug, Serialize)]
struct InitOutput {
    flux_dir: String,
    created: bool,
}

pub fn run(mode: OutputMode) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let flux_dir = cwd.join(FLUX_DIR);

    let created = if flux_dir.is_dir() {
        false
    } else {
        std::fs::create_dir_all(&flux_dir)
            .with_context(|| format!("creating {}", flux_dir.display()))?;
        let data_path = flux_dir.join(DATA_FILE);
        let empty = serde_json::to_string_pretty(&DataSet::default())?;
        std::fs::write(&data_path, empty)
            .with_context(|| format!("writing {}", data_path.display()))?;
        CliConfig::write_default(&flux_dir)?;
        true
    };

    let out = InitOutput {
        flux_dir: flux_dir.display().to_string(),
        created,
    };
    render(mode, &out, |v, w| {
        if v.created {
            kv(w, "initialized", &v.flux_dir)
        } else {
            kv(w, "exists", &v.flux_dir)
        }
    })
}
