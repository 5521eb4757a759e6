use anyhow::{Context, Result};
use modmove_core::NoProgress;
use tracing::debug;

use crate::display::print_report;
use crate::utils::{Project, resolve_file};

pub fn check_command(file: &str, to: &str, manifest_dir: Option<&str>, json: bool) -> Result<()> {
    let file = resolve_file(file)?;
    debug!("Checking move of {} into {}", file.display(), to);

    let project = Project::for_file(&file, manifest_dir)?;
    let request = project.engine.request(&project.program, &file, to)?;
    let report = project
        .engine
        .check(&project.program, request, &NoProgress)
        .with_context(|| format!("Cannot move {} into {}", file.display(), to))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("🔍 Moving {} into {}", file.display(), to);
        println!("{}", "=".repeat(80));
        print_report(&report);
    }
    Ok(())
}
