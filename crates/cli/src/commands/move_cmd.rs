use anyhow::{Context, Result, bail};
use modmove_core::{AlwaysConfirm, ConfirmationGate, MoveState, NoProgress, RejectConflicts};
use tracing::{debug, info};

use crate::display::{print_plan, print_report};
use crate::utils::{Project, resolve_file};

pub fn move_command(
    file: &str,
    to: &str,
    manifest_dir: Option<&str>,
    dry_run: bool,
    yes: bool,
    json: bool,
) -> Result<()> {
    let file = resolve_file(file)?;
    debug!("Moving {} into {} (dry run: {})", file.display(), to, dry_run);

    let project = Project::for_file(&file, manifest_dir)?;
    let gate: &dyn ConfirmationGate = if yes { &AlwaysConfirm } else { &RejectConflicts };
    let request = project.engine.request(&project.program, &file, to)?;
    let outcome = project
        .engine
        .plan(&project.program, request, gate, &NoProgress)
        .with_context(|| format!("Cannot move {} into {}", file.display(), to))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_report(&outcome.report);
        if outcome.state == MoveState::Done {
            print_plan(&project.program, &outcome.plan);
        }
    }

    if outcome.state != MoveState::Done {
        bail!("Move declined because of conflicts; pass --yes to move anyway");
    }
    if dry_run {
        return Ok(());
    }

    let applied = outcome
        .plan
        .apply(project.program.workspace())
        .context("Failed to apply the planned edits")?;
    applied
        .persist(&outcome.plan)
        .context("Failed to write the moved files")?;

    info!("Moved {} with {} edits", file.display(), outcome.plan.edit_count());
    if !json {
        if let Some(new_path) = &outcome.new_path {
            println!("\n✅ Moved to {}", new_path.display());
        }
    }
    Ok(())
}
