use anyhow::Result;

use crate::display::print_tree;
use crate::utils::{Project, resolve_dir};

pub fn tree_command(manifest_dir: Option<&str>) -> Result<()> {
    let dir = resolve_dir(manifest_dir.unwrap_or("."))?;
    let project = Project::load(&dir)?;
    print_tree(&project.program);
    Ok(())
}
