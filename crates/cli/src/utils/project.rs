use anyhow::{Context, Result};
use modmove_core::{MoveConfig, MoveEngine, Program, Workspace};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Engine plus a snapshot of the crates under one manifest directory
pub struct Project {
    pub engine: MoveEngine,
    pub program: Program,
}

impl Project {
    pub fn load(manifest_dir: &Path) -> Result<Self> {
        let config = MoveConfig::discover(manifest_dir)
            .with_context(|| format!("Failed to load config for {}", manifest_dir.display()))?;
        debug!("Using config: {:?}", config);

        let engine = MoveEngine::new(config)?;
        let workspace = Workspace::discover(manifest_dir)
            .with_context(|| format!("Failed to read crates under {}", manifest_dir.display()))?;
        let program = engine
            .snapshot(workspace)
            .context("Failed to build the module tree")?;
        Ok(Self { engine, program })
    }

    /// Project containing `file`, or the one at `manifest_dir` when given
    pub fn for_file(file: &Path, manifest_dir: Option<&str>) -> Result<Self> {
        let dir = match manifest_dir {
            Some(dir) => resolve_dir(dir)?,
            None => file
                .parent()
                .and_then(find_manifest_dir)
                .with_context(|| format!("No Cargo.toml found above {}", file.display()))?,
        };
        Self::load(&dir)
    }
}

/// Absolute, symlink-free path of an existing file
pub fn resolve_file(file: &str) -> Result<PathBuf> {
    std::fs::canonicalize(file).with_context(|| format!("File not found: {file}"))
}

pub fn resolve_dir(dir: &str) -> Result<PathBuf> {
    std::fs::canonicalize(dir).with_context(|| format!("Directory not found: {dir}"))
}

/// Nearest directory at or above `start` holding a Cargo.toml
pub fn find_manifest_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("Cargo.toml").is_file())
        .map(Path::to_path_buf)
}
