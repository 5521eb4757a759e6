//! Source files and crate roots a [`Program`](super::Program) is built from.

use crate::error::{Error, Result};
use crate::refactor::edits::EditPlan;
use cargo_toml::Manifest;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// In-memory view of a set of crates.
///
/// Paths are kept exactly as added (after lexical normalization), so a
/// workspace built from relative paths in tests never touches the disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    files: BTreeMap<PathBuf, String>,
    crate_roots: Vec<PathBuf>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert_file(path, text);
        self
    }

    pub fn with_crate_root(mut self, path: impl AsRef<Path>) -> Self {
        self.add_crate_root(path);
        self
    }

    pub fn insert_file(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), text.into());
    }

    pub fn remove_file(&mut self, path: &Path) -> Option<String> {
        self.files.remove(&normalize(path))
    }

    pub fn add_crate_root(&mut self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        if !self.crate_roots.contains(&path) {
            self.crate_roots.push(path);
        }
    }

    /// Load every crate target of the package or workspace at `manifest_dir`
    pub fn discover(manifest_dir: &Path) -> Result<Self> {
        let manifest_dir = normalize(manifest_dir);
        let manifest = read_manifest(&manifest_dir)?;
        let mut workspace = Workspace::new(&manifest_dir);

        let mut package_dirs = Vec::new();
        if manifest.package.is_some() {
            package_dirs.push(manifest_dir.clone());
        }
        if let Some(members) = manifest.workspace.as_ref().map(|w| &w.members) {
            for member in members {
                package_dirs.extend(expand_member(&manifest_dir, member));
            }
        }

        for dir in package_dirs {
            workspace.add_package(&dir)?;
        }

        info!(
            "Discovered {} crate roots and {} source files under {}",
            workspace.crate_roots.len(),
            workspace.files.len(),
            manifest_dir.display()
        );
        Ok(workspace)
    }

    fn add_package(&mut self, dir: &Path) -> Result<()> {
        let manifest = read_manifest(dir)?;

        let mut roots = Vec::new();
        if let Some(lib) = &manifest.lib {
            roots.push(dir.join(lib.path.as_deref().unwrap_or("src/lib.rs")));
        }
        for bin in &manifest.bin {
            if let Some(path) = &bin.path {
                roots.push(dir.join(path));
            }
        }
        for conventional in ["src/lib.rs", "src/main.rs"] {
            roots.push(dir.join(conventional));
        }

        for entry in WalkDir::new(dir.join("src"))
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                let text = std::fs::read_to_string(path)?;
                self.insert_file(path, text);
            }
        }

        for root in roots {
            let root = normalize(&root);
            if !self.files.contains_key(&root) && root.is_file() {
                let text = std::fs::read_to_string(&root)?;
                self.files.insert(root.clone(), text);
            }
            if self.files.contains_key(&root) {
                debug!("crate root {}", root.display());
                self.add_crate_root(&root);
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn crate_roots(&self) -> &[PathBuf] {
        &self.crate_roots
    }

    pub fn files(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, t)| (p.as_path(), t.as_str()))
    }

    pub fn file_text(&self, path: &Path) -> Option<&str> {
        self.files.get(&normalize(path)).map(String::as_str)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize(path))
    }

    /// Write the files `plan` touched, then perform its file move, on disk.
    ///
    /// `self` must be the workspace `plan` was applied to.
    pub fn persist(&self, plan: &EditPlan) -> Result<()> {
        if let Some(file_move) = plan.file_move() {
            if let Some(parent) = file_move.to.parent() {
                std::fs::create_dir_all(parent)?;
            }
            info!(
                "Moving {} to {}",
                file_move.from.display(),
                file_move.to.display()
            );
            std::fs::rename(&file_move.from, &file_move.to)?;
        }

        for path in plan.edited_files() {
            let path = plan.moved_path(path);
            let text = self.file_text(&path).ok_or_else(|| {
                Error::ModuleError(format!("{} is missing from the workspace", path.display()))
            })?;
            debug!("Writing {}", path.display());
            std::fs::write(&path, text)?;
        }
        Ok(())
    }
}

fn read_manifest(dir: &Path) -> Result<Manifest> {
    let cargo_toml_path = dir.join("Cargo.toml");
    Manifest::from_path(&cargo_toml_path).map_err(|e| {
        Error::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to parse {}: {e}", cargo_toml_path.display()),
        ))
    })
}

/// Workspace members, with a trailing `/*` expanded one level
fn expand_member(root: &Path, member: &str) -> Vec<PathBuf> {
    match member.strip_suffix("/*") {
        Some(parent) => std::fs::read_dir(root.join(parent))
            .map(|entries| {
                let mut dirs: Vec<PathBuf> = entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.join("Cargo.toml").is_file())
                    .collect();
                dirs.sort();
                dirs
            })
            .unwrap_or_default(),
        None => vec![root.join(member)],
    }
}

/// Lexically resolve `.` and `..` components
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
