use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{check_command, move_command, tree_command};

#[derive(Parser, Debug)]
#[command(name = "modmove")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report the visibility conflicts moving a module file would cause
    #[command(visible_alias = "c")]
    Check {
        /// Module file to move (e.g., src/a/b.rs)
        file: String,

        /// New parent module (e.g., crate::c)
        #[arg(short, long)]
        to: String,

        /// Directory containing Cargo.toml (defaults to the nearest one above the file)
        #[arg(short, long)]
        manifest_dir: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a module file under a new parent module and fix every path
    #[command(visible_alias = "mv")]
    Move {
        /// Module file to move (e.g., src/a/b.rs)
        file: String,

        /// New parent module (e.g., crate::c)
        #[arg(short, long)]
        to: String,

        /// Directory containing Cargo.toml (defaults to the nearest one above the file)
        #[arg(short, long)]
        manifest_dir: Option<String>,

        /// Print the planned edits without writing anything
        #[arg(short, long)]
        dry_run: bool,

        /// Move even when conflicts are reported
        #[arg(short, long)]
        yes: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the module tree of every crate target
    #[command(visible_alias = "t")]
    Tree {
        /// Directory containing Cargo.toml (defaults to the current directory)
        #[arg(short, long)]
        manifest_dir: Option<String>,
    },
}

impl Commands {
    /// Execute the command
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Check {
                file,
                to,
                manifest_dir,
                json,
            } => check_command(&file, &to, manifest_dir.as_deref(), json),
            Commands::Move {
                file,
                to,
                manifest_dir,
                dry_run,
                yes,
                json,
            } => move_command(&file, &to, manifest_dir.as_deref(), dry_run, yes, json),
            Commands::Tree { manifest_dir } => tree_command(manifest_dir.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_move() {
        let cli = Cli::parse_from(["modmove", "mv", "src/a/b.rs", "--to", "crate::c", "-d"]);
        match cli.command {
            Commands::Move {
                file, to, dry_run, yes, ..
            } => {
                assert_eq!(file, "src/a/b.rs");
                assert_eq!(to, "crate::c");
                assert!(dry_run);
                assert!(!yes);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
