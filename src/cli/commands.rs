use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mdb", about = concat!("mdboard v", env!("CARGO_PKG_VERSION"), " - a task board in a Markdown file"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Settings file (default: mdboard.toml next to the document)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks
    List(ListArgs),
    /// Show tasks grouped into status columns
    Board(FileArg),
    /// List the headings tasks can be placed under
    Headings(FileArg),
    /// Report duplicate tasks, unknown statuses and bad dates
    Check(FileArg),
    /// Add a task under a heading
    Add(AddArgs),
    /// Change a task's title, status, heading or metadata
    Edit(EditArgs),
    /// Move a task under another heading
    Mv(MvArgs),
    /// Delete a task
    Rm(RmArgs),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct FileArg {
    /// Markdown board document
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ListArgs {
    /// Markdown board document
    pub file: PathBuf,
    /// Only tasks with this status
    #[arg(long)]
    pub status: Option<String>,
    /// Only tasks at or below this heading path ("A / B")
    #[arg(long)]
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Markdown board document (created if missing)
    pub file: PathBuf,
    /// Task title
    pub title: String,
    /// Heading path to add under ("A / B"; default: top of document)
    #[arg(long)]
    pub path: Option<String>,
    /// Initial status (default: the board's default status)
    #[arg(long)]
    pub status: Option<String>,
    /// Metadata entry, key=value (repeatable)
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    pub meta: Vec<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Markdown board document
    pub file: PathBuf,
    /// Task ID (or a unique prefix)
    pub id: String,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New status
    #[arg(long)]
    pub status: Option<String>,
    /// Move under this heading path
    #[arg(long)]
    pub path: Option<String>,
    /// Set a metadata entry, key=value (repeatable)
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    pub meta: Vec<String>,
    /// Remove a metadata entry (repeatable)
    #[arg(long, value_name = "KEY")]
    pub unset: Vec<String>,
}

#[derive(Args)]
pub struct MvArgs {
    /// Markdown board document
    pub file: PathBuf,
    /// Task ID (or a unique prefix)
    pub id: String,
    /// Destination heading path ("A / B"; "(root)" for the top of the document)
    pub path: String,
}

#[derive(Args)]
pub struct RmArgs {
    /// Markdown board document
    pub file: PathBuf,
    /// Task ID (or a unique prefix)
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_edit_with_repeated_flags() {
        let cli = Cli::try_parse_from([
            "mdb", "edit", "board.md", "abc123", "--meta", "priority=high", "--meta", "due=2025-01-15",
            "--unset", "owner", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Edit(args) => {
                assert_eq!(args.id, "abc123");
                assert_eq!(args.meta, vec!["priority=high", "due=2025-01-15"]);
                assert_eq!(args.unset, vec!["owner"]);
                assert!(args.title.is_none());
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["mdb", "board", "board.md", "--config", "alt.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
    }
}
