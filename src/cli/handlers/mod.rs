mod edit;
pub use edit::{cmd_add, cmd_edit, cmd_mv, cmd_rm};

use std::path::Path;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::document::{DocumentHost, FileDocument, HostError};
use crate::io::settings::Settings;
use crate::model::path::TaskPath;
use crate::model::task::{ParsedTask, TaskId, TaskMetadata};
use crate::ops::board_view::{build_board, passes_filter};
use crate::ops::check::check_board;
use crate::parse::{ParsedBoard, parse_board_with};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Shortest id prefix accepted on the command line
pub const MIN_ID_PREFIX: usize = 4;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let config = cli.config.as_deref();

    match cli.command {
        // Read commands
        Commands::List(args) => cmd_list(args, config, json),
        Commands::Board(args) => cmd_board(args, config, json),
        Commands::Headings(args) => cmd_headings(args, config, json),
        Commands::Check(args) => cmd_check(args, config, json),

        // Write commands
        Commands::Add(args) => cmd_add(args, config, json),
        Commands::Edit(args) => cmd_edit(args, config, json),
        Commands::Mv(args) => cmd_mv(args, config, json),
        Commands::Rm(args) => cmd_rm(args, config, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parsed document plus the settings it was parsed with
struct Loaded {
    settings: Settings,
    board: ParsedBoard,
}

/// Parse the document for a read command. A missing file reads as an empty
/// board.
fn load_board(file: &Path, config: Option<&Path>) -> Result<Loaded, Box<dyn std::error::Error>> {
    let settings = Settings::discover(file, config)?;
    let text = match FileDocument::open(file) {
        Ok(doc) => doc.current_text()?,
        Err(HostError::NoActiveDocument(path)) => {
            tracing::debug!(path = %path.display(), "no document; showing an empty board");
            String::new()
        }
        Err(e) => return Err(e.into()),
    };
    let board = parse_board_with(&text, &settings.board)?;
    report_warnings(&board);
    Ok(Loaded { settings, board })
}

fn report_warnings(board: &ParsedBoard) {
    for warning in &board.warnings {
        tracing::warn!("{}", warning);
    }
}

/// Resolve a full id or a unique prefix of one
pub(crate) fn resolve_id(board: &ParsedBoard, raw: &str) -> Result<TaskId, String> {
    let raw = raw.trim().to_ascii_lowercase();
    if let Some(task) = board.tasks.iter().find(|t| t.id.as_str() == raw) {
        return Ok(task.id.clone());
    }
    if raw.len() < MIN_ID_PREFIX {
        return Err(format!(
            "task not found: {} (use at least {} characters of the id)",
            raw, MIN_ID_PREFIX
        ));
    }
    let mut candidates: Vec<&TaskId> = board
        .tasks
        .iter()
        .map(|t| &t.id)
        .filter(|id| id.as_str().starts_with(&raw))
        .collect();
    candidates.sort();
    candidates.dedup();
    match candidates.as_slice() {
        [] => Err(format!("task not found: {}", raw)),
        [id] => Ok((*id).clone()),
        _ => Err(format!(
            "ambiguous id prefix {} matches {} tasks",
            raw,
            candidates.len()
        )),
    }
}

/// Parse `key=value` pairs from repeated `--meta` flags
pub(crate) fn parse_meta_args(args: &[String]) -> Result<Vec<(String, String)>, String> {
    args.iter()
        .map(|arg| {
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| format!("invalid --meta '{}': expected KEY=VALUE", arg))?;
            let key = key.trim();
            if key.is_empty() || key.contains(':') {
                return Err(format!("invalid metadata key '{}'", key));
            }
            if key == crate::model::task::STATUS_KEY {
                return Err("use --status to set the status".to_string());
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub(crate) fn metadata_from_pairs(pairs: Vec<(String, String)>) -> TaskMetadata {
    pairs.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, config: Option<&Path>, json: bool) -> CmdResult {
    let loaded = load_board(&args.file, config)?;
    let path_filter: Vec<TaskPath> = args.path.as_deref().map(TaskPath::parse).into_iter().collect();
    let status_filter = args.status.as_deref().map(str::trim);

    let tasks: Vec<&ParsedTask> = loaded
        .board
        .tasks
        .iter()
        .filter(|t| passes_filter(&t.path, &path_filter))
        .filter(|t| status_filter.is_none_or(|s| t.status.as_str() == s))
        .collect();

    if json {
        let out = TaskListJson {
            tasks: tasks.iter().map(|t| task_to_json(t)).collect(),
            warnings: loaded.board.warnings.iter().map(|w| w.to_string()).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if tasks.is_empty() {
        println!("No tasks.");
    } else {
        for line in format_task_listing(&tasks, loaded.settings.output.title_width) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_board(args: FileArg, config: Option<&Path>, json: bool) -> CmdResult {
    let loaded = load_board(&args.file, config)?;
    let view = build_board(&loaded.board, &loaded.board.settings);

    if json {
        println!("{}", serde_json::to_string_pretty(&board_to_json(&view))?);
    } else {
        for line in format_board(&view, loaded.settings.output.title_width) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_headings(args: FileArg, config: Option<&Path>, json: bool) -> CmdResult {
    let loaded = load_board(&args.file, config)?;
    let headings = &loaded.board.headings;

    if json {
        let out: Vec<HeadingJson> = headings.iter().map(heading_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if headings.is_empty() {
        println!("No headings.");
    } else {
        for line in format_headings(headings) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_check(args: FileArg, config: Option<&Path>, json: bool) -> CmdResult {
    let loaded = load_board(&args.file, config)?;
    let result = check_board(&loaded.board);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in format_check(&result) {
            println!("{}", line);
        }
    }

    if !result.valid {
        std::process::exit(1);
    }
    Ok(())
}
