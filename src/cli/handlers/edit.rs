use std::path::Path;

use super::{CmdResult, metadata_from_pairs, parse_meta_args, report_warnings, resolve_id};
use crate::cli::commands::{AddArgs, EditArgs, MvArgs, RmArgs};
use crate::cli::output::EditJson;
use crate::io::document::{DocumentHost, FileDocument, edit_document};
use crate::io::settings::Settings;
use crate::model::edit::{NewTask, TaskEdit, TaskUpdate};
use crate::model::path::TaskPath;
use crate::model::status::Status;
use crate::model::task::{ParsedTask, TaskId};
use crate::parse::{ParsedBoard, parse_board_with};

/// An open document with its settings and a parse of its current text
struct Session {
    settings: Settings,
    doc: FileDocument,
    board: ParsedBoard,
}

impl Session {
    fn open(file: &Path, config: Option<&Path>, create: bool) -> Result<Session, Box<dyn std::error::Error>> {
        let settings = Settings::discover(file, config)?;
        let doc = if create {
            FileDocument::open_or_new(file)?
        } else {
            FileDocument::open(file)?
        };
        let board = parse_board_with(&doc.current_text()?, &settings.board)?;
        report_warnings(&board);
        Ok(Session {
            settings,
            doc,
            board,
        })
    }

    fn task(&self, raw_id: &str) -> Result<&ParsedTask, Box<dyn std::error::Error>> {
        let id = resolve_id(&self.board, raw_id)?;
        self.board
            .find_task(&id)
            .ok_or_else(|| format!("task not found: {}", id).into())
    }

    fn apply(&mut self, edit: &TaskEdit) -> Result<String, Box<dyn std::error::Error>> {
        Ok(edit_document(&mut self.doc, edit, &self.settings.board)?)
    }
}

fn single_line_title(title: &str) -> Result<String, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("title must not be empty".to_string());
    }
    if title.contains('\n') || title.contains('\r') {
        return Err("title must be a single line".to_string());
    }
    Ok(title.to_string())
}

fn report(json: bool, action: &'static str, id: &TaskId, title: Option<&str>) -> CmdResult {
    if json {
        let out = EditJson {
            action,
            id: id.to_string(),
            title: title.map(str::to_string),
        };
        println!("{}", serde_json::to_string(&out)?);
    } else {
        match title {
            Some(title) => println!("{} {} \"{}\"", action, id, title),
            None => println!("{} {}", action, id),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

pub fn cmd_add(args: AddArgs, config: Option<&Path>, json: bool) -> CmdResult {
    let mut session = Session::open(&args.file, config, true)?;
    let title = single_line_title(&args.title)?;
    let path = args.path.as_deref().map(TaskPath::parse).unwrap_or_default();
    let status = match args.status.as_deref() {
        Some(s) => Status::new(s)?,
        None => session.board.settings.open_status(),
    };
    let metadata = metadata_from_pairs(parse_meta_args(&args.meta)?);

    let edit = TaskEdit::Create(NewTask {
        title: title.clone(),
        path: path.clone(),
        status,
        metadata,
    });
    session.apply(&edit)?;
    report(json, "added", &TaskId::generate(&path, &title), Some(&title))
}

pub fn cmd_edit(args: EditArgs, config: Option<&Path>, json: bool) -> CmdResult {
    let mut session = Session::open(&args.file, config, false)?;
    let task = session.task(&args.id)?;

    let mut update = TaskUpdate::new(task.id.clone());
    if let Some(title) = args.title.as_deref() {
        update = update.with_title(single_line_title(title)?);
    }
    if let Some(status) = args.status.as_deref() {
        update = update.with_status(Status::new(status)?);
    }
    if let Some(path) = args.path.as_deref() {
        update = update.with_path(TaskPath::parse(path));
    }
    if !args.meta.is_empty() || !args.unset.is_empty() {
        let mut metadata = task.metadata.clone();
        for (key, value) in parse_meta_args(&args.meta)? {
            metadata.insert(key, value);
        }
        for key in &args.unset {
            metadata.remove(key.trim());
        }
        update = update.with_metadata(metadata);
    }
    if update == TaskUpdate::new(task.id.clone()) {
        return Err("nothing to change: pass --title, --status, --path, --meta or --unset".into());
    }

    let new_path = update.path.clone().unwrap_or_else(|| task.path.clone());
    let new_title = update.title.clone().unwrap_or_else(|| task.title.clone());
    session.apply(&TaskEdit::Update(update))?;
    report(json, "updated", &TaskId::generate(&new_path, &new_title), Some(&new_title))
}

pub fn cmd_mv(args: MvArgs, config: Option<&Path>, json: bool) -> CmdResult {
    let mut session = Session::open(&args.file, config, false)?;
    let task = session.task(&args.id)?;
    let path = TaskPath::parse(&args.path);
    let update = TaskUpdate::new(task.id.clone()).with_path(path.clone());
    let title = task.title.clone();

    session.apply(&TaskEdit::Update(update))?;
    report(json, "moved", &TaskId::generate(&path, &title), Some(&title))
}

pub fn cmd_rm(args: RmArgs, config: Option<&Path>, json: bool) -> CmdResult {
    let mut session = Session::open(&args.file, config, false)?;
    let id = session.task(&args.id)?.id.clone();

    session.apply(&TaskEdit::Delete { id: id.clone() })?;
    report(json, "deleted", &id, None)
}
