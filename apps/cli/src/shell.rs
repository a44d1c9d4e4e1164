//! Interactive session that keeps the preview and selection alive between
//! commands.

use std::{io::Write, path::PathBuf, str::FromStr};

use anyhow::Result;
use client_core::{view, PreviewCard, WorkflowController};
use shared::domain::QueryParams;
use tokio::io::{AsyncBufReadExt, BufReader};

const PROMPT: &str = "renamer> ";

const HELP: &str = "\
commands:
  set <field> <value>   field: sub | clase | fecha | lote | angulo | base | upload-sub
  show                  print the current form fields
  upload <file>...      upload files into upload-sub
  list                  fetch the preview listing
  toggle <n|name>...    flip the checkbox of cards by position or name
  all | none            select every card / clear the selection
  rename                rename the selected images and refresh
  download              download the selected images as a ZIP
  download-all          download the whole subfolder as a ZIP
  pick-base             ask the backend to pick a base folder
  open                  ask the backend to open the base folder
  help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Subfolder,
    Clase,
    Fecha,
    Lote,
    Angulo,
    Base,
    UploadSubfolder,
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sub" | "subcarpeta" => Ok(Self::Subfolder),
            "clase" => Ok(Self::Clase),
            "fecha" => Ok(Self::Fecha),
            "lote" => Ok(Self::Lote),
            "angulo" => Ok(Self::Angulo),
            "base" => Ok(Self::Base),
            "upload-sub" => Ok(Self::UploadSubfolder),
            other => Err(format!("unknown field '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Set { field: FormField, value: String },
    Show,
    Upload(Vec<PathBuf>),
    List,
    Toggle(Vec<String>),
    SelectAll,
    SelectNone,
    Rename,
    Download,
    DownloadAll,
    PickBase,
    Open,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    let Some((verb, rest)) = split_verb(line) else {
        return Ok(None);
    };
    let args: Vec<String> = rest.split_whitespace().map(str::to_string).collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "set" => {
            let Some((field, value)) = split_verb(rest) else {
                return Err("usage: set <field> <value>".into());
            };
            ShellCommand::Set {
                field: field.parse()?,
                value: value.to_string(),
            }
        }
        "show" => ShellCommand::Show,
        "upload" => ShellCommand::Upload(args.into_iter().map(PathBuf::from).collect()),
        "list" | "preview" => ShellCommand::List,
        "toggle" | "t" if !args.is_empty() => ShellCommand::Toggle(args),
        "toggle" | "t" => return Err("usage: toggle <n|name>...".into()),
        "all" => ShellCommand::SelectAll,
        "none" => ShellCommand::SelectNone,
        "rename" => ShellCommand::Rename,
        "download" => ShellCommand::Download,
        "download-all" => ShellCommand::DownloadAll,
        "pick-base" => ShellCommand::PickBase,
        "open" => ShellCommand::Open,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

fn split_verb(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => Some((verb, rest.trim())),
        None => Some((line, "")),
    }
}

/// Maps toggle arguments to card names. Numbers are 1-based positions;
/// anything else is taken as a file name.
pub fn resolve_card_tokens(cards: &[PreviewCard], tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .filter_map(|token| match token.parse::<usize>() {
            Ok(position) if position >= 1 => cards
                .get(position - 1)
                .map(|card| card.item.name.clone()),
            _ => cards
                .iter()
                .find(|card| &card.item.name == token)
                .map(|card| card.item.name.clone()),
        })
        .collect()
}

pub struct ShellSession {
    controller: WorkflowController,
    query: QueryParams,
    upload_subfolder: String,
}

impl ShellSession {
    pub fn new(controller: WorkflowController, query: QueryParams) -> Self {
        let upload_subfolder = query.subcarpeta.clone();
        let mut session = Self {
            controller,
            query,
            upload_subfolder,
        };
        let base = session.query.base.take();
        session.controller.set_base(base);
        session
    }

    pub fn set_field(&mut self, field: FormField, value: String) {
        match field {
            FormField::Subfolder => self.query.subcarpeta = value,
            FormField::Clase => self.query.clase = value,
            FormField::Fecha => self.query.fecha = value,
            FormField::Lote => self.query.lote = value,
            FormField::Angulo => self.query.angulo = value,
            FormField::Base => self.controller.set_base(Some(value)),
            FormField::UploadSubfolder => self.upload_subfolder = value,
        }
    }

    pub fn form_text(&self) -> String {
        format!(
            "sub={:?} clase={:?} fecha={:?} lote={:?} angulo={:?} base={:?} upload-sub={:?}",
            self.query.subcarpeta,
            self.query.clase,
            self.query.fecha,
            self.query.lote,
            self.query.angulo,
            self.controller.state().base.as_deref().unwrap_or(""),
            self.upload_subfolder
        )
    }

    /// Runs one command. Returns `false` once the session should end.
    pub async fn execute(&mut self, command: ShellCommand) -> bool {
        let mut show_preview = false;
        match command {
            ShellCommand::Set { field, value } => self.set_field(field, value),
            ShellCommand::Show => println!("{}", self.form_text()),
            ShellCommand::Upload(paths) => {
                let subfolder = self.upload_subfolder.clone();
                self.controller.upload_paths(&subfolder, &paths).await;
            }
            ShellCommand::List => {
                self.controller.list(&self.query).await;
                show_preview = true;
            }
            ShellCommand::Toggle(tokens) => {
                let names = resolve_card_tokens(self.controller.state().cards(), &tokens);
                for name in names {
                    self.controller.toggle(&name);
                }
                show_preview = true;
            }
            ShellCommand::SelectAll => {
                self.controller.select_all();
                show_preview = true;
            }
            ShellCommand::SelectNone => {
                self.controller.select_none();
                show_preview = true;
            }
            ShellCommand::Rename => {
                self.controller.rename_selected(&self.query).await;
                show_preview = true;
            }
            ShellCommand::Download => {
                let subfolder = self.query.subcarpeta.clone();
                self.controller.download_selected(&subfolder).await;
            }
            ShellCommand::DownloadAll => {
                let subfolder = self.query.subcarpeta.clone();
                self.controller.download_all(&subfolder).await;
            }
            ShellCommand::PickBase => self.controller.pick_base().await,
            ShellCommand::Open => self.controller.open_folder().await,
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => return false,
        }
        crate::print_report(&mut self.controller, show_preview);
        true
    }
}

pub async fn run(mut session: ShellSession) -> Result<()> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{PROMPT}");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_command(&line) {
            Ok(Some(command)) => {
                if !session.execute(command).await {
                    break;
                }
                println!("{}", view::render_actions(session.controller.state()));
            }
            Ok(None) => {}
            Err(message) => eprintln!("{message}"),
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
