use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::cmd::render;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::workspace::Workspace;

const HELP: &str = "\
Commands:
  projects            list projects
  open <KEY>          select a project and load its tickets
  refresh             reload tickets of the current project
  list                show tickets and selection
  toggle [KEY...]     toggle tickets; without keys, toggle select-all
  all | none          select or deselect every ticket
  rewrite             request rewrites for the selected tickets
  show                show pending rewrites
  edit <KEY> [TEXT]   replace a rewritten description; without TEXT,
                      read lines until a single '.'
  approve             push pending rewrites to the tracker
  status              show session state
  help                show this help
  quit                leave the session
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    Projects,
    Open(String),
    Refresh,
    List,
    Toggle(Vec<String>),
    SelectAll,
    DeselectAll,
    Rewrite,
    Show,
    Edit { key: String, text: Option<String> },
    Approve,
    Status,
    Help,
    Quit,
}

impl SessionCommand {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<String> = rest.split_whitespace().map(str::to_string).collect();

        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Ok(None),
            "projects" => SessionCommand::Projects,
            "open" => match args.as_slice() {
                [key] => SessionCommand::Open(key.clone()),
                _ => return Err("usage: open <KEY>".to_string()),
            },
            "refresh" => SessionCommand::Refresh,
            "list" | "ls" => SessionCommand::List,
            "toggle" => SessionCommand::Toggle(args),
            "all" => SessionCommand::SelectAll,
            "none" => SessionCommand::DeselectAll,
            "rewrite" => SessionCommand::Rewrite,
            "show" => SessionCommand::Show,
            "edit" => {
                let (key, text) = match rest.split_once(char::is_whitespace) {
                    Some((key, text)) => (key, Some(text.trim().to_string())),
                    None => (rest, None),
                };
                if key.is_empty() {
                    return Err("usage: edit <KEY> [TEXT]".to_string());
                }
                SessionCommand::Edit {
                    key: key.to_string(),
                    text,
                }
            }
            "approve" => SessionCommand::Approve,
            "status" => SessionCommand::Status,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" | "q" => SessionCommand::Quit,
            other => return Err(format!("unknown command '{other}', try 'help'")),
        };
        Ok(Some(command))
    }
}

enum Flow {
    Continue,
    Quit,
}

pub async fn run(ctx: &AppContext, project: Option<String>) -> AppResult<()> {
    let mut workspace = Workspace::new(ctx.backend.clone());
    let project = project.or_else(|| ctx.config.default_project.clone());
    let input = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    drive(&mut workspace, project, input, &mut stdout).await
}

async fn drive<R, W>(
    workspace: &mut Workspace,
    project: Option<String>,
    input: R,
    out: &mut W,
) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    let _ = workspace.load_projects().await;
    write!(out, "{}", render::messages(workspace))?;
    write!(out, "{}", render::projects(workspace.projects(), None))?;

    if let Some(key) = project {
        let _ = workspace.select_project_by_key(&key).await;
        write!(out, "{}", render::messages(workspace))?;
        write!(out, "{}", render::tickets(workspace))?;
    }
    writeln!(out, "Type 'help' for commands.")?;

    loop {
        write!(out, "reword> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let command = match SessionCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };
        if let Flow::Quit = execute(workspace, command, &mut lines, out).await? {
            break;
        }
    }
    Ok(())
}

async fn execute<R, W>(
    workspace: &mut Workspace,
    command: SessionCommand,
    lines: &mut Lines<R>,
    out: &mut W,
) -> AppResult<Flow>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    match command {
        SessionCommand::Projects => {
            let _ = workspace.load_projects().await;
            write!(out, "{}", render::messages(workspace))?;
            write!(
                out,
                "{}",
                render::projects(workspace.projects(), workspace.active_project())
            )?;
        }
        SessionCommand::Open(key) => {
            let _ = workspace.select_project_by_key(&key).await;
            write!(out, "{}", render::messages(workspace))?;
            write!(out, "{}", render::tickets(workspace))?;
        }
        SessionCommand::Refresh => {
            let _ = workspace.refresh().await;
            write!(out, "{}", render::messages(workspace))?;
            write!(out, "{}", render::tickets(workspace))?;
        }
        SessionCommand::List => write!(out, "{}", render::tickets(workspace))?,
        SessionCommand::Toggle(keys) => {
            if keys.is_empty() {
                workspace.toggle_all();
            }
            for key in &keys {
                if !workspace.tickets().iter().any(|ticket| &ticket.key == key) {
                    writeln!(out, "No ticket {key} in the current list.")?;
                    continue;
                }
                workspace.toggle(key);
            }
            write!(out, "{}", render::tickets(workspace))?;
        }
        SessionCommand::SelectAll => {
            workspace.select_all();
            write!(out, "{}", render::tickets(workspace))?;
        }
        SessionCommand::DeselectAll => {
            workspace.deselect_all();
            write!(out, "{}", render::tickets(workspace))?;
        }
        SessionCommand::Rewrite => {
            writeln!(out, "Processing tickets...")?;
            out.flush()?;
            let result = workspace.rewrite_selected().await;
            write!(out, "{}", render::messages(workspace))?;
            if result.is_ok() {
                write!(out, "{}", render::rewrites(workspace.rewrites()))?;
            }
        }
        SessionCommand::Show => write!(out, "{}", render::rewrites(workspace.rewrites()))?,
        SessionCommand::Edit { key, text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    writeln!(out, "Enter the new description; finish with a single '.' line.")?;
                    out.flush()?;
                    read_block(lines).await?
                }
            };
            if workspace.edit_description(&key, text) {
                writeln!(out, "Updated description of {key}.")?;
            } else {
                writeln!(out, "No rewritten ticket {key}.")?;
            }
        }
        SessionCommand::Approve => {
            writeln!(out, "Updating tickets...")?;
            out.flush()?;
            let _ = workspace.approve().await;
            write!(out, "{}", render::messages(workspace))?;
            write!(out, "{}", render::tickets(workspace))?;
        }
        SessionCommand::Status => write!(out, "{}", render::status(workspace))?,
        SessionCommand::Help => write!(out, "{HELP}")?,
        SessionCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn read_block<R>(lines: &mut Lines<R>) -> AppResult<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut block = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim_end() == "." {
            break;
        }
        block.push(line);
    }
    Ok(block.join("\n"))
}
