use std::fmt::Write;

use crate::domain::project::Project;
use crate::domain::ticket::RewrittenTicket;
use crate::workflow::workspace::{SessionState, Workspace};

pub fn projects(projects: &[Project], active: Option<&Project>) -> String {
    if projects.is_empty() {
        return "No projects available.\n".to_string();
    }
    let mut out = String::new();
    for project in projects {
        let marker = if active.is_some_and(|a| a.id == project.id) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} {:<10} {} ({})",
            project.key,
            project.name,
            if project.project_type.is_empty() {
                "unknown type"
            } else {
                project.project_type.as_str()
            }
        );
    }
    out
}

/// Checkbox list of the loaded tickets, with the select-all state on top.
pub fn tickets(workspace: &Workspace) -> String {
    let mut out = String::new();
    if let Some(project) = workspace.active_project() {
        let _ = writeln!(out, "{} ({})", project.name, project.key);
    }
    if workspace.tickets().is_empty() {
        out.push_str("No tickets loaded.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "[{}] Select all ({}/{} selected)",
        checkbox(workspace.all_selected()),
        workspace.selected_count(),
        workspace.tickets().len()
    );
    for ticket in workspace.tickets() {
        let _ = writeln!(
            out,
            "[{}] {}: {}{}",
            checkbox(workspace.is_selected(&ticket.key)),
            ticket.key,
            ticket.summary,
            if ticket.is_rewritten { "  (rewritten)" } else { "" }
        );
        for line in ticket.description_or_placeholder().lines().take(3) {
            let _ = writeln!(out, "      {line}");
        }
    }
    out
}

pub fn rewrites(rewrites: &[RewrittenTicket]) -> String {
    if rewrites.is_empty() {
        return "No rewritten tickets yet. Select tickets and run 'rewrite'.\n".to_string();
    }
    let mut out = String::new();
    for rewrite in rewrites {
        let _ = writeln!(out, "== {}", rewrite.key);
        let _ = writeln!(out, "Original:  {}", rewrite.original_title);
        let _ = writeln!(out, "Rewritten: {}", rewrite.rewritten_title);
        out.push('\n');
        for line in rewrite.rewritten_description.lines() {
            let _ = writeln!(out, "  {line}");
        }
        if !rewrite.acceptance_criteria.is_empty() {
            out.push_str("\nAcceptance criteria:\n");
            for criterion in &rewrite.acceptance_criteria {
                let _ = writeln!(out, "  - {criterion}");
            }
        }
        out.push('\n');
    }
    out
}

pub fn status(workspace: &Workspace) -> String {
    let mut out = String::new();
    let state = match workspace.state() {
        SessionState::Idle => "no project selected",
        SessionState::ProjectSelected => "project selected, tickets not loaded",
        SessionState::TicketsLoaded => "tickets loaded",
        SessionState::TicketsSelected => "tickets selected",
        SessionState::RewritesProposed => "rewrites proposed",
        SessionState::RewritesEdited => "rewrites edited",
    };
    let _ = writeln!(out, "State: {state}");
    if workspace.is_busy() {
        out.push_str("A request is in progress.\n");
    }
    if let Some(project) = workspace.active_project() {
        let _ = writeln!(out, "Project: {} ({})", project.name, project.key);
    }
    let _ = writeln!(
        out,
        "Tickets: {}  Selected: {}  Pending rewrites: {}",
        workspace.tickets().len(),
        workspace.selected_count(),
        workspace.rewrites().len()
    );
    out
}

/// The latest error and success messages, one per line.
pub fn messages(workspace: &Workspace) -> String {
    let mut out = String::new();
    if let Some(error) = workspace.error() {
        let _ = writeln!(out, "Error: {error}");
    }
    if let Some(success) = workspace.success() {
        let _ = writeln!(out, "{success}");
    }
    out
}

fn checkbox(checked: bool) -> char {
    if checked { 'x' } else { ' ' }
}
