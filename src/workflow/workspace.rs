use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::project::Project;
use crate::domain::selection::SelectionSet;
use crate::domain::ticket::{RewrittenTicket, Ticket};
use crate::error::{AppError, AppResult};
use crate::services::RewriteBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ProjectSelected,
    TicketsLoaded,
    TicketsSelected,
    RewritesProposed,
    RewritesEdited,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    ListProjects,
    ListIssues,
    Rewrite,
    Update,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::ListProjects => "list_projects",
            Operation::ListIssues => "list_issues",
            Operation::Rewrite => "rewrite_tickets",
            Operation::Update => "update_tickets",
        }
    }
}

/// Session state for one user: the loaded projects and tickets, the current
/// selection, and the rewrites awaiting approval.
pub struct Workspace {
    backend: Arc<dyn RewriteBackend>,
    projects: Vec<Project>,
    active_project: Option<Project>,
    tickets: Vec<Ticket>,
    tickets_loaded: bool,
    selection: SelectionSet,
    rewrites: Vec<RewrittenTicket>,
    edited: bool,
    busy: bool,
    error: Option<String>,
    success: Option<String>,
}

impl Workspace {
    pub fn new(backend: Arc<dyn RewriteBackend>) -> Self {
        Self {
            backend,
            projects: Vec::new(),
            active_project: None,
            tickets: Vec::new(),
            tickets_loaded: false,
            selection: SelectionSet::new(),
            rewrites: Vec::new(),
            edited: false,
            busy: false,
            error: None,
            success: None,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.active_project.as_ref()
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn rewrites(&self) -> &[RewrittenTicket] {
        &self.rewrites
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selection.contains(key)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn all_selected(&self) -> bool {
        self.selection.all_selected(&self.tickets)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn state(&self) -> SessionState {
        if self.active_project.is_none() {
            SessionState::Idle
        } else if !self.rewrites.is_empty() {
            if self.edited {
                SessionState::RewritesEdited
            } else {
                SessionState::RewritesProposed
            }
        } else if !self.selection.is_empty() {
            SessionState::TicketsSelected
        } else if self.tickets_loaded {
            SessionState::TicketsLoaded
        } else {
            SessionState::ProjectSelected
        }
    }

    pub fn toggle(&mut self, key: &str) -> bool {
        self.selection.toggle(key, &self.tickets)
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.tickets);
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    pub fn toggle_all(&mut self) {
        self.selection.toggle_all(&self.tickets);
    }

    /// Replaces the rewritten description of `key`. No validation happens
    /// locally; returns `false` when no rewrite has that key.
    pub fn edit_description(&mut self, key: &str, text: impl Into<String>) -> bool {
        match self.rewrites.iter_mut().find(|rewrite| rewrite.key == key) {
            Some(rewrite) => {
                rewrite.rewritten_description = text.into();
                self.edited = true;
                true
            }
            None => false,
        }
    }

    pub async fn load_projects(&mut self) -> AppResult<()> {
        self.clear_messages();
        self.busy = true;
        let result = self.backend.list_projects().await;
        self.busy = false;

        match result {
            Ok(projects) => {
                tracing::info!(count = projects.len(), "loaded projects");
                self.projects = projects;
                Ok(())
            }
            Err(err) => Err(self.fail(
                Operation::ListProjects,
                "Failed to fetch projects. Please check your API connection.".to_string(),
                err,
            )),
        }
    }

    /// Makes `project` active and loads its tickets. Selection and pending
    /// rewrites are dropped. Re-selecting the active project keeps the
    /// rewritten markers of tickets that survive the refresh.
    pub async fn select_project(&mut self, project: Project) -> AppResult<()> {
        let refreshing = self
            .active_project
            .as_ref()
            .is_some_and(|active| active.key == project.key);

        self.clear_messages();
        self.selection.deselect_all();
        self.rewrites.clear();
        self.edited = false;
        if !refreshing {
            self.tickets.clear();
            self.tickets_loaded = false;
        }
        self.active_project = Some(project.clone());

        self.busy = true;
        let result = self.backend.list_issues(&project.key).await;
        self.busy = false;

        match result {
            Ok(fetched) => {
                tracing::info!(project = %project.key, count = fetched.len(), "loaded tickets");
                self.replace_tickets(fetched, refreshing);
                Ok(())
            }
            Err(err) => Err(self.fail(
                Operation::ListIssues,
                format!("Failed to fetch tickets for project {}.", project.name),
                err,
            )),
        }
    }

    pub async fn select_project_by_key(&mut self, key: &str) -> AppResult<()> {
        if self.projects.is_empty() {
            self.load_projects().await?;
        }
        let wanted = key.trim();
        let project = self
            .projects
            .iter()
            .find(|project| project.key.eq_ignore_ascii_case(wanted))
            .cloned();
        match project {
            Some(project) => self.select_project(project).await,
            None => Err(self.reject(AppError::Validation(format!(
                "Unknown project '{wanted}'."
            )))),
        }
    }

    pub async fn refresh(&mut self) -> AppResult<()> {
        match self.active_project.clone() {
            Some(project) => self.select_project(project).await,
            None => Err(self.reject(AppError::Validation(
                "Select a project first.".to_string(),
            ))),
        }
    }

    /// Sends the selected tickets for rewriting and replaces any pending
    /// rewrites with the response.
    pub async fn rewrite_selected(&mut self) -> AppResult<()> {
        if self.busy {
            return Err(self.reject(AppError::Busy));
        }
        self.clear_messages();
        if self.selection.is_empty() {
            return Err(self.reject(AppError::Validation(
                "Please select at least one ticket to rewrite.".to_string(),
            )));
        }

        let selected = self.selection.selected_tickets(&self.tickets);
        self.busy = true;
        let result = self.backend.rewrite_tickets(&selected).await;
        self.busy = false;

        match result {
            Ok(rewrites) => {
                let submitted: HashSet<&str> =
                    selected.iter().map(|ticket| ticket.key.as_str()).collect();
                let returned: HashSet<&str> =
                    rewrites.iter().map(|rewrite| rewrite.key.as_str()).collect();
                for ticket in &mut self.tickets {
                    let key = ticket.key.as_str();
                    if submitted.contains(key) && returned.contains(key) {
                        ticket.is_rewritten = true;
                    }
                }
                tracing::info!(
                    submitted = selected.len(),
                    returned = rewrites.len(),
                    "received rewrites"
                );
                self.rewrites = rewrites;
                self.edited = false;
                self.success = Some("Tickets rewritten successfully!".to_string());
                Ok(())
            }
            Err(err) => Err(self.fail(
                Operation::Rewrite,
                "Failed to rewrite tickets. Please try again.".to_string(),
                err,
            )),
        }
    }

    /// Pushes the pending rewrites to the tracker. On full success the
    /// rewrites and selection are cleared and the ticket list is reloaded;
    /// on partial failure everything stays in place so the user can retry.
    pub async fn approve(&mut self) -> AppResult<()> {
        if self.busy {
            return Err(self.reject(AppError::Busy));
        }
        self.clear_messages();
        if self.rewrites.is_empty() {
            return Err(self.reject(AppError::Validation(
                "There are no rewritten tickets to update.".to_string(),
            )));
        }

        self.busy = true;
        let result = self.backend.update_tickets(&self.rewrites).await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.busy = false;
                return Err(self.fail(
                    Operation::Update,
                    "Failed to update tickets. Please try again.".to_string(),
                    err,
                ));
            }
        };

        if !outcome.success {
            self.busy = false;
            let err = AppError::PartialFailure {
                failed: outcome.failed_keys(),
            };
            tracing::warn!(
                operation = Operation::Update.as_str(),
                error = %err,
                "update partially failed"
            );
            self.error = Some(err.to_string());
            return Err(err);
        }

        tracing::info!(count = self.rewrites.len(), "tickets updated");
        self.success = Some("Tickets updated successfully!".to_string());
        self.rewrites.clear();
        self.edited = false;
        self.selection.deselect_all();

        let Some(project) = self.active_project.clone() else {
            self.busy = false;
            return Ok(());
        };
        let refreshed = self.backend.list_issues(&project.key).await;
        self.busy = false;

        match refreshed {
            Ok(fetched) => {
                self.replace_tickets(fetched, true);
                Ok(())
            }
            Err(err) => Err(self.fail(
                Operation::ListIssues,
                format!("Failed to fetch tickets for project {}.", project.name),
                err,
            )),
        }
    }

    fn replace_tickets(&mut self, fetched: Vec<Ticket>, keep_markers: bool) {
        let rewritten: HashSet<String> = if keep_markers {
            self.tickets
                .iter()
                .filter(|ticket| ticket.is_rewritten)
                .map(|ticket| ticket.key.clone())
                .collect()
        } else {
            HashSet::new()
        };

        self.tickets = fetched
            .into_iter()
            .map(|mut ticket| {
                ticket.is_rewritten = rewritten.contains(&ticket.key);
                ticket
            })
            .collect();
        self.tickets_loaded = true;
        self.selection.deselect_all();
    }

    fn clear_messages(&mut self) {
        self.error = None;
        self.success = None;
    }

    fn fail(&mut self, operation: Operation, message: String, err: AppError) -> AppError {
        tracing::error!(operation = operation.as_str(), error = %err, "{message}");
        self.error = Some(message);
        err
    }

    fn reject(&mut self, err: AppError) -> AppError {
        tracing::warn!(error = %err, "request rejected");
        self.error = Some(err.to_string());
        err
    }
}
