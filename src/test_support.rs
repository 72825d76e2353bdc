use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::project::Project;
use crate::domain::ticket::{FailedTicket, RewrittenTicket, Ticket, UpdateOutcome};
use crate::error::{AppError, AppResult};
use crate::services::RewriteBackend;

/// In-memory backend that records every call as `"<operation> <detail>"`.
#[derive(Default)]
pub struct FakeBackend {
    projects: Vec<Project>,
    issues: Mutex<HashMap<String, Vec<Ticket>>>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    failing_nth: Mutex<HashMap<&'static str, usize>>,
    update_failures: Mutex<Option<Vec<String>>>,
    submitted: Mutex<Vec<RewrittenTicket>>,
}

impl FakeBackend {
    /// Each entry is `(key, name, ticket keys)`.
    pub fn with_projects(projects: &[(&str, &str, &[&str])]) -> Self {
        let backend = Self {
            projects: projects
                .iter()
                .enumerate()
                .map(|(index, (key, name, _))| Project {
                    id: (10_000 + index).to_string(),
                    key: key.to_string(),
                    name: name.to_string(),
                    project_type: "software".to_string(),
                })
                .collect(),
            ..Self::default()
        };
        for (key, _, tickets) in projects {
            backend.set_issues(key, tickets);
        }
        backend
    }

    pub fn set_issues(&self, project_key: &str, keys: &[&str]) {
        let tickets = keys
            .iter()
            .map(|key| Ticket {
                key: key.to_string(),
                summary: format!("summary of {key}"),
                description: Some(format!("details of {key}")),
                is_rewritten: false,
            })
            .collect();
        self.issues
            .lock()
            .unwrap()
            .insert(project_key.to_string(), tickets);
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    /// Fails only the `nth` call (1-based) of `operation`.
    pub fn fail_on_nth(&self, operation: &'static str, nth: usize) {
        self.failing_nth.lock().unwrap().insert(operation, nth);
    }

    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().unwrap().remove(operation);
    }

    /// Makes the next updates report `keys` as failed.
    pub fn reject_updates(&self, keys: &[&str]) {
        *self.update_failures.lock().unwrap() =
            Some(keys.iter().map(|key| key.to_string()).collect());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<RewrittenTicket> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str, detail: String) -> AppResult<()> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(format!("{operation} {detail}").trim_end().to_string());
        let count = calls
            .iter()
            .filter(|call| call.split_whitespace().next() == Some(operation))
            .count();
        drop(calls);

        let nth_fails = self.failing_nth.lock().unwrap().get(operation) == Some(&count);
        if nth_fails || self.failing.lock().unwrap().contains(operation) {
            Err(AppError::Backend(format!("{operation} unavailable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RewriteBackend for FakeBackend {
    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        self.record("list_projects", String::new())?;
        Ok(self.projects.clone())
    }

    async fn list_issues(&self, project_key: &str) -> AppResult<Vec<Ticket>> {
        self.record("list_issues", project_key.to_string())?;
        Ok(self
            .issues
            .lock()
            .unwrap()
            .get(project_key)
            .cloned()
            .unwrap_or_default())
    }

    async fn rewrite_tickets(&self, tickets: &[Ticket]) -> AppResult<Vec<RewrittenTicket>> {
        let keys: Vec<_> = tickets.iter().map(|ticket| ticket.key.as_str()).collect();
        self.record("rewrite_tickets", keys.join(","))?;
        Ok(tickets
            .iter()
            .map(|ticket| RewrittenTicket {
                key: ticket.key.clone(),
                original_title: ticket.summary.clone(),
                rewritten_title: format!("Rewritten {}", ticket.summary),
                rewritten_description: format!("Better {}", ticket.key),
                acceptance_criteria: vec!["It works".to_string()],
            })
            .collect())
    }

    async fn update_tickets(&self, tickets: &[RewrittenTicket]) -> AppResult<UpdateOutcome> {
        let keys: Vec<_> = tickets.iter().map(|ticket| ticket.key.as_str()).collect();
        self.record("update_tickets", keys.join(","))?;
        *self.submitted.lock().unwrap() = tickets.to_vec();
        Ok(match self.update_failures.lock().unwrap().clone() {
            Some(failed) => UpdateOutcome {
                success: false,
                failed_tickets: failed.into_iter().map(|key| FailedTicket { key }).collect(),
            },
            None => UpdateOutcome {
                success: true,
                failed_tickets: Vec::new(),
            },
        })
    }
}
