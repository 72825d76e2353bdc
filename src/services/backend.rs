use async_trait::async_trait;

use crate::domain::project::Project;
use crate::domain::ticket::{RewrittenTicket, Ticket, UpdateOutcome};
use crate::error::AppResult;

#[async_trait]
pub trait RewriteBackend: Send + Sync {
    async fn list_projects(&self) -> AppResult<Vec<Project>>;
    async fn list_issues(&self, project_key: &str) -> AppResult<Vec<Ticket>>;
    async fn rewrite_tickets(&self, tickets: &[Ticket]) -> AppResult<Vec<RewrittenTicket>>;
    async fn update_tickets(&self, tickets: &[RewrittenTicket]) -> AppResult<UpdateOutcome>;
}
