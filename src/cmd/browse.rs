use crate::cmd::render;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::workflow::workspace::Workspace;

pub async fn run_projects(ctx: &AppContext) -> AppResult<()> {
    let mut workspace = Workspace::new(ctx.backend.clone());
    workspace.load_projects().await?;
    print!("{}", render::projects(workspace.projects(), None));
    Ok(())
}

pub async fn run_tickets(ctx: &AppContext, project: Option<String>) -> AppResult<()> {
    let key = resolve_project(ctx, project)?;
    let mut workspace = Workspace::new(ctx.backend.clone());
    workspace.select_project_by_key(&key).await?;
    print!("{}", render::tickets(&workspace));
    Ok(())
}

/// Explicit argument first, then the configured default project.
pub fn resolve_project(ctx: &AppContext, project: Option<String>) -> AppResult<String> {
    project
        .filter(|key| !key.trim().is_empty())
        .or_else(|| ctx.config.default_project.clone())
        .ok_or_else(|| {
            AppError::Configuration(
                "no project given and no default project configured".to_string(),
            )
        })
}
