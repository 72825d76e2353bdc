use std::io::{self, Write};

use clap::Args;

use crate::cmd::render;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::workflow::workspace::Workspace;

#[derive(Args, Debug, Clone)]
pub struct RewriteArgs {
    /// Project key.
    pub project: String,
    /// Ticket keys to rewrite.
    pub keys: Vec<String>,
    /// Rewrite every ticket in the project.
    #[arg(long, conflicts_with = "keys")]
    pub all: bool,
    /// Push the rewrites back to the tracker without further review.
    #[arg(long)]
    pub approve: bool,
}

pub async fn run(ctx: &AppContext, args: RewriteArgs) -> AppResult<()> {
    let mut stdout = io::stdout();
    rewrite(ctx, args, &mut stdout).await
}

async fn rewrite<W: Write>(ctx: &AppContext, args: RewriteArgs, out: &mut W) -> AppResult<()> {
    let project = args.project.trim().to_string();
    let mut workspace = Workspace::new(ctx.backend.clone());
    workspace.select_project_by_key(&project).await?;

    if args.all {
        workspace.select_all();
    } else {
        let missing: Vec<_> = args
            .keys
            .iter()
            .filter(|key| !workspace.is_selected(key) && !workspace.toggle(key))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "tickets not found in {project}: {}",
                missing.join(", ")
            )));
        }
    }

    workspace.rewrite_selected().await?;
    write!(out, "{}", render::rewrites(workspace.rewrites()))?;

    if !args.approve {
        writeln!(out, "Run again with --approve to update the tracker.")?;
        return Ok(());
    }

    match workspace.approve().await {
        Ok(()) => write!(out, "{}", render::messages(&workspace))?,
        // The tracker accepted the update; only the reload afterwards failed.
        Err(err) if workspace.success().is_some() => {
            tracing::warn!(error = %err, "tickets updated but reload failed");
            if let Some(success) = workspace.success() {
                writeln!(out, "{success}")?;
            }
            if let Some(reload) = workspace.error() {
                writeln!(out, "Warning: {reload}")?;
            }
        }
        Err(err) => return Err(err),
    }
    Ok(())
}
