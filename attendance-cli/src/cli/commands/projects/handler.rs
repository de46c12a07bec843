//! `projects` command handler

use std::sync::Arc;

use anyhow::{Context, Result};

use super::ProjectCommands;
use crate::api::Backend;
use crate::cli::output;
use crate::session::DirectorySession;

pub async fn handle(command: ProjectCommands, backend: Arc<dyn Backend>) -> Result<()> {
    let mut directory = DirectorySession::new(backend);

    match command {
        ProjectCommands::List { json } => {
            let projects = directory
                .list_projects()
                .await
                .context("Failed to load projects")?;
            if json {
                println!("{}", serde_json::to_string_pretty(projects)?);
            } else {
                output::print_projects(projects);
            }
        }
        ProjectCommands::Create { name, description } => {
            let created = directory
                .create_project(name, description)
                .await
                .context("Failed to create project")?;
            output::success(&format!("Created project {} ({})", created.name, created.id));
        }
    }

    Ok(())
}
