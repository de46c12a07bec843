//! Command-line surface

pub mod commands;
pub mod interactive;
pub mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::api::{Backend, Project};
use crate::config::Overrides;
use crate::session::DirectorySession;
use commands::{GroupCommands, ProjectCommands};

#[derive(Parser)]
#[command(name = "attendance-cli")]
#[command(about = "Manage projects and attendance groups on an attendance backend")]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides config file and ATTENDANCE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List and create projects
    #[command(subcommand)]
    Projects(ProjectCommands),

    /// Manage a project's attendance groups
    #[command(subcommand)]
    Groups(GroupCommands),

    /// Browse projects interactively (default)
    Browse,

    /// Work on one project interactively
    Open {
        /// Project id or name
        project: String,
    },
}

pub async fn dispatch(command: Option<Commands>, backend: Arc<dyn Backend>) -> Result<()> {
    match command.unwrap_or(Commands::Browse) {
        Commands::Projects(cmd) => commands::projects::handle(cmd, backend).await,
        Commands::Groups(cmd) => commands::groups::handle(cmd, backend).await,
        Commands::Browse => interactive::browse(backend).await,
        Commands::Open { project } => {
            let project = resolve_project(&backend, &project).await?;
            interactive::open(backend, project.id).await
        }
    }
}

/// Find a project by id or exact name
pub async fn resolve_project(backend: &Arc<dyn Backend>, needle: &str) -> Result<Project> {
    let mut directory = DirectorySession::new(backend.clone());
    directory
        .list_projects()
        .await
        .context("Failed to load projects")?;
    directory
        .find(needle)
        .cloned()
        .with_context(|| format!("No project with id or name '{}'", needle))
}
