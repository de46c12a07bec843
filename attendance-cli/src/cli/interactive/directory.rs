use std::sync::Arc;

use anyhow::Result;
use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use super::{ensure_terminal, recover};
use crate::api::Backend;
use crate::cli::output;
use crate::session::DirectorySession;

/// Interactive project directory
pub async fn browse(backend: Arc<dyn Backend>) -> Result<()> {
    ensure_terminal()?;
    let theme = ColorfulTheme::default();
    let mut directory = DirectorySession::new(backend.clone());

    recover(reload(&mut directory).await)?;

    loop {
        println!();
        println!("{}", "My Projects".bold());
        output::print_projects(directory.projects());
        println!();

        let mut items: Vec<String> = directory
            .projects()
            .iter()
            .map(|p| format!("Open {}", p.name))
            .collect();
        let first_action = items.len();
        items.push("+ New project".to_string());
        items.push("Refresh".to_string());
        items.push("Quit".to_string());

        let choice = Select::with_theme(&theme)
            .with_prompt("Choose")
            .items(&items)
            .default(0)
            .interact()?;

        if choice < first_action {
            if let Some(project) = directory.select(choice).cloned() {
                super::open(backend.clone(), project).await?;
                recover(reload(&mut directory).await)?;
            }
            continue;
        }

        match choice - first_action {
            0 => recover(create_project(&mut directory, &theme).await)?,
            1 => recover(reload(&mut directory).await)?,
            _ => return Ok(()),
        }
    }
}

async fn reload(directory: &mut DirectorySession) -> Result<()> {
    directory.list_projects().await?;
    Ok(())
}

async fn create_project(directory: &mut DirectorySession, theme: &ColorfulTheme) -> Result<()> {
    let form = directory.form().cloned().unwrap_or_default();

    let name: String = Input::with_theme(theme)
        .with_prompt("Name")
        .with_initial_text(form.name)
        .allow_empty(true)
        .interact_text()?;
    let description: String = Input::with_theme(theme)
        .with_prompt("Description")
        .with_initial_text(form.description)
        .allow_empty(true)
        .interact_text()?;

    let form = directory.open_form();
    form.name = name;
    form.description = description;

    let confirmed = Confirm::with_theme(theme)
        .with_prompt("Create project?")
        .default(true)
        .interact()?;
    if !confirmed {
        directory.close_form();
        return Ok(());
    }

    let created = directory.submit_form().await?;
    output::success(&format!("Created project {}", created.name));
    Ok(())
}
