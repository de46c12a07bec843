//! `groups` command handler

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use is_terminal::IsTerminal;

use super::GroupCommands;
use crate::api::{Backend, GroupId};
use crate::cli::{output, resolve_project};
use crate::session::DetailSession;

pub async fn handle(command: GroupCommands, backend: Arc<dyn Backend>) -> Result<()> {
    match command {
        GroupCommands::List { project, json } => {
            let session = open_session(backend, &project).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(session.saved())?);
            } else if session.saved().is_empty() {
                println!("No saved attendance groups.");
            } else {
                for group in session.saved() {
                    println!("{}", output::group_summary(group));
                }
            }
        }

        GroupCommands::Show { project, group } => {
            let session = open_session(backend, &project).await?;
            let id = find_group(&session, &group)?;
            if let Some(group) = session.saved().iter().find(|g| g.id == id) {
                output::print_group(group, session.display_rows(group), false);
            }
        }

        GroupCommands::Create {
            project,
            file,
            title,
            columns,
        } => {
            let mut session = open_session(backend, &project).await?;
            session.select_file(&file);
            let table = session
                .upload_file()
                .await
                .with_context(|| format!("Failed to upload {}", file.display()))?;
            log::info!("Offered columns: {}", table.columns.join(", "));

            for column in &columns {
                if !session.is_selected(column) {
                    session.toggle_column(column)?;
                }
            }
            session.set_title(title.as_str());
            session
                .save_selected_columns()
                .await
                .context("Failed to save attendance group")?;
            output::success(&format!(
                "Saved '{}' with columns {}",
                title,
                columns.join(", ")
            ));
        }

        GroupCommands::SetCell {
            project,
            group,
            row,
            column,
            value,
        } => {
            let Some(row_index) = row.checked_sub(1) else {
                bail!("Rows are numbered from 1");
            };
            let mut session = open_session(backend, &project).await?;
            let id = find_group(&session, &group)?;

            session.edit_entry(&id)?;
            session.update_cell(row_index, &column, value.as_str())?;
            session
                .update_edited_entry()
                .await
                .context("Failed to update attendance group")?;
            output::success(&format!("Row {} '{}' set to '{}'", row, column, value));
        }

        GroupCommands::Rename {
            project,
            group,
            title,
        } => {
            let mut session = open_session(backend, &project).await?;
            let id = find_group(&session, &group)?;

            session.edit_entry(&id)?;
            session.set_title(title.as_str());
            session
                .save_selected_columns()
                .await
                .context("Failed to rename attendance group")?;
            output::success(&format!("Renamed to '{}'", title));
        }

        GroupCommands::Delete {
            project,
            group,
            yes,
        } => {
            let mut session = open_session(backend, &project).await?;
            let id = find_group(&session, &group)?;

            if !yes {
                if !std::io::stdin().is_terminal() {
                    bail!("Refusing to delete without confirmation; pass --yes");
                }
                let confirmed = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!("Delete attendance group '{}'?", group))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    return Ok(());
                }
            }

            session
                .delete_entry(&id)
                .await
                .context("Failed to delete attendance group")?;
            output::success(&format!("Deleted {}", id));
        }
    }

    Ok(())
}

async fn open_session(backend: Arc<dyn Backend>, project: &str) -> Result<DetailSession> {
    let project = resolve_project(&backend, project).await?;
    let mut session = DetailSession::new(backend, project.id);
    session
        .load()
        .await
        .context("Failed to load attendance groups")?;
    Ok(session)
}

/// Match a saved group by id, then by title
fn find_group(session: &DetailSession, needle: &str) -> Result<GroupId> {
    let saved = session.saved();
    saved
        .iter()
        .find(|g| g.id.as_str() == needle)
        .or_else(|| saved.iter().find(|g| g.title == needle))
        .map(|g| g.id.clone())
        .with_context(|| format!("No attendance group with id or title '{}'", needle))
}
