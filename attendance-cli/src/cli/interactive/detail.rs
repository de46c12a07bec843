use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use super::{ensure_terminal, recover};
use crate::api::{AttendanceGroup, Backend, GroupId, ProjectId, cell_text};
use crate::cli::output;
use crate::session::{DetailSession, DetailState, SessionError, SessionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Upload,
    ChooseColumns,
    SetTitle,
    Save,
    Edit,
    EditCell,
    Cancel,
    Delete,
    Refresh,
    Back,
}

impl Action {
    fn label(self, session: &DetailSession) -> &'static str {
        match self {
            Self::Upload => "Upload spreadsheet",
            Self::ChooseColumns => "Choose columns",
            Self::SetTitle => "Set title",
            Self::Save if session.editing().is_some() => "Update",
            Self::Save => "Save",
            Self::Edit => "Edit a group",
            Self::EditCell => "Edit a cell",
            Self::Cancel => "Cancel",
            Self::Delete => "Delete a group",
            Self::Refresh => "Refresh",
            Self::Back => "Back to projects",
        }
    }
}

/// Menu entries that make sense in the session's current state
fn available_actions(session: &DetailSession) -> Vec<Action> {
    let editing = session.editing().is_some();
    let has_saved = !session.saved().is_empty();
    let mut actions = vec![Action::Upload];

    if session.table().is_some() || editing {
        actions.extend([Action::ChooseColumns, Action::SetTitle, Action::Save]);
    }
    if editing {
        actions.extend([Action::EditCell, Action::Cancel]);
    } else if has_saved {
        actions.extend([Action::Edit, Action::Delete]);
    }
    actions.extend([Action::Refresh, Action::Back]);
    actions
}

/// Interactive workspace for one project
pub async fn open(backend: Arc<dyn Backend>, project: ProjectId) -> Result<()> {
    ensure_terminal()?;
    let theme = ColorfulTheme::default();
    let mut session = DetailSession::new(backend, project);

    recover(session.load().await.map_err(Into::into))?;

    loop {
        render(&session);

        let actions = available_actions(&session);
        let labels: Vec<&str> = actions.iter().map(|a| a.label(&session)).collect();
        let choice = Select::with_theme(&theme)
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact()?;

        match actions[choice] {
            Action::Back => return Ok(()),
            action => recover(perform(&mut session, action, &theme).await)?,
        }
    }
}

async fn perform(session: &mut DetailSession, action: Action, theme: &ColorfulTheme) -> Result<()> {
    match action {
        Action::Upload => {
            let initial = session
                .selected_file()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let path: String = Input::with_theme(theme)
                .with_prompt("Spreadsheet path")
                .with_initial_text(initial)
                .interact_text()?;
            session.select_file(PathBuf::from(path.trim()));
            println!("{}", "Uploading...".dimmed());
            let table = session.upload_file().await?;
            output::success(&format!(
                "{} columns, {} rows",
                table.columns.len(),
                table.rows.len()
            ));
        }

        Action::ChooseColumns => {
            let columns = offered_columns(session)?;
            let defaults: Vec<bool> = columns.iter().map(|c| session.is_selected(c)).collect();
            let picked = MultiSelect::with_theme(theme)
                .with_prompt("Columns to keep (space to toggle)")
                .items(&columns)
                .defaults(&defaults)
                .interact()?;

            for (index, column) in columns.iter().enumerate() {
                if picked.contains(&index) != session.is_selected(column) {
                    session.toggle_column(column)?;
                }
            }
        }

        Action::SetTitle => {
            let title: String = Input::with_theme(theme)
                .with_prompt("Title")
                .with_initial_text(session.title().to_string())
                .allow_empty(true)
                .interact_text()?;
            session.set_title(title);
        }

        Action::Save => {
            println!("{}", "Saving...".dimmed());
            let updating = session.editing().is_some();
            session.save_selected_columns().await?;
            output::success(if updating { "Updated" } else { "Saved" });
        }

        Action::Edit => {
            if let Some(id) = pick_group(session, theme, "Edit which group?")? {
                session.edit_entry(&id)?;
            }
        }

        Action::EditCell => edit_cell(session, theme)?,

        Action::Cancel => session.reset_form(),

        Action::Delete => {
            if let Some(id) = pick_group(session, theme, "Delete which group?")? {
                let confirmed = Confirm::with_theme(theme)
                    .with_prompt("This cannot be undone. Delete?")
                    .default(false)
                    .interact()?;
                if confirmed {
                    session.delete_entry(&id).await?;
                    output::success("Deleted");
                }
            }
        }

        Action::Refresh => {
            session.fetch_saved_data().await?;
        }

        Action::Back => {}
    }
    Ok(())
}

/// Columns the selection menu can offer; an empty menu is a user-facing error
fn offered_columns(session: &DetailSession) -> SessionResult<Vec<String>> {
    let columns = match (session.editing(), session.table()) {
        (Some(group), _) => group.columns.clone(),
        (None, Some(table)) => table.columns.clone(),
        (None, None) => Vec::new(),
    };
    if columns.is_empty() {
        return Err(SessionError::validation("The uploaded table has no columns"));
    }
    Ok(columns)
}

/// Rows and non-key columns of the edited group that a cell edit can target
fn editable_cells(group: &AttendanceGroup) -> SessionResult<(&str, Vec<&String>)> {
    let key = group
        .key_column()
        .ok_or_else(|| SessionError::validation("This group has no columns"))?;
    if group.rows.is_empty() {
        return Err(SessionError::validation("This group has no rows to edit"));
    }
    let editable: Vec<&String> = group.columns.iter().skip(1).collect();
    if editable.is_empty() {
        return Err(SessionError::validation("Only the key column exists; nothing to edit"));
    }
    Ok((key, editable))
}

fn pick_group(
    session: &DetailSession,
    theme: &ColorfulTheme,
    prompt: &str,
) -> Result<Option<GroupId>> {
    let groups = session.saved();
    let mut labels: Vec<String> = groups.iter().map(output::group_summary).collect();
    labels.push("(none)".to_string());

    let choice = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(groups.get(choice).map(|g| g.id.clone()))
}

fn edit_cell(session: &mut DetailSession, theme: &ColorfulTheme) -> Result<()> {
    let Some(group) = session.editing().cloned() else {
        return Ok(());
    };
    let (key, editable) = editable_cells(&group)?;

    let row_labels: Vec<String> = group
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| format!("{}. {}", i + 1, cell_text(row.get(key))))
        .collect();
    let row_index = Select::with_theme(theme)
        .with_prompt("Row")
        .items(&row_labels)
        .default(0)
        .interact()?;

    let column_index = Select::with_theme(theme)
        .with_prompt("Column")
        .items(&editable)
        .default(0)
        .interact()?;
    let column = editable[column_index];

    let current = cell_text(group.rows.get(row_index).and_then(|row| row.get(column)));
    let value: String = Input::with_theme(theme)
        .with_prompt(column.as_str())
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()?;

    session.update_cell(row_index, column, value)?;
    Ok(())
}

fn render(session: &DetailSession) {
    let name = session
        .project_name()
        .map(str::to_string)
        .unwrap_or_else(|| session.project_id().to_string());
    println!();
    println!("{} {}", "Project:".bold(), name.bold());

    if let Some(table) = session.table() {
        let file = session
            .selected_file()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "Uploaded {}: {} columns, {} rows",
            file,
            table.columns.len(),
            table.rows.len()
        );
    }
    if matches!(session.state(), DetailState::ColumnsOffered | DetailState::Editing) {
        let heading = if session.state() == DetailState::Editing {
            "Edit Attendance Group"
        } else {
            "Select Columns"
        };
        println!("{}", heading.cyan().bold());
        println!("  Title:   {}", session.title());
        println!("  Columns: {}", session.selection().join(", "));
    }

    if session.saved().is_empty() {
        return;
    }
    println!();
    println!("{}", "Saved Attendance Groups".bold());
    for group in session.saved() {
        let editing = session.editing().is_some_and(|g| g.id == group.id);
        println!();
        output::print_group(group, session.display_rows(group), editing);
    }
}
