//! Terminal rendering for projects and attendance groups

use colored::*;
use unicode_width::UnicodeWidthStr;

use crate::api::{ApiError, AttendanceGroup, Project, Row, cell_text, format_timestamp};
use crate::session::SessionError;

/// Report a failed action without ending the program
pub fn alert(err: &SessionError) {
    let label = match err {
        SessionError::Validation(_) => "!".yellow().bold(),
        SessionError::Conflict(_) => "!".yellow().bold(),
        SessionError::Transport(_) => "✗".red().bold(),
    };
    eprintln!("{} {}", label, err);

    if let SessionError::Transport(api) = err {
        if let Some(hint) = hint_for(api) {
            eprintln!("  {}", hint.dimmed());
        }
    }
}

fn hint_for(err: &ApiError) -> Option<&'static str> {
    match err {
        ApiError::Request(e) if e.is_connect() => {
            Some("Is the backend running? Set --api-url or ATTENDANCE_API_URL.")
        }
        ApiError::Request(e) if e.is_timeout() => Some("The request timed out; try --timeout."),
        _ if err.status() == Some(404) => Some("Check the project and group identifiers."),
        _ => None,
    }
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("{}", "No projects yet.".dimmed());
        return;
    }
    for project in projects {
        println!("{} {}", project.name.bold(), format!("({})", project.id).dimmed());
        if !project.description.is_empty() {
            println!("  {}", project.description);
        }
        if let Some(edited) = &project.last_edited {
            println!("  {}", format!("Last edited: {}", format_timestamp(edited)).dimmed());
        }
    }
}

/// One-line summary used by `groups list`
pub fn group_summary(group: &AttendanceGroup) -> String {
    let saved = group
        .timestamp
        .as_deref()
        .map(format_timestamp)
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{} ({}) · {} columns · {} rows · saved {}",
        group.title,
        group.id,
        group.columns.len(),
        group.rows.len(),
        saved
    )
}

/// Group heading plus its table. `rows` may come from an edit buffer.
pub fn print_group(group: &AttendanceGroup, rows: &[Row], editing: bool) {
    let marker = if editing {
        format!(" {}", "[editing]".yellow().bold())
    } else {
        String::new()
    };
    println!("{}{}", group.title.bold().underline(), marker);
    if let Some(timestamp) = &group.timestamp {
        println!("{}", format!("Saved on: {}", format_timestamp(timestamp)).dimmed());
    }
    print!("{}", render_table(&group.columns, rows));
}

/// Plain-text table with a leading 1-based row number column
pub fn render_table(columns: &[String], rows: &[Row]) -> String {
    let mut header = vec!["#".to_string()];
    header.extend(columns.iter().cloned());

    let body: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut cells = vec![(index + 1).to_string()];
            cells.extend(columns.iter().map(|c| cell_text(row.get(c))));
            cells
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for cells in &body {
        for (i, cell) in cells.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for cells in &body {
        push_line(&mut out, cells, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.width());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}
