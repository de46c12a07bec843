//! Project detail: upload a spreadsheet, pick columns, save and edit attendance groups
//!
//! State flow for one session:
//!
//! ```text
//! Idle -> Uploading -> ColumnsOffered -> Saving -> Idle
//!                                     \-> Editing -> Updating -> Idle
//! ```
//!
//! Every request borrows the session mutably, so a session never has two
//! requests in flight. Only one attendance group can be edited at a time;
//! [`DetailSession::can_edit`] is the single place that decides it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;

use super::error::{SessionError, SessionResult};
use crate::api::{
    AttendanceGroup, Backend, GroupId, GroupPayload, ProjectId, Row, UploadFile, UploadedTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailState {
    Idle,
    Uploading,
    ColumnsOffered,
    Saving,
    Editing,
    Updating,
}

impl fmt::Display for DetailState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::ColumnsOffered => "choosing columns",
            Self::Saving => "saving",
            Self::Editing => "editing",
            Self::Updating => "updating",
        };
        f.write_str(label)
    }
}

/// The group being edited, plus the server timestamp it was copied at
#[derive(Debug, Clone)]
struct EditSession {
    base_timestamp: Option<String>,
    buffer: AttendanceGroup,
}

pub struct DetailSession {
    backend: Arc<dyn Backend>,
    project_id: ProjectId,
    project_name: Option<String>,
    state: DetailState,

    // Form
    selected_file: Option<PathBuf>,
    table: Option<UploadedTable>,
    selection: Vec<String>,
    title: String,

    saved: Vec<AttendanceGroup>,
    editing: Option<EditSession>,
}

impl DetailSession {
    pub fn new(backend: Arc<dyn Backend>, project_id: ProjectId) -> Self {
        Self {
            backend,
            project_id,
            project_name: None,
            state: DetailState::Idle,
            selected_file: None,
            table: None,
            selection: Vec::new(),
            title: String::new(),
            saved: Vec::new(),
            editing: None,
        }
    }

    /// Initial load: project name and saved groups
    pub async fn load(&mut self) -> SessionResult<()> {
        self.fetch_project_name().await;
        self.fetch_saved_data().await?;
        Ok(())
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn state(&self) -> DetailState {
        self.state
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn is_selected(&self, column: &str) -> bool {
        self.selection.iter().any(|c| c == column)
    }

    pub fn table(&self) -> Option<&UploadedTable> {
        self.table.as_ref()
    }

    pub fn selected_file(&self) -> Option<&Path> {
        self.selected_file.as_deref()
    }

    pub fn saved(&self) -> &[AttendanceGroup] {
        &self.saved
    }

    /// The edit buffer, if a group is being edited
    pub fn editing(&self) -> Option<&AttendanceGroup> {
        self.editing.as_ref().map(|e| &e.buffer)
    }

    fn transition(&mut self, next: DetailState) {
        if self.state != next {
            debug!("Project {}: {} -> {}", self.project_id, self.state, next);
            self.state = next;
        }
    }

    /// Where the session rests when no request is running
    fn resting_state(&self) -> DetailState {
        if self.editing.is_some() {
            DetailState::Editing
        } else if self.table.is_some() {
            DetailState::ColumnsOffered
        } else {
            DetailState::Idle
        }
    }

    /// Look the project's display name up. Failures are only logged.
    pub async fn fetch_project_name(&mut self) {
        match self.backend.list_projects().await {
            Ok(projects) => {
                if let Some(project) = projects.into_iter().find(|p| p.id == self.project_id) {
                    self.project_name = Some(project.name);
                }
            }
            Err(err) => warn!("Failed to load project name for {}: {}", self.project_id, err),
        }
    }

    /// Re-read the saved groups. On failure the previous list is kept.
    pub async fn fetch_saved_data(&mut self) -> SessionResult<&[AttendanceGroup]> {
        let groups = self.backend.list_groups(&self.project_id).await?;
        debug!("Project {}: {} saved groups", self.project_id, groups.len());
        self.saved = groups;
        Ok(&self.saved)
    }

    /// Refresh after a mutation that already succeeded
    async fn refresh_after_write(&mut self) {
        if let Err(err) = self.fetch_saved_data().await {
            warn!("Saved groups could not be refreshed: {}", err);
        }
    }

    pub fn select_file(&mut self, path: impl Into<PathBuf>) {
        self.selected_file = Some(path.into());
    }

    /// Upload the selected file and offer its columns.
    ///
    /// A new table replaces any previously offered one. Selected columns the
    /// new table lacks are dropped unless a group is being edited.
    pub async fn upload_file(&mut self) -> SessionResult<&UploadedTable> {
        let path = self
            .selected_file
            .clone()
            .ok_or_else(|| SessionError::validation("Please select a file"))?;

        let prior = self.state;
        self.transition(DetailState::Uploading);

        let result = match UploadFile::read(&path).await {
            Ok(file) => self.backend.upload(&self.project_id, file).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(table) => {
                info!(
                    "Uploaded {}: {} columns, {} rows",
                    path.display(),
                    table.columns.len(),
                    table.rows.len()
                );
                if self.editing.is_none() {
                    self.selection.retain(|c| table.has_column(c));
                }
                let next = if self.editing.is_some() {
                    DetailState::Editing
                } else {
                    DetailState::ColumnsOffered
                };
                self.transition(next);
                let table: &UploadedTable = self.table.insert(table);
                Ok(table)
            }
            Err(err) => {
                info!("Upload of {} failed: {}", path.display(), err);
                self.transition(prior);
                Err(err.into())
            }
        }
    }

    /// Add `column` to the selection if absent, remove it if present.
    /// Returns whether the column is selected afterwards.
    ///
    /// While editing, only the edited group's own columns can be toggled.
    pub fn toggle_column(&mut self, column: &str) -> SessionResult<bool> {
        if let Some(edit) = &self.editing {
            if !edit.buffer.columns.iter().any(|c| c == column) {
                return Err(SessionError::validation(format!(
                    "'{}' is not a column of '{}'",
                    column, edit.buffer.title
                )));
            }
        }

        match self.selection.iter().position(|c| c == column) {
            Some(index) => {
                self.selection.remove(index);
                Ok(false)
            }
            None => {
                self.selection.push(column.to_string());
                Ok(true)
            }
        }
    }

    fn validate_form(&self) -> SessionResult<()> {
        if self.title.trim().is_empty() || self.selection.is_empty() {
            return Err(SessionError::validation("Enter title and select columns"));
        }
        Ok(())
    }

    /// Save the current selection as a new group, or re-save the group being edited.
    ///
    /// Editing goes through the explicit update operation; creating never
    /// carries an entry id.
    pub async fn save_selected_columns(&mut self) -> SessionResult<()> {
        self.validate_form()?;

        if self.editing.is_some() {
            return self.update_edited_entry().await;
        }

        let table = self
            .table
            .as_ref()
            .ok_or_else(|| SessionError::validation("Upload a spreadsheet before saving"))?;
        if let Some(missing) = self.selection.iter().find(|c| !table.has_column(c)) {
            return Err(SessionError::validation(format!(
                "Column '{}' is not in the uploaded table",
                missing
            )));
        }

        let payload = GroupPayload {
            title: self.title.trim().to_string(),
            columns: self.selection.clone(),
            rows: table.project(&self.selection),
        };

        self.transition(DetailState::Saving);
        match self.backend.create_group(&self.project_id, &payload).await {
            Ok(_) => {
                info!(
                    "Saved group '{}' ({} columns, {} rows)",
                    payload.title,
                    payload.columns.len(),
                    payload.rows.len()
                );
                self.reset_form();
                self.refresh_after_write().await;
                Ok(())
            }
            Err(err) => {
                self.transition(self.resting_state());
                Err(err.into())
            }
        }
    }

    /// Send the edited group's title, columns and rows to the update-by-id operation.
    ///
    /// Refused when the group changed on the server since editing began.
    pub async fn update_edited_entry(&mut self) -> SessionResult<()> {
        let edit = self
            .editing
            .clone()
            .ok_or_else(|| SessionError::validation("No group is being edited"))?;
        self.validate_form()?;

        let payload = GroupPayload {
            title: self.title.trim().to_string(),
            columns: self.selection.clone(),
            rows: edit.buffer.rows.clone(),
        };

        self.transition(DetailState::Updating);
        let result = match self.ensure_not_stale(&edit).await {
            Ok(()) => self
                .backend
                .update_group(&self.project_id, &edit.buffer.id, &payload)
                .await
                .map_err(SessionError::from),
            Err(err) => Err(err),
        };

        match result {
            Ok(_) => {
                info!("Updated group '{}' ({})", payload.title, edit.buffer.id);
                self.reset_form();
                self.refresh_after_write().await;
                Ok(())
            }
            Err(err) => {
                self.transition(self.resting_state());
                Err(err)
            }
        }
    }

    /// Compare the server copy with the timestamp captured when editing started
    async fn ensure_not_stale(&self, edit: &EditSession) -> SessionResult<()> {
        let current = self.backend.list_groups(&self.project_id).await?;
        match current.iter().find(|g| g.id == edit.buffer.id) {
            None => Err(SessionError::conflict(format!(
                "'{}' was deleted by someone else",
                edit.buffer.title
            ))),
            Some(server) if server.timestamp != edit.base_timestamp => {
                Err(SessionError::conflict(format!(
                    "'{}' was changed by someone else since editing started; cancel and edit again",
                    edit.buffer.title
                )))
            }
            Some(_) => Ok(()),
        }
    }

    /// Whether `entry` may enter edit mode: nothing is being edited, or it already is
    pub fn can_edit(&self, entry: &GroupId) -> bool {
        self.editing
            .as_ref()
            .is_none_or(|edit| &edit.buffer.id == entry)
    }

    /// Start editing a saved group with a private copy of its contents.
    /// Re-entering the group already being edited keeps the pending edits.
    pub fn edit_entry(&mut self, entry: &GroupId) -> SessionResult<&AttendanceGroup> {
        if !self.can_edit(entry) {
            info!("Refused to edit {} while another group is being edited", entry);
            return Err(SessionError::conflict(
                "Finish editing the current group before editing another.",
            ));
        }

        if self.editing.is_none() {
            let group = self
                .saved
                .iter()
                .find(|g| &g.id == entry)
                .ok_or_else(|| {
                    SessionError::validation(format!("No saved group with id {}", entry))
                })?
                .clone();

            self.title = group.title.clone();
            self.selection = group.columns.clone();
            self.editing = Some(EditSession {
                base_timestamp: group.timestamp.clone(),
                buffer: group,
            });
            self.transition(DetailState::Editing);
        }

        self.editing()
            .ok_or_else(|| SessionError::validation("No group is being edited"))
    }

    /// Change one cell of the edit buffer. The key column is read-only.
    pub fn update_cell(
        &mut self,
        row_index: usize,
        column: &str,
        value: impl Into<Value>,
    ) -> SessionResult<()> {
        let edit = self
            .editing
            .as_mut()
            .ok_or_else(|| SessionError::validation("No group is being edited"))?;
        let buffer = &mut edit.buffer;

        if buffer.key_column() == Some(column) {
            return Err(SessionError::validation(format!(
                "'{}' identifies the row and cannot be edited",
                column
            )));
        }
        if !buffer.columns.iter().any(|c| c == column) {
            return Err(SessionError::validation(format!(
                "'{}' is not a column of '{}'",
                column, buffer.title
            )));
        }
        let row_count = buffer.rows.len();
        let row = buffer.rows.get_mut(row_index).ok_or_else(|| {
            SessionError::validation(format!(
                "Row {} is out of range ({} rows)",
                row_index + 1,
                row_count
            ))
        })?;

        row.insert(column.to_string(), value.into());
        Ok(())
    }

    /// Permanently delete a saved group. Not allowed while a group is being edited.
    pub async fn delete_entry(&mut self, entry: &GroupId) -> SessionResult<()> {
        if self.editing.is_some() {
            info!("Refused to delete {} during an edit session", entry);
            return Err(SessionError::conflict(
                "Finish editing the current group before deleting one.",
            ));
        }

        self.backend.delete_group(&self.project_id, entry).await?;
        info!("Deleted group {}", entry);
        self.refresh_after_write().await;
        Ok(())
    }

    /// Clear title, selection, edit buffer, uploaded table and chosen file
    pub fn reset_form(&mut self) {
        self.title.clear();
        self.selection.clear();
        self.editing = None;
        self.table = None;
        self.selected_file = None;
        self.transition(DetailState::Idle);
    }

    /// Rows to show for `group`: live edits when it is being edited, server rows otherwise
    pub fn display_rows<'a>(&'a self, group: &'a AttendanceGroup) -> &'a [Row] {
        match &self.editing {
            Some(edit) if edit.buffer.id == group.id => &edit.buffer.rows,
            _ => &group.rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::{Call, MemoryBackend};
    use serde_json::json;
    use std::io::Write;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn roster() -> UploadedTable {
        UploadedTable {
            columns: vec!["A".into(), "B".into(), "C".into()],
            rows: vec![
                row(json!({"A": "Ana", "B": 1, "C": "x"})),
                row(json!({"A": "Ben", "B": 2, "C": ""})),
            ],
        }
    }

    /// A real file on disk; the in-memory backend ignores its bytes
    fn spreadsheet() -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "attendance-cli-test-{}-{:?}.xlsx",
            std::process::id(),
            std::thread::current().id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not really a workbook").unwrap();
        path
    }

    async fn session() -> (Arc<MemoryBackend>, DetailSession) {
        let backend = Arc::new(MemoryBackend::new().with_project("p1", "Week 1"));
        let project = ProjectId::new("p1");
        backend.stage_upload(&project, roster());

        let mut session = DetailSession::new(backend.clone(), project);
        session.load().await.unwrap();
        backend.clear_calls();
        (backend, session)
    }

    async fn uploaded() -> (Arc<MemoryBackend>, DetailSession) {
        let (backend, mut session) = session().await;
        session.select_file(spreadsheet());
        session.upload_file().await.unwrap();
        backend.clear_calls();
        (backend, session)
    }

    async fn with_saved_group() -> (Arc<MemoryBackend>, DetailSession, GroupId) {
        let (backend, mut session) = uploaded().await;
        session.set_title("Morning");
        session.toggle_column("A").unwrap();
        session.toggle_column("C").unwrap();
        session.save_selected_columns().await.unwrap();
        let id = session.saved()[0].id.clone();
        backend.clear_calls();
        (backend, session, id)
    }

    #[tokio::test]
    async fn test_load_fetches_name_and_groups() {
        let (_, session) = session().await;

        assert_eq!(session.project_name(), Some("Week 1"));
        assert!(session.saved().is_empty());
        assert_eq!(session.state(), DetailState::Idle);
    }

    #[tokio::test]
    async fn test_upload_offers_columns() {
        let (backend, mut session) = session().await;
        session.select_file(spreadsheet());

        let table = session.upload_file().await.unwrap();

        assert_eq!(table.columns, vec!["A", "B", "C"]);
        assert_eq!(session.state(), DetailState::ColumnsOffered);
        let calls = backend.calls();
        assert!(matches!(calls.as_slice(), [Call::Upload(_)]));
    }

    #[tokio::test]
    async fn test_upload_without_file_makes_no_request() {
        let (backend, mut session) = session().await;

        let err = session.upload_file().await.unwrap_err();

        assert!(matches!(err, SessionError::Validation(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_second_upload_replaces_table_and_prunes_selection() {
        let (backend, mut session) = uploaded().await;
        session.toggle_column("A").unwrap();
        session.toggle_column("B").unwrap();

        backend.stage_upload(
            &ProjectId::new("p1"),
            UploadedTable {
                columns: vec!["A".to_string(), "Z".to_string()],
                rows: vec![row(json!({"A": "Cy", "Z": true}))],
            },
        );
        session.upload_file().await.unwrap();

        let table = session.table().unwrap();
        assert_eq!(table.columns, vec!["A", "Z"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(session.selection(), ["A".to_string()]);
        assert_eq!(session.state(), DetailState::ColumnsOffered);
    }

    #[tokio::test]
    async fn test_failed_upload_restores_prior_state() {
        let (backend, mut session, _) = with_saved_group().await;
        session.select_file(spreadsheet());

        backend.fail_next(500);
        let err = session.upload_file().await.unwrap_err();

        assert!(matches!(err, SessionError::Transport(_)));
        assert_eq!(session.state(), DetailState::Idle);
        assert!(session.table().is_none());
        assert_eq!(session.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_transport_error() {
        let (backend, mut session) = session().await;
        session.select_file("/definitely/not/here.xlsx");

        let err = session.upload_file().await.unwrap_err();

        assert!(matches!(err, SessionError::Transport(crate::api::ApiError::Io { .. })));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = DetailSession::new(backend, ProjectId::new("p1"));

        for count in 1..=6 {
            let selected = session.toggle_column("B").unwrap();
            assert_eq!(selected, count % 2 == 1);
            assert_eq!(session.is_selected("B"), count % 2 == 1);
            assert!(session.selection().iter().filter(|c| *c == "B").count() <= 1);
        }
    }

    #[tokio::test]
    async fn test_save_projects_selected_columns() {
        let (backend, mut session) = uploaded().await;
        session.set_title("Morning");
        session.toggle_column("A").unwrap();
        session.toggle_column("C").unwrap();

        session.save_selected_columns().await.unwrap();

        let saved = backend.groups(&ProjectId::new("p1"));
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].columns, vec!["A", "C"]);
        assert_eq!(
            saved[0].rows,
            vec![
                row(json!({"A": "Ana", "C": "x"})),
                row(json!({"A": "Ben", "C": ""}))
            ]
        );
        assert_eq!(
            backend.calls(),
            vec![Call::CreateGroup("Morning".into()), Call::ListGroups]
        );

        // Form and table are discarded after a successful save
        assert_eq!(session.state(), DetailState::Idle);
        assert!(session.table().is_none());
        assert!(session.selection().is_empty());
        assert_eq!(session.title(), "");
        assert_eq!(session.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_save_with_blank_title_or_no_columns_makes_no_request() {
        let (backend, mut session) = uploaded().await;

        session.set_title("   ");
        session.toggle_column("A").unwrap();
        assert!(matches!(
            session.save_selected_columns().await,
            Err(SessionError::Validation(_))
        ));

        session.set_title("Morning");
        session.toggle_column("A").unwrap();
        assert!(matches!(
            session.save_selected_columns().await,
            Err(SessionError::Validation(_))
        ));

        assert!(backend.calls().is_empty());
        assert!(session.saved().is_empty());
        assert_eq!(session.title(), "Morning");
    }

    #[tokio::test]
    async fn test_save_without_upload_is_rejected() {
        let (backend, mut session) = session().await;
        session.set_title("Morning");
        session.toggle_column("A").unwrap();

        let err = session.save_selected_columns().await.unwrap_err();

        assert!(matches!(err, SessionError::Validation(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_form() {
        let (backend, mut session) = uploaded().await;
        session.set_title("Morning");
        session.toggle_column("B").unwrap();

        backend.fail_next(500);
        assert!(session.save_selected_columns().await.is_err());

        assert_eq!(session.title(), "Morning");
        assert_eq!(session.selection(), ["B".to_string()]);
        assert_eq!(session.state(), DetailState::ColumnsOffered);
        assert!(backend.groups(&ProjectId::new("p1")).is_empty());
    }

    #[tokio::test]
    async fn test_second_edit_session_is_refused() {
        let (backend, mut session) = uploaded().await;
        for title in ["First", "Second"] {
            session.select_file(spreadsheet());
            session.upload_file().await.unwrap();
            session.set_title(title);
            session.toggle_column("A").unwrap();
            session.save_selected_columns().await.unwrap();
        }
        backend.clear_calls();
        let g1 = session.saved()[0].id.clone();
        let g2 = session.saved()[1].id.clone();

        session.edit_entry(&g1).unwrap();
        let err = session.edit_entry(&g2).unwrap_err();

        assert!(matches!(err, SessionError::Conflict(_)));
        assert_eq!(session.editing().map(|g| &g.id), Some(&g1));
        assert!(session.can_edit(&g1));
        assert!(!session.can_edit(&g2));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_edit_seeds_form_from_group() {
        let (_, mut session, id) = with_saved_group().await;

        session.edit_entry(&id).unwrap();

        assert_eq!(session.state(), DetailState::Editing);
        assert_eq!(session.title(), "Morning");
        assert_eq!(session.selection(), ["A".to_string(), "C".to_string()]);
    }

    #[tokio::test]
    async fn test_edit_round_trip_changes_exactly_one_cell() {
        let (backend, mut session, id) = with_saved_group().await;
        let before = backend.groups(&ProjectId::new("p1"))[0].clone();

        session.edit_entry(&id).unwrap();
        session.update_cell(1, "C", "late").unwrap();
        session.update_edited_entry().await.unwrap();

        let after = backend.groups(&ProjectId::new("p1"))[0].clone();
        assert_eq!(after.rows[0], before.rows[0]);
        assert_eq!(after.rows[1]["A"], json!("Ben"));
        assert_eq!(after.rows[1]["C"], json!("late"));
        assert_eq!(after.columns, before.columns);
        assert!(session.editing().is_none());
        assert_eq!(session.saved()[0].rows[1]["C"], json!("late"));
    }

    #[tokio::test]
    async fn test_key_column_is_not_editable() {
        let (_, mut session, id) = with_saved_group().await;
        session.edit_entry(&id).unwrap();

        let err = session.update_cell(0, "A", "Zed").unwrap_err();

        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(session.editing().unwrap().rows[0]["A"], json!("Ana"));
    }

    #[tokio::test]
    async fn test_update_cell_bounds() {
        let (_, mut session, id) = with_saved_group().await;

        assert!(session.update_cell(0, "C", "x").is_err());

        session.edit_entry(&id).unwrap();
        assert!(session.update_cell(9, "C", "x").is_err());
        assert!(session.update_cell(0, "B", "x").is_err());
        assert!(session.update_cell(0, "C", "y").is_ok());
    }

    #[tokio::test]
    async fn test_display_rows_follow_edit_buffer() {
        let (_, mut session, id) = with_saved_group().await;
        session.edit_entry(&id).unwrap();
        session.update_cell(0, "C", "edited").unwrap();

        let group = session.saved()[0].clone();
        assert_eq!(session.display_rows(&group)[0]["C"], json!("edited"));
        assert_eq!(group.rows[0]["C"], json!("x"));

        session.reset_form();
        assert_eq!(session.display_rows(&group)[0]["C"], json!("x"));
    }

    #[tokio::test]
    async fn test_save_while_editing_routes_to_update() {
        let (backend, mut session, id) = with_saved_group().await;
        session.edit_entry(&id).unwrap();
        session.set_title("Renamed");

        session.save_selected_columns().await.unwrap();

        let calls = backend.calls();
        assert!(calls.contains(&Call::UpdateGroup(id.clone())));
        assert!(!calls.iter().any(|c| matches!(c, Call::CreateGroup(_))));
        assert_eq!(backend.groups(&ProjectId::new("p1"))[0].title, "Renamed");
    }

    #[tokio::test]
    async fn test_stale_update_is_refused() {
        let (backend, mut session, id) = with_saved_group().await;
        session.edit_entry(&id).unwrap();
        session.update_cell(0, "C", "mine").unwrap();

        backend.overwrite_group(&ProjectId::new("p1"), &id, "Theirs");
        let err = session.update_edited_entry().await.unwrap_err();

        assert!(matches!(err, SessionError::Conflict(_)));
        assert!(!backend.calls().contains(&Call::UpdateGroup(id.clone())));
        assert_eq!(session.state(), DetailState::Editing);
        assert_eq!(session.editing().unwrap().rows[0]["C"], json!("mine"));
    }

    #[tokio::test]
    async fn test_failed_update_keeps_edit_session() {
        let (backend, mut session, id) = with_saved_group().await;
        session.edit_entry(&id).unwrap();
        session.update_cell(0, "C", "mine").unwrap();

        backend.fail_next(503);
        assert!(session.update_edited_entry().await.is_err());

        assert_eq!(session.editing().map(|g| &g.id), Some(&id));
        assert_eq!(session.state(), DetailState::Editing);
    }

    #[tokio::test]
    async fn test_delete_removes_only_that_group() {
        let (backend, mut session, first) = with_saved_group().await;
        session.select_file(spreadsheet());
        session.upload_file().await.unwrap();
        session.set_title("Afternoon");
        session.toggle_column("B").unwrap();
        session.save_selected_columns().await.unwrap();
        let before = session.saved().to_vec();

        session.delete_entry(&first).await.unwrap();

        let after = session.saved().to_vec();
        assert_eq!(after.len(), 1);
        assert!(after.iter().all(|g| g.id != first));
        assert_eq!(after[0], before[1]);
        assert_eq!(backend.groups(&ProjectId::new("p1")), after);
    }

    #[tokio::test]
    async fn test_delete_refused_while_editing() {
        let (backend, mut session, id) = with_saved_group().await;
        session.edit_entry(&id).unwrap();

        let err = session.delete_entry(&id).await.unwrap_err();

        assert!(matches!(err, SessionError::Conflict(_)));
        assert!(backend.calls().is_empty());
        assert_eq!(session.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_entry() {
        let (backend, mut session, id) = with_saved_group().await;

        backend.fail_next(500);
        assert!(session.delete_entry(&id).await.is_err());

        assert_eq!(session.saved().len(), 1);
        assert_eq!(backend.groups(&ProjectId::new("p1")).len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_while_editing_is_limited_to_group_columns() {
        let (_, mut session, id) = with_saved_group().await;
        session.edit_entry(&id).unwrap();

        assert!(session.toggle_column("B").is_err());
        assert_eq!(session.toggle_column("C").unwrap(), false);
        assert_eq!(session.toggle_column("C").unwrap(), true);
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let (_, mut session, id) = with_saved_group().await;
        session.select_file(spreadsheet());
        session.upload_file().await.unwrap();
        session.edit_entry(&id).unwrap();

        session.reset_form();

        assert_eq!(session.state(), DetailState::Idle);
        assert!(session.editing().is_none());
        assert!(session.table().is_none());
        assert!(session.selected_file().is_none());
        assert!(session.selection().is_empty());
        assert_eq!(session.title(), "");
    }
}
