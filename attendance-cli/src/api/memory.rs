//! In-memory [`Backend`] for session tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::backend::Backend;
use super::error::ApiError;
use super::models::{
    Ack, AttendanceGroup, GroupId, GroupPayload, NewProject, Project, ProjectId, UploadFile,
    UploadedTable,
};

/// A request observed by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListProjects,
    CreateProject(String),
    Upload(String),
    ListGroups,
    CreateGroup(String),
    UpdateGroup(GroupId),
    DeleteGroup(GroupId),
}

#[derive(Default)]
struct State {
    projects: Vec<Project>,
    groups: HashMap<ProjectId, Vec<AttendanceGroup>>,
    uploads: HashMap<ProjectId, UploadedTable>,
    calls: Vec<Call>,
    fail_next: Option<u16>,
    clock: u64,
}

impl State {
    fn tick(&mut self) -> String {
        self.clock += 1;
        format!("2024-01-01T00:00:{:02}", self.clock % 60)
    }

    fn record(&mut self, call: Call) -> Result<(), ApiError> {
        self.calls.push(call);
        match self.fail_next.take() {
            Some(status) => Err(ApiError::Http {
                status,
                message: "injected failure".into(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, id: &str, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let last_edited = Some(state.tick());
            state.projects.push(Project {
                id: ProjectId::new(id),
                name: name.into(),
                description: String::new(),
                last_edited,
            });
        }
        self
    }

    /// Table returned by the next uploads into `project`
    pub fn stage_upload(&self, project: &ProjectId, table: UploadedTable) {
        self.state
            .lock()
            .unwrap()
            .uploads
            .insert(project.clone(), table);
    }

    /// Make the next request fail with `status` without being applied
    pub fn fail_next(&self, status: u16) {
        self.state.lock().unwrap().fail_next = Some(status);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn groups(&self, project: &ProjectId) -> Vec<AttendanceGroup> {
        self.state
            .lock()
            .unwrap()
            .groups
            .get(project)
            .cloned()
            .unwrap_or_default()
    }

    /// Simulate another client rewriting a group
    pub fn overwrite_group(&self, project: &ProjectId, group: &GroupId, title: &str) {
        let mut state = self.state.lock().unwrap();
        let timestamp = state.tick();
        if let Some(entry) = state
            .groups
            .get_mut(project)
            .and_then(|groups| groups.iter_mut().find(|g| &g.id == group))
        {
            entry.title = title.into();
            entry.timestamp = Some(timestamp);
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::ListProjects)?;
        Ok(state.projects.clone())
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CreateProject(project.name.clone()))?;
        let last_edited = Some(state.tick());
        let created = Project {
            id: ProjectId::new(format!("p{}", state.projects.len() + 1)),
            name: project.name.clone(),
            description: project.description.clone(),
            last_edited,
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn upload(
        &self,
        project: &ProjectId,
        file: UploadFile,
    ) -> Result<UploadedTable, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::Upload(file.file_name))?;
        state
            .uploads
            .get(project)
            .cloned()
            .ok_or_else(|| ApiError::Envelope("no staged upload".into()))
    }

    async fn list_groups(&self, project: &ProjectId) -> Result<Vec<AttendanceGroup>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::ListGroups)?;
        Ok(state.groups.get(project).cloned().unwrap_or_default())
    }

    async fn create_group(
        &self,
        project: &ProjectId,
        payload: &GroupPayload,
    ) -> Result<Ack, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CreateGroup(payload.title.clone()))?;
        let timestamp = Some(state.tick());
        let id = GroupId::new(format!("g{}", state.clock));
        state.groups.entry(project.clone()).or_default().push(AttendanceGroup {
            id,
            title: payload.title.clone(),
            columns: payload.columns.clone(),
            rows: payload.rows.clone(),
            timestamp,
        });
        Ok(Ack::new("saved"))
    }

    async fn update_group(
        &self,
        project: &ProjectId,
        group: &GroupId,
        payload: &GroupPayload,
    ) -> Result<Ack, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::UpdateGroup(group.clone()))?;
        let timestamp = Some(state.tick());
        let entry = state
            .groups
            .get_mut(project)
            .and_then(|groups| groups.iter_mut().find(|g| &g.id == group))
            .ok_or_else(|| ApiError::Http {
                status: 404,
                message: "Entry not found".into(),
            })?;
        entry.title = payload.title.clone();
        entry.columns = payload.columns.clone();
        entry.rows = payload.rows.clone();
        entry.timestamp = timestamp;
        Ok(Ack::new("updated"))
    }

    async fn delete_group(&self, project: &ProjectId, group: &GroupId) -> Result<Ack, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::DeleteGroup(group.clone()))?;
        if let Some(groups) = state.groups.get_mut(project) {
            groups.retain(|g| &g.id != group);
        }
        Ok(Ack::new("deleted"))
    }
}
