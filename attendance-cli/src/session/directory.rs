//! Project directory: list, create and pick projects

use std::sync::Arc;

use log::{debug, warn};

use super::error::{SessionError, SessionResult};
use crate::api::{Backend, NewProject, Project, ProjectId};

/// Contents of the "new project" form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
}

pub struct DirectorySession {
    backend: Arc<dyn Backend>,
    projects: Vec<Project>,
    form: Option<ProjectForm>,
}

impl DirectorySession {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            projects: Vec::new(),
            form: None,
        }
    }

    /// Projects as last fetched, newest first
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Fetch projects, newest first. On failure the previous list is kept.
    pub async fn list_projects(&mut self) -> SessionResult<&[Project]> {
        let mut projects = self.backend.list_projects().await?;
        // Backend returns insertion order
        projects.reverse();
        debug!("Loaded {} projects", projects.len());
        self.projects = projects;
        Ok(&self.projects)
    }

    /// Create a project. Blank names and descriptions are passed through as-is.
    ///
    /// On success the form is closed and the list refreshed; on failure the
    /// form is left untouched so the user can retry.
    pub async fn create_project(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> SessionResult<Project> {
        let request = NewProject {
            name: name.into(),
            description: description.into(),
        };
        let created = self.backend.create_project(&request).await?;
        debug!("Created project {} ({})", created.name, created.id);

        self.form = None;
        if let Err(err) = self.list_projects().await {
            warn!("Project created but the list could not be refreshed: {}", err);
        }
        Ok(created)
    }

    pub fn open_form(&mut self) -> &mut ProjectForm {
        self.form.get_or_insert_with(ProjectForm::default)
    }

    pub fn form(&self) -> Option<&ProjectForm> {
        self.form.as_ref()
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Create a project from the open form
    pub async fn submit_form(&mut self) -> SessionResult<Project> {
        let form = self
            .form
            .clone()
            .ok_or_else(|| SessionError::validation("No project form is open"))?;
        self.create_project(form.name, form.description).await
    }

    /// Project id at a displayed position
    pub fn select(&self, index: usize) -> Option<&ProjectId> {
        self.projects.get(index).map(|p| &p.id)
    }

    /// Look a project up by id, falling back to an exact name match
    pub fn find(&self, needle: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.id.as_str() == needle)
            .or_else(|| self.projects.iter().find(|p| p.name == needle))
    }
}
