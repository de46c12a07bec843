//! The seam between sessions and whatever serves the attendance API

use async_trait::async_trait;

use super::error::ApiError;
use super::models::{
    Ack, AttendanceGroup, GroupId, GroupPayload, NewProject, Project, ProjectId, UploadFile,
    UploadedTable,
};

/// Operations offered by the attendance backend.
///
/// Every call is a single request with no retries; a failure means the
/// operation was not applied.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /projects`, in insertion order
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    /// `POST /projects`
    async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError>;

    /// `POST /upload/:projectId` with multipart field `file`
    async fn upload(&self, project: &ProjectId, file: UploadFile)
    -> Result<UploadedTable, ApiError>;

    /// `GET /attendance/:projectId`
    async fn list_groups(&self, project: &ProjectId) -> Result<Vec<AttendanceGroup>, ApiError>;

    /// `POST /attendance/:projectId`
    async fn create_group(
        &self,
        project: &ProjectId,
        payload: &GroupPayload,
    ) -> Result<Ack, ApiError>;

    /// `PUT /attendance/:projectId/:entryId`
    async fn update_group(
        &self,
        project: &ProjectId,
        group: &GroupId,
        payload: &GroupPayload,
    ) -> Result<Ack, ApiError>;

    /// `DELETE /attendance/:projectId/:entryId`
    async fn delete_group(&self, project: &ProjectId, group: &GroupId) -> Result<Ack, ApiError>;
}
