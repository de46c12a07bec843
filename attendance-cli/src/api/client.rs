//! reqwest-backed implementation of [`Backend`]

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::backend::Backend;
use super::error::ApiError;
use super::models::{
    Ack, AttendanceGroup, GroupId, GroupPayload, NewProject, Project, ProjectId, UploadEnvelope,
    UploadFile, UploadedTable,
};
use crate::config::Config;

/// Error body the backend sends alongside 4xx/5xx responses
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for the attendance backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self::with_client(&config.api_url, http))
    }

    pub fn with_client(base_url: &str, http: Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join percent-encoded path segments onto the base URL
    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| body.trim().to_string());
            debug!("Backend responded {} ({})", status, message);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let url = self.url(&["projects"]);
        debug!("GET {}", url);
        self.send(self.http.get(url)).await
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        let url = self.url(&["projects"]);
        debug!("POST {}", url);
        self.send(self.http.post(url).json(project)).await
    }

    async fn upload(
        &self,
        project: &ProjectId,
        file: UploadFile,
    ) -> Result<UploadedTable, ApiError> {
        let url = self.url(&["upload", project.as_str()]);
        debug!("POST {} ({}, {} bytes)", url, file.file_name, file.bytes.len());

        let part = Part::bytes(file.bytes).file_name(file.file_name);
        let form = Form::new().part("file", part);
        let envelope: UploadEnvelope = self.send(self.http.post(url).multipart(form)).await?;
        envelope.into_table()
    }

    async fn list_groups(&self, project: &ProjectId) -> Result<Vec<AttendanceGroup>, ApiError> {
        let url = self.url(&["attendance", project.as_str()]);
        debug!("GET {}", url);
        self.send(self.http.get(url)).await
    }

    async fn create_group(
        &self,
        project: &ProjectId,
        payload: &GroupPayload,
    ) -> Result<Ack, ApiError> {
        let url = self.url(&["attendance", project.as_str()]);
        debug!("POST {} ({} rows)", url, payload.rows.len());
        self.send(self.http.post(url).json(payload)).await
    }

    async fn update_group(
        &self,
        project: &ProjectId,
        group: &GroupId,
        payload: &GroupPayload,
    ) -> Result<Ack, ApiError> {
        let url = self.url(&["attendance", project.as_str(), group.as_str()]);
        debug!("PUT {} ({} rows)", url, payload.rows.len());
        self.send(self.http.put(url).json(payload)).await
    }

    async fn delete_group(&self, project: &ProjectId, group: &GroupId) -> Result<Ack, ApiError> {
        let url = self.url(&["attendance", project.as_str(), group.as_str()]);
        debug!("DELETE {}", url);
        self.send(self.http.delete(url)).await
    }
}
