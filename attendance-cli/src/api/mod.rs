//! Attendance backend API
//!
//! Typed wrappers around the REST backend that stores projects and their
//! attendance groups. Sessions talk to it through the [`Backend`] trait so the
//! HTTP client can be swapped for an in-memory double in tests.

pub mod backend;
pub mod client;
pub mod error;
#[cfg(test)]
pub mod memory;
pub mod models;

pub use backend::Backend;
pub use client::HttpBackend;
pub use error::ApiError;
pub use models::{
    AttendanceGroup, GroupId, GroupPayload, NewProject, Project, ProjectId, Row, UploadFile,
    UploadedTable, cell_text, format_timestamp,
};
