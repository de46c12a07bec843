//! Client-side sessions
//!
//! A [`DirectorySession`] lists and creates projects. A [`DetailSession`]
//! drives one project's upload, column selection and attendance group
//! lifecycle. Sessions hold only transient state; everything durable lives in
//! the backend and is re-fetched when a session loads.

pub mod detail;
pub mod directory;
pub mod error;

pub use detail::{DetailSession, DetailState};
pub use directory::DirectorySession;
pub use error::{SessionError, SessionResult};
