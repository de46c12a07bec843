//! Wire models for the attendance backend

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::ApiError;

/// One spreadsheet row: column name mapped to its cell value
pub type Row = Map<String, Value>;

/// Declares a string identifier newtype that also accepts numeric ids on the wire
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Text(String),
                    Number(i64),
                }

                Ok(match Raw::deserialize(deserializer)? {
                    Raw::Text(text) => Self(text),
                    Raw::Number(number) => Self(number.to_string()),
                })
            }
        }
    };
}

id_type!(
    /// Backend-assigned project identifier, used as the routing key
    ProjectId
);

id_type!(
    /// Backend-assigned attendance group identifier (`_id` on the wire)
    GroupId
);

/// A top-level container for attendance groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Owned by the backend; ISO-8601 without offset in practice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited: Option<String>,
}

/// Payload for `POST /projects`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
}

/// A named, persisted subset of an uploaded table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceGroup {
    #[serde(rename = "_id")]
    pub id: GroupId,
    pub title: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl AttendanceGroup {
    /// The first column identifies a row and is never edited
    pub fn key_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }
}

/// Body for creating or updating an attendance group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPayload {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Acknowledgement returned by mutating calls, e.g. `{"status": "saved"}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
impl Ack {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
        }
    }
}

/// Parsed spreadsheet returned by an upload. Lives only in the detail session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl UploadedTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Restrict every row to `selection`, in selection order. Missing cells become null
    /// so each projected row carries every selected key.
    pub fn project(&self, selection: &[String]) -> Vec<Row> {
        self.rows
            .iter()
            .map(|row| {
                selection
                    .iter()
                    .map(|col| (col.clone(), row.get(col).cloned().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect()
    }
}

/// File contents queued for `POST /upload/:projectId`
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub async fn read(path: &Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.xlsx".to_string());
        Ok(Self { file_name, bytes })
    }
}

/// Upload response envelope: `{ status, data, columns }` or `{ error }`
#[derive(Debug, Deserialize)]
pub struct UploadEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<UploadData>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Row data as sent by the backend, either per record or per column
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UploadData {
    Records(Vec<Row>),
    Columnar(Map<String, Value>),
}

impl UploadEnvelope {
    pub fn into_table(self) -> Result<UploadedTable, ApiError> {
        if self.status.as_deref() != Some("ok") {
            let reported = self
                .error
                .or(self.status)
                .unwrap_or_else(|| "missing status".to_string());
            return Err(ApiError::Envelope(reported));
        }

        let rows = match self.data {
            None => Vec::new(),
            Some(UploadData::Records(rows)) => rows,
            Some(UploadData::Columnar(columns)) => columnar_to_rows(&self.columns, columns),
        };

        // Without a column list, order follows the keys of the first row as sent
        let columns = if self.columns.is_empty() {
            rows.first()
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default()
        } else {
            self.columns
        };

        Ok(UploadedTable { columns, rows })
    }
}

/// `{"A": [1, 2], "B": [3, 4]}` into `[{"A": 1, "B": 3}, {"A": 2, "B": 4}]`.
/// Ragged columns are padded with null.
fn columnar_to_rows(order: &[String], columns: Map<String, Value>) -> Vec<Row> {
    let mut names: Vec<&String> = order.iter().filter(|c| columns.contains_key(*c)).collect();
    names.extend(columns.keys().filter(|c| !order.contains(c)));

    let height = columns
        .values()
        .filter_map(Value::as_array)
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    (0..height)
        .map(|index| {
            names
                .iter()
                .map(|name| {
                    let cell = columns
                        .get(*name)
                        .and_then(Value::as_array)
                        .and_then(|values| values.get(index))
                        .cloned()
                        .unwrap_or(Value::Null);
                    ((*name).clone(), cell)
                })
                .collect()
        })
        .collect()
}

/// Render a backend timestamp for humans, falling back to the raw text
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
    }
    match chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Text shown for a cell value
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
