//! Backup file format: the export document and the validating import parser.
//!
//! Import never trusts field presence alone. Every known field that appears
//! under `data` is deserialized into its typed form and a failure names the
//! field, so a bad backup is rejected before anything is written.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{PartialBlob, PersistedBlob};

/// Version tag written into exports and next to the stored blob.
pub const STORAGE_VERSION: &str = "1.0";

/// Why a backup could not be imported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("backup is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("backup must be a JSON object")]
    NotAnObject,
    #[error("invalid backup file format: missing `data`")]
    MissingData,
    #[error("invalid `{field}`: {reason}")]
    MalformedField { field: &'static str, reason: String },
}

/// `{version, exportDate, data}` as written by an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub data: PersistedBlob,
}

impl ExportDocument {
    pub fn new(data: PersistedBlob) -> Self {
        Self {
            version: STORAGE_VERSION.to_string(),
            export_date: Utc::now(),
            data,
        }
    }

    /// `sitconnect_backup_<YYYY-MM-DD>.json`, dated by the export time (UTC).
    pub fn file_name(&self) -> String {
        format!(
            "sitconnect_backup_{}.json",
            self.export_date.format("%Y-%m-%d")
        )
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Parse and validate backup text into the data it carries.
pub fn parse_backup(text: &str) -> Result<PartialBlob, ImportError> {
    let root: Value =
        serde_json::from_str(text).map_err(|e| ImportError::InvalidJson(e.to_string()))?;
    let Value::Object(root) = root else {
        return Err(ImportError::NotAnObject);
    };

    if let Some(version) = root.get("version").and_then(Value::as_str)
        && version != STORAGE_VERSION
    {
        tracing::warn!(version, expected = STORAGE_VERSION, "importing backup with unexpected version");
    }

    let data = match root.get("data") {
        None | Some(Value::Null) => return Err(ImportError::MissingData),
        Some(Value::Object(data)) => data,
        Some(_) => {
            return Err(ImportError::MalformedField {
                field: "data",
                reason: "expected an object".to_string(),
            });
        }
    };

    Ok(PartialBlob {
        notices: field(data, "notices")?,
        applications: field(data, "applications")?,
        selected_applicants: field(data, "selectedApplicants")?,
        applied_notices: field(data, "appliedNotices")?,
        parent_data: field(data, "parentData")?,
        current_student_data: field(data, "currentStudentData")?,
        // Present-but-null is a real value here: it clears the role.
        user_role: field(data, "userRole")?,
        last_sync: field::<Option<DateTime<Utc>>>(data, "lastSync")?.flatten(),
    })
}

/// Deserialize `data[name]` if present.
fn field<T: DeserializeOwned>(
    data: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<T>, ImportError> {
    match data.get(name) {
        None => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| ImportError::MalformedField {
                field: name,
                reason: e.to_string(),
            }),
    }
}
