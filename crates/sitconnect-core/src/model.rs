//! Domain records for the marketplace and the persisted blob that carries them.
//!
//! Everything here is a plain value. The JSON field names match the on-device
//! storage format (camelCase), so blobs written by older builds load unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Applicant id used for the student operating this device.
pub const CURRENT_STUDENT_ID: &str = "current-user";

/// Notice id → ordered applicant ids. Used for both applications and selections.
pub type ApplicantIndex = BTreeMap<String, Vec<String>>;

/// Which side of the marketplace the user is acting as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parent" => Ok(Role::Parent),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role '{}' (expected parent or student)", other)),
        }
    }
}

/// One child described on a notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub age: String,
    pub gender: String,
    pub interests: String,
}

/// A babysitting job posted by a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: String,
    pub date: String,
    pub time: String,
    pub pay_per_hour: String,
    pub area: String,
    pub notes: String,
    pub children: Vec<Child>,
    pub applicant_count: u32,
}

impl Notice {
    /// Short "when" label used in notifications: `<date> at <time>`.
    pub fn details(&self) -> String {
        format!("{} at {}", self.date, self.time)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub area: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub grad_year: String,
    pub experience: String,
    pub interests: Vec<String>,
    pub email: String,
    pub phone: String,
    pub bio: String,
}

impl Default for StudentProfile {
    fn default() -> Self {
        Self {
            id: CURRENT_STUDENT_ID.to_string(),
            name: String::new(),
            grad_year: String::new(),
            experience: "0".to_string(),
            interests: Vec::new(),
            email: String::new(),
            phone: String::new(),
            bio: String::new(),
        }
    }
}

/// All domain state held by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppData {
    pub notices: Vec<Notice>,
    pub applications: ApplicantIndex,
    pub selected_applicants: ApplicantIndex,
    pub applied_notices: Vec<String>,
    pub parent_data: ParentProfile,
    pub current_student_data: StudentProfile,
    pub user_role: Option<Role>,
}

impl AppData {
    pub fn notice(&self, id: &str) -> Option<&Notice> {
        self.notices.iter().find(|n| n.id == id)
    }

    /// Newest notices come first.
    pub fn post_notice(&mut self, notice: Notice) {
        self.notices.insert(0, notice);
    }

    /// Record `student_id` applying to `notice_id`.
    ///
    /// Appends to the application list and the applied set, then bumps the
    /// notice's applicant count. Returns false if the notice does not exist;
    /// the index updates still happen in that case.
    pub fn record_application(&mut self, notice_id: &str, student_id: &str) -> bool {
        self.applications
            .entry(notice_id.to_string())
            .or_default()
            .push(student_id.to_string());
        self.applied_notices.push(notice_id.to_string());

        match self.notices.iter_mut().find(|n| n.id == notice_id) {
            Some(notice) => {
                notice.applicant_count = notice.applicant_count.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Append `applicant_id` to the selection list for `notice_id`. No dedup.
    pub fn select_applicant(&mut self, notice_id: &str, applicant_id: &str) {
        self.selected_applicants
            .entry(notice_id.to_string())
            .or_default()
            .push(applicant_id.to_string());
    }

    pub fn applicants(&self, notice_id: &str) -> &[String] {
        self.applications
            .get(notice_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn selected(&self, notice_id: &str) -> &[String] {
        self.selected_applicants
            .get(notice_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_applied(&self, notice_id: &str) -> bool {
        self.applied_notices.iter().any(|id| id == notice_id)
    }

    pub fn is_selected(&self, notice_id: &str, applicant_id: &str) -> bool {
        self.selected(notice_id).iter().any(|id| id == applicant_id)
    }

    /// Drop notices, indices and role. Profiles survive.
    pub fn clear_activity(&mut self) {
        self.notices.clear();
        self.applications.clear();
        self.selected_applicants.clear();
        self.applied_notices.clear();
        self.user_role = None;
    }

    /// Adopt every field present in `partial`; absent fields are left alone.
    pub fn adopt(&mut self, partial: PartialBlob) {
        if let Some(notices) = partial.notices {
            self.notices = notices;
        }
        if let Some(applications) = partial.applications {
            self.applications = applications;
        }
        if let Some(selected) = partial.selected_applicants {
            self.selected_applicants = selected;
        }
        if let Some(applied) = partial.applied_notices {
            self.applied_notices = applied;
        }
        if let Some(parent) = partial.parent_data {
            self.parent_data = parent;
        }
        if let Some(student) = partial.current_student_data {
            self.current_student_data = student;
        }
        if let Some(role) = partial.user_role {
            self.user_role = role;
        }
    }

    /// Total applicant ids across every notice, duplicates included.
    pub fn applicant_total(&self) -> usize {
        self.applications.values().map(Vec::len).sum()
    }
}

/// The unit of storage and of export/import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedBlob {
    #[serde(flatten)]
    pub data: AppData,
    pub last_sync: Option<DateTime<Utc>>,
}

impl PersistedBlob {
    /// Overlay the domain fields of `partial`. `last_sync` is the caller's job.
    pub fn merge(&mut self, partial: PartialBlob) {
        self.data.adopt(partial);
    }
}

/// A blob with every field optional: the argument of a save and the result of
/// an import.
///
/// `user_role` is doubly optional so that "not provided" and "explicitly null"
/// stay distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialBlob {
    pub notices: Option<Vec<Notice>>,
    pub applications: Option<ApplicantIndex>,
    pub selected_applicants: Option<ApplicantIndex>,
    pub applied_notices: Option<Vec<String>>,
    pub parent_data: Option<ParentProfile>,
    pub current_student_data: Option<StudentProfile>,
    pub user_role: Option<Option<Role>>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl PartialBlob {
    pub fn is_empty(&self) -> bool {
        *self == PartialBlob::default()
    }

    /// Combine two partials; fields present in `newer` win.
    pub fn overlay(self, newer: PartialBlob) -> PartialBlob {
        PartialBlob {
            notices: newer.notices.or(self.notices),
            applications: newer.applications.or(self.applications),
            selected_applicants: newer.selected_applicants.or(self.selected_applicants),
            applied_notices: newer.applied_notices.or(self.applied_notices),
            parent_data: newer.parent_data.or(self.parent_data),
            current_student_data: newer.current_student_data.or(self.current_student_data),
            user_role: newer.user_role.or(self.user_role),
            last_sync: newer.last_sync.or(self.last_sync),
        }
    }
}

impl From<AppData> for PartialBlob {
    fn from(data: AppData) -> Self {
        PartialBlob {
            notices: Some(data.notices),
            applications: Some(data.applications),
            selected_applicants: Some(data.selected_applicants),
            applied_notices: Some(data.applied_notices),
            parent_data: Some(data.parent_data),
            current_student_data: Some(data.current_student_data),
            user_role: Some(data.user_role),
            last_sync: None,
        }
    }
}

impl From<PersistedBlob> for PartialBlob {
    fn from(blob: PersistedBlob) -> Self {
        PartialBlob {
            last_sync: blob.last_sync,
            ..PartialBlob::from(blob.data)
        }
    }
}

/// Rejection reasons for a notice draft.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("child {index}: {field} is required")]
    MissingChildField { index: usize, field: &'static str },
}

/// What a parent fills in before a notice exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeDraft {
    pub date: String,
    pub time: String,
    pub pay_per_hour: String,
    pub area: String,
    pub notes: String,
    pub children: Vec<Child>,
}

impl NoticeDraft {
    /// Required: date, time, pay, area, and each child's age and gender.
    pub fn validate(&self) -> Result<(), DraftError> {
        let required = [
            ("date", &self.date),
            ("time", &self.time),
            ("pay per hour", &self.pay_per_hour),
            ("area", &self.area),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(DraftError::MissingField(name));
            }
        }
        for (index, child) in self.children.iter().enumerate() {
            if child.age.trim().is_empty() {
                return Err(DraftError::MissingChildField { index, field: "age" });
            }
            if child.gender.trim().is_empty() {
                return Err(DraftError::MissingChildField {
                    index,
                    field: "gender",
                });
            }
        }
        Ok(())
    }

    pub fn into_notice(self, id: String) -> Notice {
        Notice {
            id,
            date: self.date,
            time: self.time,
            pay_per_hour: self.pay_per_hour,
            area: self.area,
            notes: self.notes,
            children: self.children,
            applicant_count: 0,
        }
    }
}

static LAST_NOTICE_ID: AtomicU64 = AtomicU64::new(0);

/// Clock-based notice id: epoch milliseconds, strictly increasing within a process.
pub fn next_notice_id() -> String {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_NOTICE_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_NOTICE_ID.compare_exchange_weak(
            last,
            next,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next.to_string(),
            Err(actual) => last = actual,
        }
    }
}
