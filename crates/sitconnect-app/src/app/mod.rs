mod update;

#[cfg(test)]
mod tests;

use sitconnect_core::{
    AppData, Notice, NotificationService, PartialBlob, PersistedBlob, Role, StudentProfile,
};

use crate::screen::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Success,
    Error,
}

/// A transient status line for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

/// Top-level application state: the persisted data plus the current screen.
///
/// Every mutation of `data` marks the app dirty; the owner collects the
/// changes with [`App::take_snapshot`] and hands them to the auto-saver.
pub struct App {
    pub screen: Screen,
    data: AppData,
    messages: Vec<Message>,
    dirty: bool,
    notifications: NotificationService,
}

impl App {
    pub fn new(data: AppData, notifications: NotificationService) -> Self {
        Self {
            screen: Screen::Welcome,
            data,
            messages: Vec::new(),
            dirty: false,
            notifications,
        }
    }

    /// Start from a loaded blob. The stored role is kept but the session
    /// always opens on the welcome screen.
    pub fn from_blob(blob: PersistedBlob, notifications: NotificationService) -> Self {
        Self::new(blob.data, notifications)
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    pub fn role(&self) -> Option<Role> {
        self.data.user_role
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The full persisted state if anything changed since the last call.
    pub fn take_snapshot(&mut self) -> Option<PartialBlob> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(PartialBlob::from(self.data.clone()))
    }

    pub fn take_messages(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.messages.push(Message {
            level: MessageLevel::Error,
            text: text.into(),
        });
    }

    pub fn push_success(&mut self, text: impl Into<String>) {
        self.messages.push(Message {
            level: MessageLevel::Success,
            text: text.into(),
        });
    }

    /// The notice shown on the current screen.
    pub fn current_notice(&self) -> Option<&Notice> {
        self.data.notice(self.screen.notice_id()?)
    }

    /// Look up an applicant profile by id. Only the local student profile can
    /// be resolved; other ids have no profile data.
    pub fn applicant(&self, applicant_id: &str) -> Option<&StudentProfile> {
        (self.data.current_student_data.id == applicant_id)
            .then_some(&self.data.current_student_data)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
