//! Best-effort local alerts.
//!
//! Nothing in the app depends on a notification being shown. The service asks
//! for permission before every alert and silently does nothing without it.

use std::fmt;
use std::sync::Arc;

/// Answer to a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// The user has not decided yet.
    Default,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Permission::Granted => "granted",
            Permission::Denied => "denied",
            Permission::Default => "default",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: Option<String>,
    /// Alerts sharing a tag replace each other.
    pub tag: Option<String>,
}

/// A platform capable (or not) of showing local alerts.
pub trait Notifier: Send + Sync {
    fn request_permission(&self) -> Permission;
    fn display(&self, notification: &Notification);
}

/// No notification capability: permission is always denied.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsupported;

impl Notifier for Unsupported {
    fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    fn display(&self, _notification: &Notification) {}
}

/// Emits alerts as `tracing` events.
#[derive(Debug, Clone, Copy)]
pub struct LogNotifier {
    pub permission: Permission,
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self {
            permission: Permission::Granted,
        }
    }
}

impl Notifier for LogNotifier {
    fn request_permission(&self) -> Permission {
        self.permission
    }

    fn display(&self, notification: &Notification) {
        tracing::info!(
            title = %notification.title,
            body = notification.body.as_deref().unwrap_or(""),
            tag = notification.tag.as_deref().unwrap_or(""),
            "notification"
        );
    }
}

#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new(Arc::new(Unsupported))
    }
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn request_permission(&self) -> Permission {
        self.notifier.request_permission()
    }

    /// Show `notification` if permission is granted. Returns whether it was shown.
    pub fn show(&self, notification: Notification) -> bool {
        let permission = self.notifier.request_permission();
        if permission != Permission::Granted {
            tracing::debug!(%permission, title = %notification.title, "notification suppressed");
            return false;
        }
        self.notifier.display(&notification);
        true
    }

    pub fn notify_new_applicant(&self, applicant_name: &str, notice_details: &str) -> bool {
        self.show(Notification {
            title: "New Applicant! 🎉".to_string(),
            body: Some(format!(
                "{} applied for your job: {}",
                applicant_name, notice_details
            )),
            tag: Some("new-applicant".to_string()),
        })
    }

    pub fn notify_selected(&self, parent_name: &str) -> bool {
        self.show(Notification {
            title: "You were selected! ✨".to_string(),
            body: Some(format!("{} selected you as their babysitter!", parent_name)),
            tag: Some("selected".to_string()),
        })
    }
}
