//! Screens and the navigation table between them.
//!
//! Detail screens carry the ids they display, so "notice detail with no
//! notice selected" cannot be represented. [`route`] is the whole transition
//! table: anything it returns `None` for is not a legal move.

use std::fmt;
use std::str::FromStr;

use sitconnect_core::Role;

/// Which screen is currently displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    SignIn(Role),
    SignUp(Role),
    ParentHome,
    PostNotice,
    ParentNoticeDetail { notice_id: String },
    ParentProfile,
    StudentHome,
    StudentNoticeDetail { notice_id: String },
    /// An applicant's profile, opened from a parent's notice detail.
    StudentProfile {
        notice_id: String,
        applicant_id: String,
    },
    StudentProfileEdit,
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Welcome => "welcome",
            Screen::SignIn(_) => "signin",
            Screen::SignUp(_) => "signup",
            Screen::ParentHome => "parent-home",
            Screen::PostNotice => "post-notice",
            Screen::ParentNoticeDetail { .. } => "parent-notice-detail",
            Screen::ParentProfile => "parent-profile",
            Screen::StudentHome => "student-home",
            Screen::StudentNoticeDetail { .. } => "student-notice-detail",
            Screen::StudentProfile { .. } => "student-profile",
            Screen::StudentProfileEdit => "student-profile-edit",
        }
    }

    /// Whether the bottom tab bar is offered on this screen.
    pub fn has_bottom_nav(&self) -> bool {
        !matches!(
            self,
            Screen::Welcome
                | Screen::SignIn(_)
                | Screen::SignUp(_)
                | Screen::StudentProfile { .. }
                | Screen::ParentNoticeDetail { .. }
        )
    }

    /// The role whose flow this screen belongs to. Sign-in screens and the
    /// welcome screen belong to nobody.
    pub fn owner(&self) -> Option<Role> {
        match self {
            Screen::ParentHome
            | Screen::PostNotice
            | Screen::ParentNoticeDetail { .. }
            | Screen::ParentProfile
            | Screen::StudentProfile { .. } => Some(Role::Parent),
            Screen::StudentHome
            | Screen::StudentNoticeDetail { .. }
            | Screen::StudentProfileEdit => Some(Role::Student),
            Screen::Welcome | Screen::SignIn(_) | Screen::SignUp(_) => None,
        }
    }

    /// Landing screen after authenticating as `role`.
    pub fn home(role: Role) -> Screen {
        match role {
            Role::Parent => Screen::ParentHome,
            Role::Student => Screen::StudentHome,
        }
    }

    /// The notice this screen is about, if any.
    pub fn notice_id(&self) -> Option<&str> {
        match self {
            Screen::ParentNoticeDetail { notice_id }
            | Screen::StudentNoticeDetail { notice_id }
            | Screen::StudentProfile { notice_id, .. } => Some(notice_id),
            _ => None,
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bottom navigation tabs. Students have no `Post` tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Post,
    Profile,
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" | "notices" => Ok(Tab::Home),
            "post" => Ok(Tab::Post),
            "profile" => Ok(Tab::Profile),
            other => Err(format!("unknown tab '{}' (expected home, post or profile)", other)),
        }
    }
}

/// A navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nav {
    SelectRole(Role),
    ShowSignUp,
    ShowSignIn,
    AuthSuccess,
    Back,
    Tab(Tab),
    ViewNotice(String),
    ViewApplicant(String),
}

/// Next screen for `nav` from `screen`, or `None` if there is no such move.
///
/// Only shape is checked here; whether a notice or applicant id exists is the
/// controller's business.
pub fn route(screen: &Screen, role: Option<Role>, nav: Nav) -> Option<Screen> {
    use Screen::*;

    match (screen, nav) {
        (Welcome, Nav::SelectRole(r)) => Some(SignIn(r)),

        (SignIn(r), Nav::ShowSignUp) => Some(SignUp(*r)),
        (SignUp(r), Nav::ShowSignIn) => Some(SignIn(*r)),
        (SignIn(r) | SignUp(r), Nav::AuthSuccess) => Some(Screen::home(*r)),
        (SignIn(_) | SignUp(_), Nav::Back) => Some(Welcome),

        (PostNotice | ParentNoticeDetail { .. }, Nav::Back) => Some(ParentHome),
        (StudentNoticeDetail { .. }, Nav::Back) => Some(StudentHome),
        (StudentProfile { notice_id, .. }, Nav::Back) => Some(ParentNoticeDetail {
            notice_id: notice_id.clone(),
        }),

        (ParentHome, Nav::ViewNotice(notice_id)) => Some(ParentNoticeDetail { notice_id }),
        (StudentHome, Nav::ViewNotice(notice_id)) => Some(StudentNoticeDetail { notice_id }),
        (ParentNoticeDetail { notice_id }, Nav::ViewApplicant(applicant_id)) => {
            Some(StudentProfile {
                notice_id: notice_id.clone(),
                applicant_id,
            })
        }

        (current, Nav::Tab(tab)) if current.has_bottom_nav() => match (role?, tab) {
            (Role::Parent, Tab::Home) => Some(ParentHome),
            (Role::Parent, Tab::Post) => Some(PostNotice),
            (Role::Parent, Tab::Profile) => Some(ParentProfile),
            (Role::Student, Tab::Home) => Some(StudentHome),
            (Role::Student, Tab::Profile) => Some(StudentProfileEdit),
            (Role::Student, Tab::Post) => None,
        },

        _ => None,
    }
}
