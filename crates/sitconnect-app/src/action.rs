use sitconnect_core::{NoticeDraft, ParentProfile, PartialBlob, StudentProfile};

use crate::screen::Nav;

/// Everything the user can ask the controller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Nav(Nav),

    /// Validate and publish a notice from the post-notice screen.
    PostNotice(NoticeDraft),
    /// Apply to the notice open on the student detail screen.
    Apply,
    /// Pick an applicant for the notice open on the parent detail screen.
    SelectApplicant(String),
    SaveParentProfile(ParentProfile),
    SaveStudentProfile(StudentProfile),
    SignOut,

    // Data management
    ImportData(PartialBlob),
    ClearAllData,
}

impl From<Nav> for Action {
    fn from(nav: Nav) -> Self {
        Action::Nav(nav)
    }
}
