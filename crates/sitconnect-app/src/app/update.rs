use sitconnect_core::{NoticeDraft, ParentProfile, PartialBlob, StudentProfile, next_notice_id};

use super::App;
use crate::action::Action;
use crate::screen::{Nav, Screen, route};

impl App {
    /// Process a user action. Returns true if it was accepted.
    ///
    /// Rejected actions leave data and screen untouched.
    pub fn update(&mut self, action: Action) -> bool {
        match action {
            Action::Nav(nav) => self.navigate(nav),
            Action::PostNotice(draft) => self.post_notice(draft),
            Action::Apply => self.apply(),
            Action::SelectApplicant(applicant_id) => self.select_applicant(&applicant_id),
            Action::SaveParentProfile(profile) => self.save_parent_profile(profile),
            Action::SaveStudentProfile(profile) => self.save_student_profile(profile),
            Action::SignOut => self.sign_out(),
            Action::ImportData(partial) => self.import_data(partial),
            Action::ClearAllData => self.clear_all_data(),
        }
    }

    fn navigate(&mut self, nav: Nav) -> bool {
        match &nav {
            Nav::ViewNotice(id) if self.data.notice(id).is_none() => {
                tracing::debug!(notice = %id, "no such notice");
                return false;
            }
            Nav::ViewApplicant(id) => {
                let listed = self
                    .screen
                    .notice_id()
                    .is_some_and(|n| self.data.applicants(n).contains(id));
                if !listed {
                    tracing::debug!(applicant = %id, "not an applicant of this notice");
                    return false;
                }
            }
            _ => {}
        }

        let role = match &nav {
            Nav::SelectRole(r) => Some(*r),
            _ => None,
        };
        let Some(next) = route(&self.screen, self.data.user_role, nav) else {
            tracing::debug!(screen = self.screen.name(), "navigation rejected");
            return false;
        };

        if let Some(role) = role {
            self.data.user_role = Some(role);
            self.mark_dirty();
        }
        tracing::debug!(from = self.screen.name(), to = next.name(), "screen change");
        self.screen = next;
        true
    }

    fn post_notice(&mut self, draft: NoticeDraft) -> bool {
        if self.screen != Screen::PostNotice {
            return false;
        }
        if let Err(e) = draft.validate() {
            self.push_error(format!("Please fill in all required fields: {}", e));
            return false;
        }

        let notice = draft.into_notice(next_notice_id());
        tracing::info!(notice = %notice.id, "notice posted");
        self.data.post_notice(notice);
        self.mark_dirty();
        self.screen = Screen::ParentHome;
        self.push_success("Notice posted successfully!");
        true
    }

    fn apply(&mut self) -> bool {
        let Screen::StudentNoticeDetail { notice_id } = &self.screen else {
            return false;
        };
        let notice_id = notice_id.clone();
        if self.data.notice(&notice_id).is_none() {
            self.push_error("This notice no longer exists");
            return false;
        }
        if self.data.has_applied(&notice_id) {
            self.push_error("You have already applied to this notice");
            return false;
        }

        let student_id = self.data.current_student_data.id.clone();
        self.data.record_application(&notice_id, &student_id);
        self.mark_dirty();
        tracing::info!(notice = %notice_id, student = %student_id, "application recorded");

        if let Some(notice) = self.data.notice(&notice_id) {
            self.notifications
                .notify_new_applicant(&self.data.current_student_data.name, &notice.details());
        }
        self.push_success("Application submitted!");
        true
    }

    fn select_applicant(&mut self, applicant_id: &str) -> bool {
        let Screen::ParentNoticeDetail { notice_id } = &self.screen else {
            return false;
        };
        let notice_id = notice_id.clone();
        if !self.data.applicants(&notice_id).iter().any(|a| a == applicant_id) {
            self.push_error(format!("{} has not applied to this notice", applicant_id));
            return false;
        }
        if self.data.is_selected(&notice_id, applicant_id) {
            self.push_error("Applicant already selected");
            return false;
        }

        self.data.select_applicant(&notice_id, applicant_id);
        self.mark_dirty();
        tracing::info!(notice = %notice_id, applicant = %applicant_id, "applicant selected");

        self.notifications.notify_selected(&self.data.parent_data.name);
        self.push_success("Applicant selected successfully!");
        true
    }

    fn save_parent_profile(&mut self, profile: ParentProfile) -> bool {
        if self.screen != Screen::ParentProfile {
            return false;
        }
        self.data.parent_data = profile;
        self.mark_dirty();
        self.push_success("Profile saved");
        true
    }

    fn save_student_profile(&mut self, profile: StudentProfile) -> bool {
        if self.screen != Screen::StudentProfileEdit {
            return false;
        }
        self.data.current_student_data = profile;
        self.mark_dirty();
        self.push_success("Profile saved");
        true
    }

    fn sign_out(&mut self) -> bool {
        if !matches!(self.screen, Screen::ParentProfile | Screen::StudentProfileEdit) {
            return false;
        }
        self.data.user_role = None;
        self.mark_dirty();
        self.screen = Screen::Welcome;
        self.push_success("Signed out successfully");
        true
    }

    fn import_data(&mut self, mut partial: PartialBlob) -> bool {
        // A backup without a role never signs the user out.
        if partial.user_role == Some(None) {
            partial.user_role = None;
        }
        self.data.adopt(partial);
        if let Some(owner) = self.screen.owner()
            && Some(owner) != self.data.user_role
        {
            let next = self.data.user_role.map_or(Screen::Welcome, Screen::home);
            tracing::debug!(
                from = self.screen.name(),
                to = next.name(),
                "role changed by import"
            );
            self.screen = next;
        }
        self.mark_dirty();
        self.push_success("Data imported successfully!");
        true
    }

    fn clear_all_data(&mut self) -> bool {
        self.data.clear_activity();
        self.mark_dirty();
        self.screen = Screen::Welcome;
        self.push_success("All data cleared");
        true
    }
}
