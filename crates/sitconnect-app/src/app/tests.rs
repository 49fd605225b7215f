use std::sync::{Arc, Mutex};

use sitconnect_core::model::CURRENT_STUDENT_ID;
use sitconnect_core::{Child, NoticeDraft, Notification, Notifier, ParentProfile, Permission};

use super::*;
use crate::action::Action;
use crate::screen::{Nav, Tab};

#[derive(Default)]
struct Recording {
    shown: Mutex<Vec<Notification>>,
}

impl Notifier for Recording {
    fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn display(&self, notification: &Notification) {
        self.shown.lock().unwrap().push(notification.clone());
    }
}

fn notice(id: &str, applicant_count: u32) -> Notice {
    Notice {
        id: id.to_string(),
        date: "2025-11-15".into(),
        time: "18:00".into(),
        pay_per_hour: "25".into(),
        area: "Downtown".into(),
        notes: String::new(),
        children: vec![],
        applicant_count,
    }
}

/// App seeded with notice "1" that already has applicants "1" and "2".
fn seeded_app() -> (App, Arc<Recording>) {
    let mut data = AppData::default();
    data.notices.push(notice("1", 2));
    data.applications
        .insert("1".into(), vec!["1".into(), "2".into()]);
    data.parent_data = ParentProfile {
        name: "Sarah Williams".into(),
        ..ParentProfile::default()
    };
    data.current_student_data.name = "Alex Chen".into();

    let recorder = Arc::new(Recording::default());
    let app = App::new(data, NotificationService::new(recorder.clone()));
    (app, recorder)
}

fn nav(app: &mut App, nav: Nav) -> bool {
    app.update(Action::Nav(nav))
}

fn sign_in(app: &mut App, role: Role) {
    assert!(nav(app, Nav::SelectRole(role)));
    assert!(nav(app, Nav::AuthSuccess));
}

fn draft() -> NoticeDraft {
    NoticeDraft {
        date: "2025-12-01".into(),
        time: "19:30".into(),
        pay_per_hour: "22".into(),
        area: "Uptown".into(),
        notes: "Bedtime at 9".into(),
        children: vec![Child {
            age: "4".into(),
            gender: "boy".into(),
            interests: String::new(),
        }],
    }
}

// ── Navigation ───────────────────────────────────────────────────

#[test]
fn starts_on_welcome_and_clean() {
    let (mut app, _) = seeded_app();
    assert_eq!(app.screen, Screen::Welcome);
    assert!(!app.is_dirty());
    assert!(app.take_snapshot().is_none());
}

#[test]
fn select_role_sets_role_and_opens_signin() {
    let (mut app, _) = seeded_app();
    assert!(nav(&mut app, Nav::SelectRole(Role::Parent)));
    assert_eq!(app.screen, Screen::SignIn(Role::Parent));
    assert_eq!(app.role(), Some(Role::Parent));
    assert!(app.is_dirty());

    assert!(nav(&mut app, Nav::AuthSuccess));
    assert_eq!(app.screen, Screen::ParentHome);
}

#[test]
fn back_from_signin_keeps_role() {
    let (mut app, _) = seeded_app();
    nav(&mut app, Nav::SelectRole(Role::Student));
    nav(&mut app, Nav::ShowSignUp);
    assert_eq!(app.screen, Screen::SignUp(Role::Student));
    assert!(nav(&mut app, Nav::Back));
    assert_eq!(app.screen, Screen::Welcome);
    assert_eq!(app.role(), Some(Role::Student));
}

#[test]
fn navigation_alone_does_not_dirty() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Parent);
    app.take_snapshot();

    assert!(nav(&mut app, Nav::Tab(Tab::Profile)));
    assert!(nav(&mut app, Nav::Tab(Tab::Post)));
    assert!(nav(&mut app, Nav::Back));
    assert_eq!(app.screen, Screen::ParentHome);
    assert!(!app.is_dirty());
}

#[test]
fn view_unknown_notice_is_rejected() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Student);
    assert!(!nav(&mut app, Nav::ViewNotice("404".into())));
    assert_eq!(app.screen, Screen::StudentHome);
}

#[test]
fn view_applicant_requires_listed_applicant() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Parent);
    nav(&mut app, Nav::ViewNotice("1".into()));

    assert!(!nav(&mut app, Nav::ViewApplicant("9".into())));
    assert!(nav(&mut app, Nav::ViewApplicant("2".into())));
    assert_eq!(
        app.screen,
        Screen::StudentProfile {
            notice_id: "1".into(),
            applicant_id: "2".into()
        }
    );

    assert!(nav(&mut app, Nav::Back));
    assert_eq!(
        app.screen,
        Screen::ParentNoticeDetail {
            notice_id: "1".into()
        }
    );
    assert_eq!(app.current_notice().map(|n| n.id.as_str()), Some("1"));
}

// ── Applying ─────────────────────────────────────────────────────

#[test]
fn apply_updates_indices_and_count() {
    let (mut app, recorder) = seeded_app();
    sign_in(&mut app, Role::Student);
    nav(&mut app, Nav::ViewNotice("1".into()));

    assert!(app.update(Action::Apply));

    let data = app.data();
    assert_eq!(data.applicants("1"), ["1", "2", CURRENT_STUDENT_ID]);
    assert_eq!(data.applied_notices, vec!["1".to_string()]);
    assert_eq!(data.notice("1").unwrap().applicant_count, 3);

    let shown = recorder.shown.lock().unwrap();
    assert_eq!(shown.len(), 1);
    assert_eq!(
        shown[0].body.as_deref(),
        Some("Alex Chen applied for your job: 2025-11-15 at 18:00")
    );
    drop(shown);

    let messages = app.take_messages();
    assert_eq!(messages.last().unwrap().text, "Application submitted!");
    assert_eq!(messages.last().unwrap().level, MessageLevel::Success);
}

#[test]
fn second_apply_is_rejected() {
    let (mut app, recorder) = seeded_app();
    sign_in(&mut app, Role::Student);
    nav(&mut app, Nav::ViewNotice("1".into()));
    app.update(Action::Apply);
    app.take_snapshot();

    assert!(!app.update(Action::Apply));
    assert_eq!(app.data().notice("1").unwrap().applicant_count, 3);
    assert_eq!(app.data().applicants("1").len(), 3);
    assert!(!app.is_dirty());
    assert_eq!(recorder.shown.lock().unwrap().len(), 1);
}

#[test]
fn apply_to_notice_gone_after_import_is_rejected() {
    let (mut app, recorder) = seeded_app();
    sign_in(&mut app, Role::Student);
    nav(&mut app, Nav::ViewNotice("1".into()));
    app.update(Action::ImportData(PartialBlob {
        notices: Some(vec![notice("9", 0)]),
        ..PartialBlob::default()
    }));
    app.take_messages();

    assert!(!app.update(Action::Apply));

    assert!(!app.data().has_applied("1"));
    assert_eq!(app.data().applicants("1").len(), 2);
    assert!(recorder.shown.lock().unwrap().is_empty());
    let messages = app.take_messages();
    assert_eq!(messages[0].level, MessageLevel::Error);
    assert_eq!(messages[0].text, "This notice no longer exists");
}

#[test]
fn apply_outside_detail_is_ignored() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Student);
    app.take_snapshot();
    assert!(!app.update(Action::Apply));
    assert!(!app.is_dirty());
}

// ── Selecting ────────────────────────────────────────────────────

#[test]
fn select_applicant_records_and_notifies() {
    let (mut app, recorder) = seeded_app();
    sign_in(&mut app, Role::Parent);
    nav(&mut app, Nav::ViewNotice("1".into()));

    assert!(app.update(Action::SelectApplicant("2".into())));
    assert_eq!(app.data().selected("1"), ["2"]);
    assert_eq!(
        recorder.shown.lock().unwrap()[0].body.as_deref(),
        Some("Sarah Williams selected you as their babysitter!")
    );

    assert!(!app.update(Action::SelectApplicant("2".into())));
    assert_eq!(app.data().selected("1"), ["2"]);
}

#[test]
fn select_only_from_notice_detail() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Parent);
    nav(&mut app, Nav::ViewNotice("1".into()));
    nav(&mut app, Nav::ViewApplicant("1".into()));

    assert!(!app.update(Action::SelectApplicant("1".into())));
    nav(&mut app, Nav::Back);
    assert!(app.update(Action::SelectApplicant("1".into())));
    assert!(app.data().is_selected("1", "1"));
}

#[test]
fn select_non_applicant_is_rejected() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Parent);
    nav(&mut app, Nav::ViewNotice("1".into()));
    assert!(!app.update(Action::SelectApplicant("7".into())));
    assert!(app.data().selected("1").is_empty());
    assert_eq!(app.take_messages().last().unwrap().level, MessageLevel::Error);
}

// ── Posting ──────────────────────────────────────────────────────

#[test]
fn post_notice_prepends_and_returns_home() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Parent);
    nav(&mut app, Nav::Tab(Tab::Post));

    assert!(app.update(Action::PostNotice(draft())));

    assert_eq!(app.screen, Screen::ParentHome);
    let first = &app.data().notices[0];
    assert_eq!(first.area, "Uptown");
    assert_eq!(first.applicant_count, 0);
    assert!(!first.id.is_empty());
    assert_eq!(app.data().notices.len(), 2);
    assert_eq!(
        app.take_messages().last().unwrap().text,
        "Notice posted successfully!"
    );
}

#[test]
fn incomplete_draft_is_rejected() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Parent);
    nav(&mut app, Nav::Tab(Tab::Post));
    app.take_snapshot();

    let mut incomplete = draft();
    incomplete.children[0].gender.clear();
    assert!(!app.update(Action::PostNotice(incomplete)));

    assert_eq!(app.screen, Screen::PostNotice);
    assert_eq!(app.data().notices.len(), 1);
    assert!(!app.is_dirty());
    let message = app.take_messages().pop().unwrap();
    assert_eq!(message.level, MessageLevel::Error);
    assert!(message.text.contains("gender"));
}

// ── Profiles and sign out ────────────────────────────────────────

#[test]
fn profile_save_overwrites() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Student);
    nav(&mut app, Nav::Tab(Tab::Profile));

    let profile = StudentProfile {
        name: "Jamie".into(),
        interests: vec!["Chess".into()],
        ..StudentProfile::default()
    };
    assert!(app.update(Action::SaveStudentProfile(profile.clone())));
    assert_eq!(app.data().current_student_data, profile);

    assert!(!app.update(Action::SaveParentProfile(ParentProfile::default())));
}

#[test]
fn sign_out_clears_role() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Parent);
    assert!(!app.update(Action::SignOut));

    nav(&mut app, Nav::Tab(Tab::Profile));
    assert!(app.update(Action::SignOut));
    assert_eq!(app.screen, Screen::Welcome);
    assert_eq!(app.role(), None);
    assert_eq!(
        app.take_messages().last().unwrap().text,
        "Signed out successfully"
    );
}

// ── Data management ──────────────────────────────────────────────

#[test]
fn import_adopts_only_present_fields() {
    let (mut app, _) = seeded_app();
    let partial = PartialBlob {
        notices: Some(vec![notice("9", 0)]),
        ..PartialBlob::default()
    };
    assert!(app.update(Action::ImportData(partial)));
    assert_eq!(app.data().notices, vec![notice("9", 0)]);
    assert_eq!(app.data().parent_data.name, "Sarah Williams");
    assert_eq!(app.data().applicants("1").len(), 2);
}

#[test]
fn import_with_null_role_keeps_user_signed_in() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Parent);

    assert!(app.update(Action::ImportData(PartialBlob {
        user_role: Some(None),
        ..PartialBlob::default()
    })));

    assert_eq!(app.role(), Some(Role::Parent));
    assert_eq!(app.screen, Screen::ParentHome);
    assert!(nav(&mut app, Nav::Tab(Tab::Profile)));
    assert!(app.update(Action::SignOut));
    assert_eq!(app.screen, Screen::Welcome);
}

#[test]
fn import_with_other_role_moves_to_its_home() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Parent);
    nav(&mut app, Nav::Tab(Tab::Profile));

    app.update(Action::ImportData(PartialBlob {
        user_role: Some(Some(Role::Student)),
        ..PartialBlob::default()
    }));

    assert_eq!(app.role(), Some(Role::Student));
    assert_eq!(app.screen, Screen::StudentHome);
    assert!(nav(&mut app, Nav::Tab(Tab::Profile)));
    assert_eq!(app.screen, Screen::StudentProfileEdit);
}

#[test]
fn import_with_same_role_keeps_screen() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Student);
    nav(&mut app, Nav::ViewNotice("1".into()));

    app.update(Action::ImportData(PartialBlob {
        user_role: Some(Some(Role::Student)),
        ..PartialBlob::default()
    }));

    assert_eq!(
        app.screen,
        Screen::StudentNoticeDetail {
            notice_id: "1".into()
        }
    );
}

#[test]
fn clear_all_keeps_profiles() {
    let (mut app, _) = seeded_app();
    sign_in(&mut app, Role::Parent);

    assert!(app.update(Action::ClearAllData));

    assert_eq!(app.screen, Screen::Welcome);
    assert!(app.data().notices.is_empty());
    assert!(app.data().applications.is_empty());
    assert_eq!(app.role(), None);
    assert_eq!(app.data().parent_data.name, "Sarah Williams");
}

#[test]
fn snapshot_carries_full_state_once() {
    let (mut app, _) = seeded_app();
    nav(&mut app, Nav::SelectRole(Role::Student));

    let snapshot = app.take_snapshot().expect("dirty after role change");
    assert_eq!(snapshot.user_role, Some(Some(Role::Student)));
    assert_eq!(snapshot.notices.as_ref().map(Vec::len), Some(1));
    assert!(snapshot.parent_data.is_some());

    assert!(app.take_snapshot().is_none());
}

#[test]
fn applicant_lookup_resolves_local_student_only() {
    let (app, _) = seeded_app();
    assert_eq!(
        app.applicant(CURRENT_STUDENT_ID).map(|s| s.name.as_str()),
        Some("Alex Chen")
    );
    assert!(app.applicant("2").is_none());
}

#[test]
fn from_blob_opens_on_welcome_with_stored_role() {
    let mut blob = PersistedBlob::default();
    blob.data.user_role = Some(Role::Parent);
    let app = App::from_blob(blob, NotificationService::default());
    assert_eq!(app.screen, Screen::Welcome);
    assert_eq!(app.role(), Some(Role::Parent));
}
