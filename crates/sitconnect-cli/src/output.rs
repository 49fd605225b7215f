use std::io::Write;

use owo_colors::OwoColorize;
use sitconnect_app::{App, Message, MessageLevel, Screen};
use sitconnect_core::{
    AppData, Notice, Notification, Notifier, ParentProfile, Permission, Role, StorageStats,
    StudentProfile,
};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn heading(text: &str, color: ColorMode) -> String {
    if color.enabled() {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn dim(text: &str, color: ColorMode) -> String {
    if color.enabled() {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

/// Print queued status messages, successes in green and errors in red.
pub fn print_messages(
    w: &mut dyn Write,
    messages: &[Message],
    color: ColorMode,
) -> std::io::Result<()> {
    for message in messages {
        match (message.level, color.enabled()) {
            (MessageLevel::Success, true) => writeln!(w, "{}", message.text.green())?,
            (MessageLevel::Error, true) => writeln!(w, "{}", message.text.red())?,
            _ => writeln!(w, "{}", message.text)?,
        }
    }
    Ok(())
}

/// One-line summary used in notice lists.
pub fn print_notice_line(
    w: &mut dyn Write,
    notice: &Notice,
    marker: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    let kids = match notice.children.len() {
        1 => "1 child".to_string(),
        n => format!("{} children", n),
    };
    writeln!(
        w,
        "  [{}] {} · {} · ${}/hr · {} · {} applicant(s) {}",
        notice.id,
        notice.details(),
        notice.area,
        notice.pay_per_hour,
        kids,
        notice.applicant_count,
        marker
    )?;
    if !notice.notes.is_empty() {
        writeln!(w, "      {}", dim(&notice.notes, color))?;
    }
    Ok(())
}

/// Full notice view with applicants and selections.
pub fn print_notice_detail(
    w: &mut dyn Write,
    data: &AppData,
    notice: &Notice,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "{}", heading(&format!("Notice {}", notice.id), color))?;
    writeln!(w, "  When:  {}", notice.details())?;
    writeln!(w, "  Where: {}", notice.area)?;
    writeln!(w, "  Pay:   ${}/hr", notice.pay_per_hour)?;
    if !notice.notes.is_empty() {
        writeln!(w, "  Notes: {}", notice.notes)?;
    }
    for (i, child) in notice.children.iter().enumerate() {
        let interests = if child.interests.is_empty() {
            String::new()
        } else {
            format!(" ({})", child.interests)
        };
        writeln!(
            w,
            "  Child {}: {}, age {}{}",
            i + 1,
            child.gender,
            child.age,
            interests
        )?;
    }

    let applicants = data.applicants(&notice.id);
    writeln!(w, "  Applicants: {}", notice.applicant_count)?;
    for id in applicants {
        let name = if *id == data.current_student_data.id {
            data.current_student_data.name.as_str()
        } else {
            id.as_str()
        };
        let selected = if data.is_selected(&notice.id, id) {
            if color.enabled() {
                " selected".green().to_string()
            } else {
                " selected".to_string()
            }
        } else {
            String::new()
        };
        writeln!(w, "    - {} [{}]{}", name, id, selected)?;
    }
    Ok(())
}

fn print_parent_profile(
    w: &mut dyn Write,
    profile: &ParentProfile,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "{}", heading("Parent profile", color))?;
    writeln!(w, "  Name:  {}", profile.name)?;
    writeln!(w, "  Email: {}", profile.email)?;
    writeln!(w, "  Phone: {}", profile.phone)?;
    writeln!(w, "  Area:  {}", profile.area)?;
    Ok(())
}

fn print_student_profile(
    w: &mut dyn Write,
    profile: &StudentProfile,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "{}", heading("Student profile", color))?;
    writeln!(w, "  Name:       {}", profile.name)?;
    writeln!(w, "  Class of:   {}", profile.grad_year)?;
    writeln!(w, "  Experience: {} year(s)", profile.experience)?;
    writeln!(w, "  Interests:  {}", profile.interests.join(", "))?;
    writeln!(w, "  Email:      {}", profile.email)?;
    writeln!(w, "  Phone:      {}", profile.phone)?;
    if !profile.bio.is_empty() {
        writeln!(w, "  Bio:        {}", profile.bio)?;
    }
    Ok(())
}

/// Plain-text rendition of the current screen.
pub fn print_screen(w: &mut dyn Write, app: &App, color: ColorMode) -> std::io::Result<()> {
    let data = app.data();
    writeln!(w)?;
    match &app.screen {
        Screen::Welcome => {
            writeln!(w, "{}", heading("Welcome to SitConnect", color))?;
            writeln!(w, "  Choose a role: `role parent` or `role student`")?;
        }
        Screen::SignIn(role) => {
            writeln!(w, "{}", heading(&format!("Sign in as {}", role), color))?;
            writeln!(w, "  `auth` to continue, `signup` to create an account")?;
        }
        Screen::SignUp(role) => {
            writeln!(w, "{}", heading(&format!("Sign up as {}", role), color))?;
            writeln!(w, "  `auth` to continue, `signin` if you have an account")?;
        }
        Screen::ParentHome => {
            writeln!(w, "{}", heading("Your notices", color))?;
            if data.notices.is_empty() {
                writeln!(w, "  {}", dim("No notices yet", color))?;
            }
            for notice in &data.notices {
                print_notice_line(w, notice, "", color)?;
            }
        }
        Screen::PostNotice => {
            writeln!(w, "{}", heading("Post a notice", color))?;
            writeln!(w, "  post DATE TIME PAY AREA [AGE:GENDER[:INTERESTS]]...")?;
        }
        Screen::ParentNoticeDetail { .. } | Screen::StudentNoticeDetail { .. } => {
            match app.current_notice() {
                Some(notice) => print_notice_detail(w, data, notice, color)?,
                None => writeln!(w, "  {}", dim("This notice no longer exists", color))?,
            }
            if let Screen::StudentNoticeDetail { notice_id } = &app.screen {
                if data.has_applied(notice_id) {
                    writeln!(w, "  You have applied")?;
                } else {
                    writeln!(w, "  `apply` to apply")?;
                }
            }
        }
        Screen::ParentProfile => print_parent_profile(w, &data.parent_data, color)?,
        Screen::StudentHome => {
            writeln!(w, "{}", heading("Available notices", color))?;
            if data.notices.is_empty() {
                writeln!(w, "  {}", dim("No notices yet", color))?;
            }
            for notice in &data.notices {
                let marker = if data.has_applied(&notice.id) {
                    "(applied)"
                } else {
                    ""
                };
                print_notice_line(w, notice, marker, color)?;
            }
        }
        Screen::StudentProfile {
            notice_id,
            applicant_id,
        } => {
            match app.applicant(applicant_id) {
                Some(profile) => print_student_profile(w, profile, color)?,
                None => writeln!(w, "{}", heading(&format!("Applicant {}", applicant_id), color))?,
            }
            if data.is_selected(notice_id, applicant_id) {
                writeln!(w, "  Selected for notice {}", notice_id)?;
            } else {
                writeln!(w, "  `back`, then `select {}` to choose this applicant", applicant_id)?;
            }
        }
        Screen::StudentProfileEdit => print_student_profile(w, &data.current_student_data, color)?,
    }

    if app.screen.has_bottom_nav()
        && let Some(role) = app.role()
    {
        let tabs = match role {
            Role::Parent => "tab home | tab post | tab profile",
            Role::Student => "tab home | tab profile",
        };
        writeln!(w, "{}", dim(&format!("── {} ──", tabs), color))?;
    }
    Ok(())
}

pub fn print_stats(w: &mut dyn Write, stats: &StorageStats, color: ColorMode) -> std::io::Result<()> {
    writeln!(w, "{}", heading("Storage", color))?;
    writeln!(w, "  Notices:    {}", stats.notice_count)?;
    writeln!(w, "  Applicants: {}", stats.applicant_count)?;
    writeln!(w, "  Used:       {}", stats.storage_used())?;
    match stats.last_sync {
        Some(at) => writeln!(w, "  Last sync:  {}", at.to_rfc3339())?,
        None => writeln!(w, "  Last sync:  {}", dim("never", color))?,
    }
    Ok(())
}

/// Prints alerts to stdout as they happen.
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier {
    pub color: ColorMode,
}

impl Notifier for TerminalNotifier {
    fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn display(&self, notification: &Notification) {
        let title = if self.color.enabled() {
            notification.title.yellow().bold().to_string()
        } else {
            notification.title.clone()
        };
        match &notification.body {
            Some(body) => println!("🔔 {} {}", title, body),
            None => println!("🔔 {}", title),
        }
    }
}
