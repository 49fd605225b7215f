//! Interactive session: one command per line, auto-save running underneath.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use sitconnect_app::{Action, Nav, Screen, Session, Tab};
use sitconnect_core::{Child, NoticeDraft, Role};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output::{self, ColorMode};

const HELP: &str = "\
Navigation:
  role parent|student      choose a role (welcome screen)
  signin | signup          switch between sign-in and sign-up
  auth                     finish signing in
  back                     go back
  tab home|post|profile    bottom navigation
  view ID                  open a notice
  applicant ID             open an applicant's profile
Actions:
  post DATE TIME PAY AREA [AGE:GENDER[:INTERESTS]]... [-- NOTES]
  apply                    apply to the open notice
  select ID                select an applicant for the open notice
  set FIELD VALUE          edit a field on your profile screen
  sign-out                 sign out (profile screens)
Data:
  stats | export [DIR] | import FILE | clear
Other:
  show | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Act(Action),
    Set { field: String, value: String },
    Export(PathBuf),
    Import(PathBuf),
    Clear,
    Stats,
    Show,
    Help,
    Quit,
}

/// Parse `AGE:GENDER[:INTERESTS]`.
pub fn parse_child(s: &str) -> Result<Child, String> {
    let mut parts = s.splitn(3, ':');
    let age = parts.next().unwrap_or_default().trim();
    let gender = parts.next().unwrap_or_default().trim();
    let interests = parts.next().unwrap_or_default().trim();
    if age.is_empty() || gender.is_empty() {
        return Err(format!("expected AGE:GENDER[:INTERESTS], got '{}'", s));
    }
    Ok(Child {
        age: age.to_string(),
        gender: gender.to_string(),
        interests: interests.to_string(),
    })
}

/// Split on whitespace, keeping double-quoted runs together.
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        args.push(current);
    }
    args
}

fn parse_post(args: &[String]) -> Result<NoticeDraft, String> {
    let (fields, notes) = match args.iter().position(|a| a == "--") {
        Some(i) => (&args[..i], args[i + 1..].join(" ")),
        None => (args, String::new()),
    };
    let [date, time, pay, area, children @ ..] = fields else {
        return Err("usage: post DATE TIME PAY AREA [AGE:GENDER[:INTERESTS]]... [-- NOTES]".into());
    };
    Ok(NoticeDraft {
        date: date.clone(),
        time: time.clone(),
        pay_per_hour: pay.clone(),
        area: area.clone(),
        notes,
        children: children
            .iter()
            .map(|c| parse_child(c))
            .collect::<Result<_, _>>()?,
    })
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let args = split_args(line);
    let Some((head, rest)) = args.split_first() else {
        return Ok(None);
    };
    let one = |what: &str| -> Result<String, String> {
        match rest {
            [arg] => Ok(arg.clone()),
            _ => Err(format!("usage: {} {}", head, what)),
        }
    };

    let nav = |n: Nav| -> Result<Option<ShellCommand>, String> {
        Ok(Some(ShellCommand::Act(Action::Nav(n))))
    };
    match head.as_str() {
        "role" => {
            let role: Role = one("parent|student")?.parse()?;
            nav(Nav::SelectRole(role))
        }
        "signin" => nav(Nav::ShowSignIn),
        "signup" => nav(Nav::ShowSignUp),
        "auth" => nav(Nav::AuthSuccess),
        "back" => nav(Nav::Back),
        "tab" => {
            let tab: Tab = one("home|post|profile")?.parse()?;
            nav(Nav::Tab(tab))
        }
        "view" => nav(Nav::ViewNotice(one("ID")?)),
        "applicant" => nav(Nav::ViewApplicant(one("ID")?)),
        "post" => Ok(Some(ShellCommand::Act(Action::PostNotice(parse_post(rest)?)))),
        "apply" => Ok(Some(ShellCommand::Act(Action::Apply))),
        "select" => Ok(Some(ShellCommand::Act(Action::SelectApplicant(one("ID")?)))),
        "sign-out" | "signout" => Ok(Some(ShellCommand::Act(Action::SignOut))),
        "set" => match rest {
            [field, value @ ..] if !value.is_empty() => Ok(Some(ShellCommand::Set {
                field: field.to_ascii_lowercase(),
                value: value.join(" "),
            })),
            _ => Err("usage: set FIELD VALUE".into()),
        },
        "export" => Ok(Some(ShellCommand::Export(
            rest.first().map_or_else(|| PathBuf::from("."), PathBuf::from),
        ))),
        "import" => Ok(Some(ShellCommand::Import(PathBuf::from(one("FILE")?)))),
        "clear" => Ok(Some(ShellCommand::Clear)),
        "stats" => Ok(Some(ShellCommand::Stats)),
        "show" | "ls" => Ok(Some(ShellCommand::Show)),
        "help" | "?" => Ok(Some(ShellCommand::Help)),
        "quit" | "exit" | "q" => Ok(Some(ShellCommand::Quit)),
        other => Err(format!("unknown command '{}' (try `help`)", other)),
    }
}

/// Turn `set FIELD VALUE` into a profile save for the current screen.
fn profile_edit(session: &Session, field: &str, value: String) -> Result<Action, String> {
    let data = session.app.data();
    match session.app.screen {
        Screen::ParentProfile => {
            let mut profile = data.parent_data.clone();
            match field {
                "name" => profile.name = value,
                "email" => profile.email = value,
                "phone" => profile.phone = value,
                "area" => profile.area = value,
                _ => return Err("parent fields: name, email, phone, area".into()),
            }
            Ok(Action::SaveParentProfile(profile))
        }
        Screen::StudentProfileEdit => {
            let mut profile = data.current_student_data.clone();
            match field {
                "name" => profile.name = value,
                "grad-year" | "grad_year" => profile.grad_year = value,
                "experience" => profile.experience = value,
                "interests" => {
                    profile.interests = value
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                }
                "email" => profile.email = value,
                "phone" => profile.phone = value,
                "bio" => profile.bio = value,
                _ => {
                    return Err(
                        "student fields: name, grad-year, experience, interests, email, phone, bio"
                            .into(),
                    );
                }
            }
            Ok(Action::SaveStudentProfile(profile))
        }
        _ => Err("Profiles can only be edited from the profile tab".into()),
    }
}

async fn execute(
    session: &mut Session,
    command: ShellCommand,
    out: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    match command {
        ShellCommand::Act(action) => {
            let before = session.app.screen.clone();
            if session.dispatch(action) {
                if session.app.screen != before {
                    output::print_screen(out, &session.app, color)?;
                }
            } else {
                writeln!(out, "Not available on {}", session.app.screen)?;
            }
        }
        ShellCommand::Set { field, value } => match profile_edit(session, &field, value) {
            Ok(action) => {
                session.dispatch(action);
                output::print_screen(out, &session.app, color)?;
            }
            Err(e) => writeln!(out, "{}", e)?,
        },
        ShellCommand::Export(dir) => match session.export_to_dir(&dir).await {
            Ok(path) => writeln!(out, "Exported to {}", path.display())?,
            Err(e) => writeln!(out, "{}", e)?,
        },
        ShellCommand::Import(path) => {
            if let Err(e) = session.import_file(&path).await {
                writeln!(out, "{}", e)?;
            }
        }
        ShellCommand::Clear => {
            session.clear_all().await;
            output::print_screen(out, &session.app, color)?;
        }
        ShellCommand::Stats => {
            session.flush().await;
            output::print_stats(out, &session.stats(), color)?;
        }
        ShellCommand::Show => output::print_screen(out, &session.app, color)?,
        ShellCommand::Help => writeln!(out, "{}", HELP)?,
        ShellCommand::Quit => {}
    }
    Ok(())
}

fn prompt(out: &mut dyn Write, session: &Session) -> std::io::Result<()> {
    write!(out, "{}> ", session.app.screen)?;
    out.flush()
}

/// Read commands from stdin until `quit`, EOF or Ctrl+C, then flush and stop.
pub async fn run(mut session: Session, color: ColorMode) -> anyhow::Result<()> {
    let cancel = session.cancel_token();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut out = std::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(Duration::from_millis(500));

    output::print_messages(&mut out, &session.app.take_messages(), color)?;
    output::print_screen(&mut out, &session.app, color)?;
    prompt(&mut out, &session)?;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                writeln!(out)?;
                break;
            }
            _ = tick.tick() => {
                session.drain_events();
                let messages = session.app.take_messages();
                if !messages.is_empty() {
                    writeln!(out)?;
                    output::print_messages(&mut out, &messages, color)?;
                    prompt(&mut out, &session)?;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Ok(Some(ShellCommand::Quit)) => break,
                    Ok(Some(command)) => execute(&mut session, command, &mut out, color).await?,
                    Ok(None) => {}
                    Err(e) => writeln!(out, "{}", e)?,
                }
                output::print_messages(&mut out, &session.app.take_messages(), color)?;
                prompt(&mut out, &session)?;
            }
        }
    }

    let mut app = session.close().await;
    output::print_messages(&mut out, &app.take_messages(), color)?;
    tracing::debug!("shell closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn act(line: &str) -> Action {
        match parse_line(line) {
            Ok(Some(ShellCommand::Act(action))) => action,
            other => panic!("expected an action for {:?}, got {:?}", line, other),
        }
    }

    #[test]
    fn navigation_commands() {
        assert_eq!(act("role parent"), Action::Nav(Nav::SelectRole(Role::Parent)));
        assert_eq!(act("  tab  profile "), Action::Nav(Nav::Tab(Tab::Profile)));
        assert_eq!(act("view 1700000000000"), Action::Nav(Nav::ViewNotice("1700000000000".into())));
        assert_eq!(act("back"), Action::Nav(Nav::Back));
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse_line("   "), Ok(None));
        assert!(parse_line("dance").unwrap_err().contains("unknown command"));
        assert!(parse_line("role").is_err());
        assert!(parse_line("role nanny").is_err());
    }

    #[test]
    fn post_with_children_and_notes() {
        let Action::PostNotice(draft) =
            act(r#"post 2025-11-15 18:00 25 "North Side" 5:girl:Art 8:boy -- Pizza dinner"#)
        else {
            panic!("expected a post");
        };
        assert_eq!(draft.area, "North Side");
        assert_eq!(draft.children.len(), 2);
        assert_eq!(draft.children[0].interests, "Art");
        assert_eq!(draft.children[1].interests, "");
        assert_eq!(draft.notes, "Pizza dinner");
    }

    #[test]
    fn post_needs_four_fields() {
        assert!(parse_line("post 2025-11-15 18:00 25").is_err());
        assert!(parse_line("post 2025-11-15 18:00 25 Downtown 5").is_err());
    }

    #[test]
    fn set_joins_value() {
        assert_eq!(
            parse_line("set Name Sarah Williams"),
            Ok(Some(ShellCommand::Set {
                field: "name".into(),
                value: "Sarah Williams".into()
            }))
        );
        assert!(parse_line("set name").is_err());
    }

    #[test]
    fn export_defaults_to_cwd() {
        assert_eq!(
            parse_line("export"),
            Ok(Some(ShellCommand::Export(PathBuf::from("."))))
        );
    }

    #[test]
    fn child_spec() {
        let child = parse_child("5:girl:Art, Reading").unwrap();
        assert_eq!(child.age, "5");
        assert_eq!(child.gender, "girl");
        assert_eq!(child.interests, "Art, Reading");
        assert!(parse_child(":girl").is_err());
        assert!(parse_child("5").is_err());
    }
}
