use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sitconnect_app::{Action, Nav, Session, Tab};
use sitconnect_core::config_file::{self, Settings};
use sitconnect_core::{
    Child, LogNotifier, NoticeDraft, NotificationService, ParentProfile, Role, StorageService,
    StudentProfile, open_store,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod output;
mod shell;

use output::{ColorMode, TerminalNotifier};

/// SitConnect - local babysitting marketplace for parents and students
#[derive(Parser, Debug)]
#[command(name = "sitconnect", version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite data file
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Do not show notifications
    #[arg(long, global = true)]
    no_notify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show notice, applicant and storage statistics
    Stats,
    /// Check whether local storage is usable
    Check,
    /// Write a dated JSON backup
    Export {
        /// Directory for the backup file
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Restore data from a JSON backup
    Import {
        /// Backup file to read
        file: PathBuf,
    },
    /// Delete notices, applications and the current role (profiles are kept)
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// List all notices
    Notices,
    /// Show one notice with its applicants
    Show {
        /// Notice id
        id: String,
    },
    /// Post a new notice as a parent
    Post {
        #[arg(long)]
        date: String,
        #[arg(long)]
        time: String,
        /// Pay per hour
        #[arg(long)]
        pay: String,
        #[arg(long)]
        area: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// AGE:GENDER[:INTERESTS], repeatable
        #[arg(long = "child", value_parser = shell::parse_child)]
        children: Vec<Child>,
    },
    /// Apply to a notice as the local student
    Apply {
        /// Notice id
        id: String,
    },
    /// Select an applicant for a notice as the parent
    Select {
        /// Notice id
        id: String,
        /// Applicant id
        applicant: String,
    },
    /// Update a profile; omitted fields keep their current values
    Profile {
        #[command(subcommand)]
        which: ProfileCommand,
    },
    /// Interactive session with auto-save
    Shell,
    /// Inspect or write the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Parent {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        area: Option<String>,
    },
    Student {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        grad_year: Option<String>,
        #[arg(long)]
        experience: Option<String>,
        /// Repeatable; replaces the whole interest list
        #[arg(long = "interest")]
        interests: Vec<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the resolved settings as TOML
    Show,
    /// Save the resolved settings to the platform config file
    Init,
}

/// Resolve settings: CLI flags > env vars > config file > defaults.
fn resolve_settings(cli: &Cli) -> Settings {
    let mut settings = Settings::default();
    config_file::apply_to_settings(&config_file::load_config(), &mut settings);
    config_file::apply_env(&mut settings);
    if let Some(ref path) = cli.data {
        settings.data_path = Some(path.clone());
    }
    if cli.no_notify {
        settings.notifications = false;
    }
    settings
}

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
/// The returned guard must live until exit when logging to a file.
fn init_logging(
    filter: &str,
    log_file: Option<&Path>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let dir = dir.unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = resolve_settings(&cli);
    let _log_guard = init_logging(&settings.log_filter, cli.log_file.as_deref())?;

    let color = ColorMode(!cli.no_color);
    let notifications = if !settings.notifications {
        NotificationService::default()
    } else if std::io::stdout().is_terminal() {
        NotificationService::new(Arc::new(TerminalNotifier { color }))
    } else {
        // Keep piped output free of alerts.
        NotificationService::new(Arc::new(LogNotifier::default()))
    };

    if let Command::Config { action } = &cli.command {
        return config(action, &settings);
    }

    let storage = StorageService::new(open_store(settings.data_path.as_deref()));
    let mut out = std::io::stdout();

    match cli.command {
        Command::Stats => output::print_stats(&mut out, &storage.stats(), color)?,
        Command::Check => {
            if storage.is_available() {
                writeln!(out, "Storage is available")?;
            } else {
                anyhow::bail!("Storage is not available");
            }
        }
        Command::Export { out_dir } => {
            let path = storage.export_to_dir(&out_dir)?;
            writeln!(out, "Exported to {}", path.display())?;
        }
        Command::Notices => {
            let data = storage.load().data;
            if data.notices.is_empty() {
                writeln!(out, "No notices yet")?;
            }
            for notice in &data.notices {
                output::print_notice_line(&mut out, notice, "", color)?;
            }
        }
        Command::Show { id } => {
            let data = storage.load().data;
            let notice = data
                .notice(&id)
                .ok_or_else(|| anyhow::anyhow!("no notice with id {}", id))?;
            output::print_notice_detail(&mut out, &data, notice, color)?;
        }
        Command::Shell => {
            let session = Session::open(storage, notifications, settings.autosave_delay);
            shell::run(session, color).await?;
        }
        command => {
            let mut session = Session::open(storage, notifications, settings.autosave_delay);
            let outcome = run_session_command(&mut session, command).await;
            let mut app = session.close().await;
            output::print_messages(&mut out, &app.take_messages(), color)?;
            outcome?;
        }
    }
    Ok(())
}

/// Walk from the welcome screen to `role`'s home screen.
fn enter_as(session: &mut Session, role: Role) -> anyhow::Result<()> {
    for nav in [Nav::SelectRole(role), Nav::AuthSuccess] {
        if !session.dispatch(Action::Nav(nav)) {
            anyhow::bail!("could not sign in as {}", role);
        }
    }
    Ok(())
}

fn dispatch_all(session: &mut Session, actions: Vec<Action>) -> anyhow::Result<()> {
    for action in actions {
        let label = format!("{:?}", action);
        if !session.dispatch(action) {
            anyhow::bail!("rejected on {}: {}", session.app.screen, label);
        }
    }
    Ok(())
}

/// Commands that go through the controller and the auto-saver.
async fn run_session_command(session: &mut Session, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Import { file } => session.import_file(&file).await?,
        Command::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to clear data without --yes");
            }
            session.clear_all().await;
        }
        Command::Post {
            date,
            time,
            pay,
            area,
            notes,
            children,
        } => {
            enter_as(session, Role::Parent)?;
            let draft = NoticeDraft {
                date,
                time,
                pay_per_hour: pay,
                area,
                notes,
                children,
            };
            dispatch_all(
                session,
                vec![Nav::Tab(Tab::Post).into(), Action::PostNotice(draft)],
            )?;
        }
        Command::Apply { id } => {
            enter_as(session, Role::Student)?;
            dispatch_all(session, vec![Nav::ViewNotice(id).into(), Action::Apply])?;
        }
        Command::Select { id, applicant } => {
            enter_as(session, Role::Parent)?;
            dispatch_all(
                session,
                vec![
                    Nav::ViewNotice(id).into(),
                    Action::SelectApplicant(applicant),
                ],
            )?;
        }
        Command::Profile {
            which:
                ProfileCommand::Parent {
                    name,
                    email,
                    phone,
                    area,
                },
        } => {
            enter_as(session, Role::Parent)?;
            let current = &session.app.data().parent_data;
            let profile = ParentProfile {
                name: name.unwrap_or_else(|| current.name.clone()),
                email: email.unwrap_or_else(|| current.email.clone()),
                phone: phone.unwrap_or_else(|| current.phone.clone()),
                area: area.unwrap_or_else(|| current.area.clone()),
            };
            dispatch_all(
                session,
                vec![
                    Nav::Tab(Tab::Profile).into(),
                    Action::SaveParentProfile(profile),
                ],
            )?;
        }
        Command::Profile {
            which:
                ProfileCommand::Student {
                    name,
                    grad_year,
                    experience,
                    interests,
                    email,
                    phone,
                    bio,
                },
        } => {
            enter_as(session, Role::Student)?;
            let current = &session.app.data().current_student_data;
            let profile = StudentProfile {
                id: current.id.clone(),
                name: name.unwrap_or_else(|| current.name.clone()),
                grad_year: grad_year.unwrap_or_else(|| current.grad_year.clone()),
                experience: experience.unwrap_or_else(|| current.experience.clone()),
                interests: if interests.is_empty() {
                    current.interests.clone()
                } else {
                    interests
                },
                email: email.unwrap_or_else(|| current.email.clone()),
                phone: phone.unwrap_or_else(|| current.phone.clone()),
                bio: bio.unwrap_or_else(|| current.bio.clone()),
            };
            dispatch_all(
                session,
                vec![
                    Nav::Tab(Tab::Profile).into(),
                    Action::SaveStudentProfile(profile),
                ],
            )?;
        }
        other => anyhow::bail!("{:?} does not run in a session", other),
    }
    Ok(())
}

fn config(action: &ConfigCommand, settings: &Settings) -> anyhow::Result<()> {
    let file = config_file::from_settings(settings);
    match action {
        ConfigCommand::Show => {
            if let Some(path) = config_file::config_path() {
                println!("# {}", path.display());
            }
            print!("{}", toml::to_string_pretty(&file)?);
        }
        ConfigCommand::Init => {
            let path = config_file::save_config(&file).map_err(anyhow::Error::msg)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
