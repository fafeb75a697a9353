use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use client_core::{views, Dashboard, HttpEventStore};
use shared::{
    domain::{AttendeeId, AttendeeStatus, EventId},
    protocol::TransitionRequest,
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "CHECKIN_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List events with attendance totals.
    List {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Show the check-in table of one event.
    Show {
        event_id: i64,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Create an event from an .xlsx roster.
    Import { path: PathBuf },
    /// Write an event's roster to an .xlsx file.
    Export {
        event_id: i64,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Mark an attendee as checked in.
    CheckIn { event_id: i64, attendee_id: i64 },
    /// Mark an attendee as a no-show.
    NoShow { event_id: i64, attendee_id: i64 },
    /// Put an attendee back to registered.
    Register { event_id: i64, attendee_id: i64 },
    /// Delete an event and its attendees.
    Delete {
        event_id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

fn prompt_on_stdin(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

async fn set_status(
    dashboard: &mut Dashboard<HttpEventStore>,
    event_id: i64,
    attendee_id: i64,
    status: AttendeeStatus,
) -> Result<()> {
    dashboard.select_event(EventId(event_id))?;
    let attendee = dashboard
        .set_status(TransitionRequest {
            attendee_id: AttendeeId(attendee_id),
            status,
        })
        .await?;
    println!(
        "{} {} is now {}",
        attendee.first_name, attendee.last_name, attendee.status
    );
    Ok(())
}

async fn run(dashboard: &mut Dashboard<HttpEventStore>, command: Command) -> Result<()> {
    dashboard.refresh().await?;

    match command {
        Command::List { search } => {
            print!("{}", views::render_event_list(&dashboard.state().events, &search));
        }
        Command::Show { event_id, search } => {
            dashboard.select_event(EventId(event_id))?;
            let state = dashboard.state();
            if let Some(event) = state.current_event() {
                print!(
                    "{}",
                    views::render_check_in_table(event, state.pending.as_ref(), &search)
                );
            }
        }
        Command::Import { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let event = dashboard.import_roster(&filename, &bytes).await?;
            info!(event_id = %event.id, "roster imported");
            print!("{}", views::render_check_in_table(&event, None, ""));
        }
        Command::Export { event_id, out_dir } => {
            let exported = dashboard.export(EventId(event_id), Utc::now().date_naive())?;
            let path = out_dir.join(&exported.filename);
            std::fs::write(&path, &exported.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        Command::CheckIn {
            event_id,
            attendee_id,
        } => set_status(dashboard, event_id, attendee_id, AttendeeStatus::CheckedIn).await?,
        Command::NoShow {
            event_id,
            attendee_id,
        } => set_status(dashboard, event_id, attendee_id, AttendeeStatus::NoShow).await?,
        Command::Register {
            event_id,
            attendee_id,
        } => set_status(dashboard, event_id, attendee_id, AttendeeStatus::Registered).await?,
        Command::Delete { event_id, yes } => {
            let deleted = if yes {
                dashboard.delete_event(EventId(event_id), &|_: &str| true).await?
            } else {
                dashboard
                    .delete_event(EventId(event_id), &prompt_on_stdin)
                    .await?
            };
            if deleted {
                println!("deleted event {event_id}");
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkin=info,client_core=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut dashboard = Dashboard::new(HttpEventStore::new(&args.server_url)?);
    match run(&mut dashboard, args.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        // dashboard failures already carry a user-facing banner
        Err(err) => match views::render_banner(dashboard.state()) {
            Some(banner) => {
                debug!(error = %format!("{err:#}"), "command failed");
                eprintln!("{banner}");
                Ok(ExitCode::FAILURE)
            }
            None => Err(err),
        },
    }
}
