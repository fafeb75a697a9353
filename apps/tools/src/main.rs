use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use shared::{domain::EventId, lifecycle::AttendeeStats};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/checkin.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    ListEvents,
    /// Load an .xlsx roster straight into the database.
    SeedRoster {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    ExportEvent {
        event_id: i64,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    DeleteEvent {
        event_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::ListEvents => {
            for event in storage.list_events().await? {
                let stats = AttendeeStats::from_attendees(&event.attendees);
                println!(
                    "event_id={} name={:?} attendees={} checked_in={} no_show={}",
                    event.id, event.name, stats.total, stats.checked_in, stats.no_show
                );
            }
        }
        Command::SeedRoster { path, name } => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let rows = roster::parse(&bytes)?;
            if rows.is_empty() {
                bail!("no attendees found in {}", path.display());
            }
            let name = name.unwrap_or_else(|| {
                let filename = path
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default();
                roster::event_name_from_filename(&filename).to_string()
            });
            let drafts: Vec<_> = rows.into_iter().map(|row| row.into_draft()).collect();
            let event = storage.create_event(&name, Utc::now(), &drafts).await?;
            println!(
                "created event_id={} attendees={}",
                event.id,
                event.attendees.len()
            );
        }
        Command::ExportEvent { event_id, out_dir } => {
            let Some(event) = storage.get_event(EventId(event_id)).await? else {
                bail!("event {event_id} not found");
            };
            let exported = roster::serialize(&event, Utc::now().date_naive())?;
            let path = out_dir.join(&exported.filename);
            std::fs::write(&path, &exported.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        Command::DeleteEvent { event_id } => {
            if storage.delete_event(EventId(event_id)).await? {
                println!("deleted event_id={event_id}");
            } else {
                bail!("event {event_id} not found");
            }
        }
    }

    Ok(())
}
