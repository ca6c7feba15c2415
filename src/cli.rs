use crate::backup;
use crate::board;
use crate::config::Config;
use crate::markdown;
use crate::models::default_board;
use crate::storage::{self, FileMirror, RemoteSettings};
use crate::sync::{GistClient, SyncEngine, SyncError};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weekplan", version)]
#[command(about = "Weekly planner with markdown notes and GitHub Gist sync")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the sync status and what is stored locally
    Status,
    /// Replace the local board with the Gist copy
    Fetch,
    /// Upload the local board to the Gist
    Save {
        /// Also write a dated copy into the export directory
        #[arg(long)]
        download: bool,
    },
    /// Write a dated backup of the local board
    Export {
        /// Target directory (defaults to the configured export directory)
        dir: Option<PathBuf>,
    },
    /// Replace the local board with a backup file
    Import { file: PathBuf },
    /// Remove the stored board
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Print storage usage
    Info,
    /// Gist settings
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },
    /// Print a week's notes rendered as HTML
    Notes {
        /// Month id, e.g. "july-2025"
        month: String,
        /// Week number or week id, e.g. "2" or "july-2025-week-2"
        week: String,
    },
}

#[derive(Subcommand)]
pub enum RemoteAction {
    Set {
        #[arg(long)]
        id: String,
        /// Personal access token with gist scope
        #[arg(long)]
        token: Option<String>,
    },
    Show,
}

fn open_engine(config: &Config) -> SyncEngine<FileMirror> {
    let mirror = FileMirror::new(&config.data.data_dir);
    SyncEngine::load(mirror, default_board(config.board.months))
}

pub fn run(command: Commands, config: &Config) -> Result<(), SyncError> {
    match command {
        Commands::Status => status(config),
        Commands::Fetch => fetch(config),
        Commands::Save { download } => save(config, download),
        Commands::Export { dir } => {
            let engine = open_engine(config);
            let dir = dir.unwrap_or_else(|| config.data.export_dir.clone());
            let path = backup::export_backup(engine.mirror(), &dir, Local::now().date_naive())?;
            println!("Exported to {}", path.display());
            Ok(())
        }
        Commands::Import { file } => {
            let mirror = FileMirror::new(&config.data.data_dir);
            let board = backup::import_backup(&mirror, &file)?;
            println!(
                "Imported {} month(s), {} task(s).",
                board.len(),
                board::task_count(&board)
            );
            Ok(())
        }
        Commands::Clear { yes } => {
            if !yes {
                return Err(SyncError::Config(
                    "refusing to clear data without --yes".to_string(),
                ));
            }
            let mirror = FileMirror::new(&config.data.data_dir);
            backup::clear_data(&mirror)?;
            println!("All local data cleared.");
            Ok(())
        }
        Commands::Info => {
            let mirror = FileMirror::new(&config.data.data_dir);
            let info = storage::storage_info(&mirror);
            println!("Data dir: {}", config.data.data_dir.display());
            println!("Stored:   {} KB", info.size_kb);
            println!("Tasks:    {}", info.items);
            Ok(())
        }
        Commands::Remote { action } => remote(config, action),
        Commands::Notes { month, week } => {
            let engine = open_engine(config);
            let week_id = if week.chars().all(|c| c.is_ascii_digit()) {
                format!("{month}-week-{week}")
            } else {
                week
            };
            if board::find_week(engine.data(), &month, &week_id).is_none() {
                return Err(SyncError::Config(format!("no week `{week_id}` in `{month}`")));
            }
            println!(
                "{}",
                markdown::render_html(board::weekly_notes(engine.data(), &month, &week_id))
            );
            Ok(())
        }
    }
}

fn status(config: &Config) -> Result<(), SyncError> {
    let engine = open_engine(config);
    let settings = RemoteSettings::load(engine.mirror());
    println!("Gist:   {}", settings.remote_id().unwrap_or("(not set)"));
    println!("Token:  {}", settings.masked_token());
    println!("Status: {}", engine.status(&settings).label());
    println!(
        "Board:  {} month(s), {} task(s)",
        engine.data().len(),
        board::task_count(engine.data())
    );
    Ok(())
}

fn fetch(config: &Config) -> Result<(), SyncError> {
    let mut engine = open_engine(config);
    let settings = RemoteSettings::load(engine.mirror());
    let client = GistClient::new(&config.sync)?;
    engine.fetch(&settings, &client)?;
    println!(
        "Fetched {} month(s), {} task(s).",
        engine.data().len(),
        board::task_count(engine.data())
    );
    Ok(())
}

fn save(config: &Config, download: bool) -> Result<(), SyncError> {
    let mut engine = open_engine(config);
    let settings = RemoteSettings::load(engine.mirror());
    let client = GistClient::new(&config.sync)?;
    let Some(saved) = engine.save(&settings, &client, download)? else {
        return Ok(());
    };
    println!("Saved to Gist at {}.", saved.saved_at.format("%H:%M:%S"));
    if saved.download {
        let path = backup::write_download(
            &config.data.export_dir,
            &saved.content,
            saved.saved_at.date_naive(),
        )?;
        println!("Downloaded copy: {}", path.display());
    }
    Ok(())
}

fn remote(config: &Config, action: RemoteAction) -> Result<(), SyncError> {
    let mirror = FileMirror::new(&config.data.data_dir);
    match action {
        RemoteAction::Set { id, token } => {
            let current = RemoteSettings::load(&mirror);
            let settings = RemoteSettings {
                remote_id: id.trim().to_string(),
                token: token.unwrap_or(current.token),
                ..Default::default()
            };
            settings.save(&mirror)?;
            println!("Gist settings saved.");
        }
        RemoteAction::Show => {
            let settings = RemoteSettings::load(&mirror);
            println!("Gist:  {}", settings.remote_id().unwrap_or("(not set)"));
            println!("Token: {}", settings.masked_token());
        }
    }
    Ok(())
}
