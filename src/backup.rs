use crate::models::{Board, Month};
use crate::storage::{self, MirrorStore, STATE_KEY};
use crate::sync::error::{SyncError, ValidationError};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("productivity-tracker-backup-{}.json", date.format("%Y-%m-%d"))
}

pub fn download_file_name(date: NaiveDate) -> String {
    format!("productivity-tracker-{}.json", date.format("%Y-%m-%d"))
}

/// Writes the mirrored board, byte for byte, to a dated backup file in `dir`.
pub fn export_backup(
    mirror: &dyn MirrorStore,
    dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, SyncError> {
    let Some(content) = mirror.load(STATE_KEY)? else {
        return Err(SyncError::NothingToExport);
    };
    let path = write_file(dir, &backup_file_name(date), &content)?;
    log::info!("event=backup_export status=ok path={}", path.display());
    Ok(path)
}

/// Writes a copy of just-saved remote content next to the backups.
pub fn write_download(dir: &Path, content: &str, date: NaiveDate) -> Result<PathBuf, SyncError> {
    let path = write_file(dir, &download_file_name(date), content)?;
    log::info!("event=save_download status=ok path={}", path.display());
    Ok(path)
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf, SyncError> {
    storage::ensure_dir(dir)?;
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}

/// Checks that `content` is a non-empty list of months.
pub fn validate_backup(content: &str) -> Result<Board, ValidationError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ValidationError::NotJson(e.to_string()))?;
    let serde_json::Value::Array(items) = value else {
        return Err(ValidationError::NotAnArray);
    };
    if items.is_empty() {
        return Err(ValidationError::Empty);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Month>(item).map_err(|e| ValidationError::InvalidMonth {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Replaces the mirrored board with the file's content. A running session
/// keeps its in-memory board until restarted.
pub fn import_backup(mirror: &dyn MirrorStore, path: &Path) -> Result<Board, SyncError> {
    let content = fs::read_to_string(path)?;
    let board = match validate_backup(&content) {
        Ok(board) => board,
        Err(err) => {
            log::warn!(
                "event=backup_import status=invalid path={} error={err}",
                path.display()
            );
            return Err(err.into());
        }
    };
    let canonical = serde_json::to_string(&board)?;
    mirror.store(STATE_KEY, &canonical)?;
    log::info!(
        "event=backup_import status=ok path={} months={}",
        path.display(),
        board.len()
    );
    Ok(board)
}

pub fn clear_data(mirror: &dyn MirrorStore) -> Result<(), SyncError> {
    mirror.remove(STATE_KEY)?;
    log::info!("event=data_clear status=ok");
    Ok(())
}
