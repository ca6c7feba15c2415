use crate::{
    app::{App, NotesEditor, TaskEditor},
    backup, board,
    clipboard::{FeedbackKind, PastePlan},
    models::{DEFAULT_TASK_TEXT, InputMode, Task},
    storage,
    sync::{self, GistClient, SyncStatus},
};
use chrono::Local;
use std::path::PathBuf;
use tui_textarea::TextArea;

/// Fetch entry point: asks for confirmation when local data would be lost.
pub fn request_fetch(app: &mut App) {
    if app.remote.remote_id().is_none() {
        app.toast("Enter a Gist ID first (g).");
        return;
    }
    if app.is_busy() {
        app.toast("Sync already running.");
        return;
    }
    if !board::is_empty(app.engine.data()) {
        app.show_fetch_confirm = true;
        return;
    }
    start_fetch(app);
}

pub fn start_fetch(app: &mut App) {
    let client = match GistClient::new(&app.config.sync) {
        Ok(client) => client,
        Err(e) => {
            app.toast(e.to_string());
            return;
        }
    };
    match app.engine.begin_fetch(&app.remote) {
        Ok(Some(request)) => {
            app.sync_receiver = Some(sync::spawn_fetch(client, request));
            app.toast("Fetching from Gist...");
        }
        Ok(None) => app.toast("Sync already running."),
        Err(e) => app.toast(e.to_string()),
    }
}

pub fn open_save_dialog(app: &mut App) {
    if app.engine.can_save(&app.remote) {
        app.show_save_popup = true;
        return;
    }
    let reason = match app.engine.status(&app.remote) {
        SyncStatus::NotConfigured => "Configure Gist ID and token first (g).",
        SyncStatus::Loading => "Sync already running.",
        SyncStatus::FetchRequired => "Fetch from Gist before saving (f).",
        _ => "No changes since last fetch.",
    };
    app.toast(reason);
}

pub fn start_save(app: &mut App, download: bool) {
    app.show_save_popup = false;
    let client = match GistClient::new(&app.config.sync) {
        Ok(client) => client,
        Err(e) => {
            app.toast(e.to_string());
            return;
        }
    };
    match app.engine.begin_save(&app.remote, download) {
        Ok(Some(request)) => {
            app.sync_receiver = Some(sync::spawn_save(client, request));
            app.toast("Saving to Gist...");
        }
        Ok(None) => app.toast("Sync already running."),
        Err(e) => app.toast(e.to_string()),
    }
}

pub fn add_task(app: &mut App) {
    let Some(at) = app.current_day_ref() else {
        return;
    };
    let task = Task::new(DEFAULT_TASK_TEXT, &app.config.board.default_task_time);
    if app.engine.update(|b| board::add_task(b, &at, task)) {
        let count = app.current_day().map_or(0, |d| d.todos.len());
        app.task_index = count.saturating_sub(1);
    }
}

pub fn toggle_task(app: &mut App) {
    let (Some(at), Some(task_id)) = (app.current_day_ref(), app.selected_task().map(|t| t.id.clone()))
    else {
        return;
    };
    app.engine.update(|b| {
        board::update_task(b, &at, &task_id, |task| task.completed = !task.completed)
    });
}

pub fn request_delete_task(app: &mut App) {
    let target = match (app.current_day_ref(), app.selected_task()) {
        (Some(at), Some(task)) => Some((at, task.id.clone())),
        _ => None,
    };
    if target.is_some() {
        app.delete_target = target;
    }
}

pub fn confirm_delete_task(app: &mut App) {
    let Some((at, task_id)) = app.delete_target.take() else {
        return;
    };
    if app.engine.update(|b| board::delete_task(b, &at, &task_id)) {
        app.move_task(false);
        app.clamp_selection();
        app.toast("Task deleted.");
    }
}

pub fn start_edit_task(app: &mut App) {
    let (Some(at), Some(task)) = (app.current_day_ref(), app.selected_task()) else {
        app.toast("No task selected.");
        return;
    };
    app.task_editor = Some(TaskEditor::new(at, task));
    app.transition_to(InputMode::Editing);
}

pub fn submit_task_editor(app: &mut App) {
    let Some(editor) = app.task_editor.take() else {
        return;
    };
    let updated = app.engine.update(|b| {
        board::update_task(b, &editor.at, &editor.task_id, |task| editor.apply_to(task))
    });
    if !updated {
        app.toast("Task no longer exists.");
    }
    app.transition_to(InputMode::Navigate);
}

pub fn open_task_urls(app: &mut App) {
    let urls = app.selected_task().map(Task::urls).unwrap_or_default();
    if urls.is_empty() {
        app.toast("No URL on this task.");
        return;
    }
    let mut failed = 0;
    for url in &urls {
        if let Err(e) = open::that(url) {
            log::warn!("event=open_url status=error url={url} error={e}");
            failed += 1;
        }
    }
    if failed == 0 {
        app.toast(format!("Opened {} link(s).", urls.len()));
    } else {
        app.toast(format!("Failed to open {failed} of {} link(s).", urls.len()));
    }
}

pub fn copy_day(app: &mut App) {
    let (Some(at), Some(day)) = (app.current_day_ref(), app.current_day().cloned()) else {
        return;
    };
    if app.clipboard.copy(&day) {
        let count = day.todos.len();
        app.feedback.show(FeedbackKind::Copy, at);
        app.toast(format!("Copied {count} task(s)."));
    } else {
        app.toast("Nothing to copy on this day.");
    }
}

pub fn paste_day(app: &mut App) {
    let Some(at) = app.current_day_ref() else {
        return;
    };
    let Some(day) = board::find_day(app.engine.data(), &at) else {
        return;
    };
    match app.clipboard.plan_paste(day) {
        PastePlan::Disabled => app.toast(app.clipboard.describe()),
        PastePlan::NeedsConfirmation => app.paste_target = Some(at),
        PastePlan::Ready => execute_paste(app, at),
    }
}

pub fn execute_paste(app: &mut App, at: board::DayRef) {
    let clipboard = &app.clipboard;
    let pasted = app.engine.update(|b| clipboard.paste(b, &at));
    if let Some(count) = pasted {
        app.feedback.show(FeedbackKind::Paste, at);
        app.task_index = 0;
        app.toast(format!("Pasted {count} task(s)."));
    }
}

pub fn open_weekly_notes(app: &mut App) {
    let (Some(month), Some(week)) = (app.current_month(), app.current_week()) else {
        return;
    };
    let (month_id, week_id) = (month.id.clone(), week.id.clone());
    let lines: Vec<String> = app.weekly_notes().split('\n').map(str::to_string).collect();
    let mut textarea = TextArea::from(lines);
    textarea.move_cursor(tui_textarea::CursorMove::Bottom);
    textarea.move_cursor(tui_textarea::CursorMove::End);
    app.notes_editor = Some(NotesEditor {
        month_id,
        week_id,
        textarea,
    });
    app.transition_to(InputMode::Editing);
}

pub fn submit_weekly_notes(app: &mut App) {
    let Some(editor) = app.notes_editor.take() else {
        return;
    };
    let notes = editor.textarea.lines().join("\n");
    app.engine
        .update(|b| board::set_weekly_notes(b, &editor.month_id, &editor.week_id, &notes));
    app.transition_to(InputMode::Navigate);
}

/// Stores the gist settings and, when an id is present, fetches from it.
pub fn submit_remote_form(app: &mut App) {
    let Some(form) = app.remote_form.take() else {
        return;
    };
    let settings = storage::RemoteSettings {
        env_token: app.remote.env_token.clone(),
        ..form.settings()
    };
    if let Err(e) = settings.save(app.engine.mirror()) {
        log::warn!("event=remote_settings_store status=error error={e}");
        app.toast(format!("Failed to store Gist settings: {e}"));
        return;
    }
    app.remote = settings;
    app.engine.clear_error();
    app.toast("Gist settings saved.");
    if app.remote.remote_id().is_some() {
        request_fetch(app);
    }
}

pub fn export_backup(app: &mut App) {
    let today = Local::now().date_naive();
    match backup::export_backup(app.engine.mirror(), &app.config.data.export_dir, today) {
        Ok(path) => app.toast(format!("Exported to {}", path.display())),
        Err(e) => app.toast(format!("Export failed: {e}")),
    }
}

pub fn start_import(app: &mut App) {
    let mut input = TextArea::default();
    input.set_placeholder_text("Path to backup .json file");
    app.import_input = Some(input);
}

pub fn submit_import(app: &mut App) {
    let Some(input) = app.import_input.take() else {
        return;
    };
    let raw = input.lines().concat();
    let path = PathBuf::from(raw.trim());
    if path.as_os_str().is_empty() {
        app.toast("No file given.");
        return;
    }
    match backup::import_backup(app.engine.mirror(), &path) {
        Ok(board) => app.toast(format!(
            "Imported {} month(s). Restart weekplan to load them.",
            board.len()
        )),
        Err(e) => app.toast(format!("Import failed: {e}")),
    }
}

pub fn confirm_clear_data(app: &mut App) {
    app.show_clear_confirm = false;
    match backup::clear_data(app.engine.mirror()) {
        Ok(()) => app.toast("All data cleared. Restart weekplan to start fresh."),
        Err(e) => app.toast(format!("Clear failed: {e}")),
    }
}

pub fn storage_summary(app: &App) -> String {
    let info = storage::storage_info(app.engine.mirror());
    format!("{} KB stored, {} task(s)", info.size_kb, info.items)
}
