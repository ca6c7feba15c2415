use crate::{
    app::App,
    backup,
    sync::{SyncCompletion, SyncError},
};
use chrono::Local;
use std::sync::mpsc::TryRecvError;

pub fn tick(app: &mut App) {
    handle_sync_completion(app);

    app.feedback.expire();

    if let Some(expiry) = app.toast_expiry
        && Local::now() >= expiry
    {
        app.toast_expiry = None;
        app.toast_message = None;
    }
}

fn handle_sync_completion(app: &mut App) {
    let result = {
        let Some(receiver) = app.sync_receiver.as_ref() else {
            return;
        };
        receiver.try_recv()
    };

    match result {
        Ok(SyncCompletion::Fetched(result)) => {
            app.sync_receiver = None;
            match app.engine.finish_fetch(result) {
                Ok(()) => {
                    app.clamp_selection();
                    app.toast("Fetched latest data from Gist.");
                }
                Err(e) => app.toast(format!("Fetch failed: {e}")),
            }
        }
        Ok(SyncCompletion::Saved(request, outcome)) => {
            app.sync_receiver = None;
            match app.engine.finish_save(request, outcome) {
                Ok(saved) if saved.download => {
                    let today = saved.saved_at.date_naive();
                    match backup::write_download(&app.config.data.export_dir, &saved.content, today)
                    {
                        Ok(path) => app.toast(format!("Saved to Gist and {}", path.display())),
                        Err(e) => app.toast(format!("Saved to Gist; download failed: {e}")),
                    }
                }
                Ok(_) => app.toast("Saved to Gist."),
                Err(e @ SyncError::Conflict) => {
                    app.clamp_selection();
                    app.toast(e.to_string());
                }
                Err(e) => app.toast(format!("Save failed: {e}")),
            }
        }
        Err(TryRecvError::Empty) => {}
        Err(TryRecvError::Disconnected) => {
            app.sync_receiver = None;
            app.engine
                .abandon(SyncError::Request("sync worker stopped unexpectedly".to_string()));
            app.toast("Sync worker stopped unexpectedly.");
        }
    }
}
