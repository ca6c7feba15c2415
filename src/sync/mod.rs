pub mod engine;
pub mod error;
pub mod gist;

pub use engine::{FetchRequest, SaveOutcome, SaveRequest, SyncEngine, SyncStatus};
pub use error::SyncError;
pub use gist::GistClient;

use std::sync::mpsc::{self, Receiver};
use std::thread;

/// Network half of a fetch or save, delivered back to the UI thread.
pub enum SyncCompletion {
    Fetched(Result<Option<String>, SyncError>),
    Saved(SaveRequest, SaveOutcome),
}

pub fn spawn_fetch(client: GistClient, request: FetchRequest) -> Receiver<SyncCompletion> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let result = engine::run_fetch(&client, &request);
        let _ = sender.send(SyncCompletion::Fetched(result));
    });
    receiver
}

pub fn spawn_save(client: GistClient, request: SaveRequest) -> Receiver<SyncCompletion> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let outcome = engine::run_save(&client, &request);
        let _ = sender.send(SyncCompletion::Saved(request, outcome));
    });
    receiver
}
