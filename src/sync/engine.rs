use crate::models::Board;
use crate::storage::{self, MirrorStore, RemoteSettings, STATE_KEY};
use crate::sync::error::SyncError;
use crate::sync::gist::RemoteDocument;
use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Saving,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    NotConfigured,
    Loading,
    FetchRequired,
    UpToDate,
    UnsavedChanges,
    SavedAt(DateTime<Local>),
    ReadyToSync,
}

impl SyncStatus {
    pub fn label(&self) -> String {
        match self {
            SyncStatus::NotConfigured => "Not configured".to_string(),
            SyncStatus::Loading => "Loading...".to_string(),
            SyncStatus::FetchRequired => "Fetch required".to_string(),
            SyncStatus::UpToDate => "Up to date".to_string(),
            SyncStatus::UnsavedChanges => "Unsaved changes".to_string(),
            SyncStatus::SavedAt(at) => format!("Saved {}", at.format("%H:%M:%S")),
            SyncStatus::ReadyToSync => "Ready to sync".to_string(),
        }
    }
}

/// Compact form of a board exchanged with the remote, compared against the
/// live board regardless of how the remote copy was formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    canonical: String,
}

impl Snapshot {
    fn of_board(board: &Board) -> Result<Self, SyncError> {
        let canonical = serde_json::to_string(board)?;
        Ok(Self { canonical })
    }

    fn matches(&self, canonical: &str) -> bool {
        self.canonical == canonical
    }
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub remote_id: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub remote_id: String,
    pub token: String,
    /// Pretty-printed board as sent to the remote.
    pub content: String,
    pub download: bool,
    canonical: String,
}

/// Result of the network half of a save. A conflicting save carries the
/// result of the follow-up fetch.
#[derive(Debug)]
pub struct SaveOutcome {
    pub result: Result<(), SyncError>,
    pub refetched: Option<Result<Option<String>, SyncError>>,
}

#[derive(Debug, Clone)]
pub struct SavedDocument {
    pub content: String,
    pub saved_at: DateTime<Local>,
    pub download: bool,
}

pub fn run_fetch<R>(remote: &R, request: &FetchRequest) -> Result<Option<String>, SyncError>
where
    R: RemoteDocument + ?Sized,
{
    remote.fetch_document(&request.remote_id, request.token.as_deref())
}

pub fn run_save<R>(remote: &R, request: &SaveRequest) -> SaveOutcome
where
    R: RemoteDocument + ?Sized,
{
    match remote.save_document(&request.remote_id, &request.token, &request.content) {
        Err(SyncError::Conflict) => {
            log::warn!(
                "event=sync_save status=conflict remote_id={} action=refetch",
                request.remote_id
            );
            let refetched = remote.fetch_document(&request.remote_id, Some(&request.token));
            SaveOutcome {
                result: Err(SyncError::Conflict),
                refetched: Some(refetched),
            }
        }
        result => SaveOutcome {
            result,
            refetched: None,
        },
    }
}

/// Owns the live board and decides, by comparing serialized snapshots,
/// whether it differs from what was last saved to or fetched from the remote.
pub struct SyncEngine<M: MirrorStore> {
    data: Board,
    mirror: M,
    last_saved: Option<Snapshot>,
    last_fetched: Option<Snapshot>,
    has_unsaved_changes: bool,
    has_initial_fetch: bool,
    changes_since_last_fetch: bool,
    last_saved_at: Option<DateTime<Local>>,
    phase: SyncPhase,
    error: Option<String>,
}

impl<M: MirrorStore> SyncEngine<M> {
    /// Restores the board from the mirror, falling back to `initial`.
    pub fn load(mirror: M, initial: Board) -> Self {
        let stored = match mirror.load(STATE_KEY) {
            Ok(stored) => stored,
            Err(err) => {
                log::warn!("event=mirror_load status=error key={STATE_KEY} error={err}");
                None
            }
        };

        let restored = stored.and_then(|raw| match serde_json::from_str::<Board>(&raw) {
            Ok(board) => Snapshot::of_board(&board).ok().map(|s| (board, s)),
            Err(err) => {
                log::warn!("event=mirror_parse status=error key={STATE_KEY} error={err}");
                None
            }
        });

        let (data, last_saved) = match restored {
            Some((board, snapshot)) => (board, Some(snapshot)),
            None => (initial, None),
        };

        Self {
            data,
            mirror,
            last_saved,
            last_fetched: None,
            has_unsaved_changes: false,
            has_initial_fetch: false,
            changes_since_last_fetch: false,
            last_saved_at: None,
            phase: SyncPhase::Idle,
            error: None,
        }
    }

    pub fn data(&self) -> &Board {
        &self.data
    }

    pub fn mirror(&self) -> &M {
        &self.mirror
    }

    #[cfg(test)]
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != SyncPhase::Idle
    }

    #[cfg(test)]
    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    #[cfg(test)]
    pub fn has_initial_fetch(&self) -> bool {
        self.has_initial_fetch
    }

    #[cfg(test)]
    pub fn changes_since_last_fetch(&self) -> bool {
        self.changes_since_last_fetch
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Local>> {
        self.last_saved_at
    }

    #[cfg(test)]
    pub fn last_saved_snapshot(&self) -> Option<&Snapshot> {
        self.last_saved.as_ref()
    }

    #[cfg(test)]
    pub fn last_fetched_snapshot(&self) -> Option<&Snapshot> {
        self.last_fetched.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Replaces the board, mirrors it locally and recomputes the dirty flags.
    /// While a fetch is in flight the flags are left alone; the fetch result
    /// resets them.
    pub fn mutate(&mut self, new_data: Board) {
        self.data = new_data;
        let canonical = match serde_json::to_string(&self.data) {
            Ok(canonical) => canonical,
            Err(err) => {
                log::warn!("event=mirror_serialize status=error key={STATE_KEY} error={err}");
                return;
            }
        };
        storage::store_raw(&self.mirror, STATE_KEY, &canonical);

        if self.phase == SyncPhase::Fetching {
            return;
        }
        self.refresh_flags(&canonical);
    }

    /// Applies `apply` to a copy of the board and commits it through `mutate`.
    pub fn update<T>(&mut self, apply: impl FnOnce(&mut Board) -> T) -> T {
        let mut next = self.data.clone();
        let result = apply(&mut next);
        self.mutate(next);
        result
    }

    fn refresh_flags(&mut self, canonical: &str) {
        self.has_unsaved_changes = !self
            .last_saved
            .as_ref()
            .is_some_and(|s| s.matches(canonical));
        if self.has_initial_fetch {
            self.changes_since_last_fetch = !self
                .last_fetched
                .as_ref()
                .is_some_and(|s| s.matches(canonical));
        }
    }

    /// Re-derives the dirty flags after a fetch that did not replace the
    /// board, since edits made while it was in flight were not tracked.
    fn retrack(&mut self) {
        match serde_json::to_string(&self.data) {
            Ok(current) => self.refresh_flags(&current),
            Err(err) => log::warn!("event=sync_retrack status=error error={err}"),
        }
    }

    fn record_error(&mut self, err: &SyncError) {
        self.error = Some(err.to_string());
    }

    pub fn begin_fetch(
        &mut self,
        settings: &RemoteSettings,
    ) -> Result<Option<FetchRequest>, SyncError> {
        let Some(remote_id) = settings.remote_id() else {
            let err = SyncError::Config("GitHub Gist ID is required".to_string());
            self.record_error(&err);
            return Err(err);
        };
        if self.is_busy() {
            log::info!("event=sync_fetch status=skipped reason=busy");
            return Ok(None);
        }

        self.phase = SyncPhase::Fetching;
        self.error = None;
        log::info!("event=sync_fetch status=start remote_id={remote_id}");
        Ok(Some(FetchRequest {
            remote_id: remote_id.to_string(),
            token: settings.token().map(str::to_string),
        }))
    }

    /// Applies a fetch result and returns to `Idle` in the same step.
    pub fn finish_fetch(&mut self, result: Result<Option<String>, SyncError>) -> Result<(), SyncError> {
        self.phase = SyncPhase::Idle;
        match result.and_then(|content| self.apply_fetched(content)) {
            Ok(()) => Ok(()),
            Err(err) => {
                log::warn!("event=sync_fetch status=error error={err}");
                self.record_error(&err);
                self.retrack();
                Err(err)
            }
        }
    }

    fn apply_fetched(&mut self, content: Option<String>) -> Result<(), SyncError> {
        match content {
            Some(content) => {
                let board: Board = serde_json::from_str(&content)?;
                let snapshot = Snapshot::of_board(&board)?;
                storage::store_raw(&self.mirror, STATE_KEY, &snapshot.canonical);
                self.data = board;
                self.last_saved = Some(snapshot.clone());
                self.last_fetched = Some(snapshot);
                self.has_unsaved_changes = false;
                log::info!("event=sync_fetch status=ok local_overwritten=true");
            }
            None => {
                self.last_fetched = Some(Snapshot::of_board(&self.data)?);
                log::info!("event=sync_fetch status=ok local_overwritten=false reason=empty_document");
            }
        }
        self.changes_since_last_fetch = false;
        self.has_initial_fetch = true;
        self.error = None;
        Ok(())
    }

    pub fn fetch<R>(&mut self, settings: &RemoteSettings, remote: &R) -> Result<(), SyncError>
    where
        R: RemoteDocument + ?Sized,
    {
        let Some(request) = self.begin_fetch(settings)? else {
            return Ok(());
        };
        let result = run_fetch(remote, &request);
        self.finish_fetch(result)
    }

    /// Returns `Ok(None)` without doing anything when another operation is
    /// already in flight.
    pub fn begin_save(
        &mut self,
        settings: &RemoteSettings,
        download: bool,
    ) -> Result<Option<SaveRequest>, SyncError> {
        let Some(remote_id) = settings.remote_id() else {
            let err = SyncError::Config("GitHub Gist ID is required".to_string());
            self.record_error(&err);
            return Err(err);
        };
        let Some(token) = settings.token() else {
            let err = SyncError::Config("GitHub token is required for saving".to_string());
            self.record_error(&err);
            return Err(err);
        };
        if self.is_busy() {
            log::info!("event=sync_save status=skipped reason=in_flight");
            return Ok(None);
        }

        let serialized = serde_json::to_string_pretty(&self.data)
            .and_then(|content| serde_json::to_string(&self.data).map(|c| (content, c)));
        let (content, canonical) = match serialized {
            Ok(pair) => pair,
            Err(err) => {
                let err = SyncError::from(err);
                self.record_error(&err);
                return Err(err);
            }
        };

        self.phase = SyncPhase::Saving;
        self.error = None;
        log::info!(
            "event=sync_save status=start remote_id={remote_id} bytes={}",
            content.len()
        );
        Ok(Some(SaveRequest {
            remote_id: remote_id.to_string(),
            token: token.to_string(),
            content,
            download,
            canonical,
        }))
    }

    pub fn finish_save(
        &mut self,
        request: SaveRequest,
        outcome: SaveOutcome,
    ) -> Result<SavedDocument, SyncError> {
        self.phase = SyncPhase::Idle;
        match outcome.result {
            Ok(()) => {
                let snapshot = Snapshot {
                    canonical: request.canonical,
                };
                self.last_saved = Some(snapshot.clone());
                self.last_fetched = Some(snapshot);
                let saved_at = Local::now();
                self.last_saved_at = Some(saved_at);
                self.error = None;
                // Edits made while the request was in flight stay dirty.
                match serde_json::to_string(&self.data) {
                    Ok(current) => self.refresh_flags(&current),
                    Err(_) => {
                        self.has_unsaved_changes = false;
                        self.changes_since_last_fetch = false;
                    }
                }
                log::info!("event=sync_save status=ok remote_id={}", request.remote_id);
                Ok(SavedDocument {
                    content: request.content,
                    saved_at,
                    download: request.download,
                })
            }
            Err(SyncError::Conflict) => {
                if let Some(refetched) = outcome.refetched
                    && let Err(err) = refetched.and_then(|content| self.apply_fetched(content))
                {
                    log::warn!("event=sync_reconcile status=error error={err}");
                }
                let err = SyncError::Conflict;
                self.record_error(&err);
                Err(err)
            }
            Err(err) => {
                log::warn!("event=sync_save status=error error={err}");
                self.record_error(&err);
                Err(err)
            }
        }
    }

    pub fn save<R>(
        &mut self,
        settings: &RemoteSettings,
        remote: &R,
        download: bool,
    ) -> Result<Option<SavedDocument>, SyncError>
    where
        R: RemoteDocument + ?Sized,
    {
        let Some(request) = self.begin_save(settings, download)? else {
            return Ok(None);
        };
        let outcome = run_save(remote, &request);
        self.finish_save(request, outcome).map(Some)
    }

    /// Returns to `Idle` after an in-flight request was lost without a result.
    pub fn abandon(&mut self, err: SyncError) {
        log::warn!("event=sync_abandon phase={:?} error={err}", self.phase);
        let was_fetching = self.phase == SyncPhase::Fetching;
        self.phase = SyncPhase::Idle;
        self.record_error(&err);
        if was_fetching {
            self.retrack();
        }
    }

    pub fn status(&self, settings: &RemoteSettings) -> SyncStatus {
        if !settings.is_configured() {
            SyncStatus::NotConfigured
        } else if self.is_busy() {
            SyncStatus::Loading
        } else if !self.has_initial_fetch {
            SyncStatus::FetchRequired
        } else if !self.changes_since_last_fetch {
            SyncStatus::UpToDate
        } else if self.has_unsaved_changes {
            SyncStatus::UnsavedChanges
        } else if let Some(at) = self.last_saved_at {
            SyncStatus::SavedAt(at)
        } else {
            SyncStatus::ReadyToSync
        }
    }

    /// Whether the UI offers saving: configured, idle, fetched, and edited
    /// since that fetch.
    pub fn can_save(&self, settings: &RemoteSettings) -> bool {
        settings.is_configured()
            && !self.is_busy()
            && self.has_initial_fetch
            && self.changes_since_last_fetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{self, DayRef};
    use crate::models::{Task, generate_months};
    use crate::storage::testing::{FullMirror, MemoryMirror};
    use chrono::NaiveDate;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeRemote {
        content: RefCell<Option<String>>,
        conflict: Cell<bool>,
        missing: Cell<bool>,
        fetches: Cell<usize>,
        saves: RefCell<Vec<String>>,
    }

    impl FakeRemote {
        fn holding(content: &str) -> Self {
            let remote = FakeRemote::default();
            *remote.content.borrow_mut() = Some(content.to_string());
            remote
        }
    }

    impl RemoteDocument for FakeRemote {
        fn fetch_document(&self, _id: &str, _token: Option<&str>) -> Result<Option<String>, SyncError> {
            self.fetches.set(self.fetches.get() + 1);
            if self.missing.get() {
                return Err(SyncError::NotFound);
            }
            Ok(self.content.borrow().clone())
        }

        fn save_document(&self, _id: &str, _token: &str, content: &str) -> Result<(), SyncError> {
            if self.conflict.get() {
                return Err(SyncError::Conflict);
            }
            self.saves.borrow_mut().push(content.to_string());
            *self.content.borrow_mut() = Some(content.to_string());
            Ok(())
        }
    }

    fn settings() -> RemoteSettings {
        RemoteSettings {
            remote_id: "gist-1".to_string(),
            token: "token".to_string(),
            ..Default::default()
        }
    }

    fn board() -> Board {
        generate_months(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(), 1)
    }

    fn first_day(board: &Board) -> DayRef {
        DayRef::new(&board[0].id, &board[0].weeks[0].id, 0)
    }

    fn engine() -> SyncEngine<MemoryMirror> {
        SyncEngine::load(MemoryMirror::default(), board())
    }

    fn add_task(engine: &mut SyncEngine<MemoryMirror>, text: &str) {
        let at = first_day(engine.data());
        engine.update(|b| board::add_task(b, &at, Task::new(text, "9:00 AM")));
    }

    #[test]
    fn fetch_of_empty_list_replaces_state() {
        let mut engine = engine();
        let remote = FakeRemote::holding("[]");

        engine.fetch(&settings(), &remote).expect("fetch");

        assert!(engine.data().is_empty());
        assert!(engine.has_initial_fetch());
        assert!(!engine.has_unsaved_changes());
        assert!(!engine.changes_since_last_fetch());
        assert_eq!(engine.phase(), SyncPhase::Idle);
        assert_eq!(engine.mirror().get(STATE_KEY), Some("[]".to_string()));
        assert!(engine.last_fetched_snapshot().unwrap().matches("[]"));
    }

    #[test]
    fn fetch_overwrites_local_edits() {
        let mut engine = engine();
        add_task(&mut engine, "local only");
        assert!(engine.has_unsaved_changes());

        let remote_board = board();
        let remote = FakeRemote::holding(&serde_json::to_string_pretty(&remote_board).unwrap());
        engine.fetch(&settings(), &remote).expect("fetch");

        assert_eq!(engine.data(), &remote_board);
        assert!(!engine.has_unsaved_changes());
        assert!(!engine.changes_since_last_fetch());
    }

    #[test]
    fn fetch_requires_remote_id() {
        let mut engine = engine();
        let remote = FakeRemote::holding("[]");
        let err = engine
            .fetch(&RemoteSettings::default(), &remote)
            .unwrap_err();

        assert!(matches!(err, SyncError::Config(_)));
        assert_eq!(remote.fetches.get(), 0);
        assert_eq!(engine.error(), Some("GitHub Gist ID is required"));
        assert_eq!(engine.phase(), SyncPhase::Idle);
    }

    #[test]
    fn fetch_with_read_only_settings_is_allowed() {
        let mut engine = engine();
        let remote = FakeRemote::holding("[]");
        let read_only = RemoteSettings {
            remote_id: "gist-1".to_string(),
            token: String::new(),
            ..Default::default()
        };
        engine.fetch(&read_only, &remote).expect("fetch");
        assert!(engine.has_initial_fetch());
    }

    #[test]
    fn failed_fetch_leaves_data_untouched() {
        let mut engine = engine();
        add_task(&mut engine, "keep me");
        let before = engine.data().clone();
        let remote = FakeRemote::default();
        remote.missing.set(true);

        let err = engine.fetch(&settings(), &remote).unwrap_err();

        assert!(matches!(err, SyncError::NotFound));
        assert_eq!(engine.data(), &before);
        assert!(!engine.has_initial_fetch());
        assert!(engine.error().unwrap().contains("Gist not found"));
        assert_eq!(engine.phase(), SyncPhase::Idle);
    }

    #[test]
    fn malformed_remote_content_is_a_parse_error() {
        let mut engine = engine();
        let before = engine.data().clone();
        let remote = FakeRemote::holding("{\"not\": \"a board\"}");

        let err = engine.fetch(&settings(), &remote).unwrap_err();

        assert!(matches!(err, SyncError::Parse(_)));
        assert_eq!(engine.data(), &before);
        assert!(!engine.has_initial_fetch());
    }

    #[test]
    fn empty_document_keeps_local_data_and_marks_fetched() {
        let mut engine = engine();
        add_task(&mut engine, "local");
        let before = engine.data().clone();

        engine.fetch(&settings(), &FakeRemote::default()).expect("fetch");

        assert_eq!(engine.data(), &before);
        assert!(engine.has_initial_fetch());
        assert!(!engine.changes_since_last_fetch());
        assert_eq!(engine.status(&settings()), SyncStatus::UpToDate);
    }

    #[test]
    fn mutate_only_tracks_fetch_changes_after_initial_fetch() {
        let mut engine = engine();
        add_task(&mut engine, "before fetch");
        assert!(!engine.has_initial_fetch());
        assert!(!engine.changes_since_last_fetch());

        let remote = FakeRemote::holding(&serde_json::to_string(&board()).unwrap());
        engine.fetch(&settings(), &remote).expect("fetch");

        add_task(&mut engine, "after fetch");
        assert!(engine.has_initial_fetch());
        assert!(engine.changes_since_last_fetch());
        assert!(engine.has_unsaved_changes());

        // Reverting to the fetched board clears both flags again.
        engine.mutate(board());
        assert!(!engine.changes_since_last_fetch());
        assert!(!engine.has_unsaved_changes());
        assert!(engine.has_initial_fetch());
    }

    #[test]
    fn mutate_is_untracked_while_fetching() {
        let mut engine = engine();
        let request = engine.begin_fetch(&settings()).expect("begin");
        assert!(request.is_some());

        add_task(&mut engine, "during fetch");
        assert!(!engine.has_unsaved_changes());
        assert!(engine.mirror().get(STATE_KEY).unwrap().contains("during fetch"));

        engine.finish_fetch(Ok(Some("[]".to_string()))).expect("finish");
        assert!(engine.data().is_empty());
        assert!(!engine.has_unsaved_changes());
    }

    #[test]
    fn failed_fetch_keeps_edits_made_while_in_flight() {
        let mut engine = engine();
        let remote = FakeRemote::holding(&serde_json::to_string(&board()).unwrap());
        engine.fetch(&settings(), &remote).expect("fetch");
        assert_eq!(engine.status(&settings()), SyncStatus::UpToDate);

        engine.begin_fetch(&settings()).expect("begin").expect("request");
        add_task(&mut engine, "during fetch");
        let err = engine.finish_fetch(Err(SyncError::NotFound)).unwrap_err();

        assert!(matches!(err, SyncError::NotFound));
        assert!(engine.has_unsaved_changes());
        assert!(engine.changes_since_last_fetch());
        assert_eq!(engine.status(&settings()), SyncStatus::UnsavedChanges);
        assert!(engine.can_save(&settings()));
    }

    #[test]
    fn abandoned_fetch_keeps_edits_made_while_in_flight() {
        let mut engine = engine();
        let remote = FakeRemote::holding(&serde_json::to_string(&board()).unwrap());
        engine.fetch(&settings(), &remote).expect("fetch");

        engine.begin_fetch(&settings()).expect("begin").expect("request");
        add_task(&mut engine, "during fetch");
        engine.abandon(SyncError::Request("worker stopped".to_string()));

        assert!(engine.changes_since_last_fetch());
        assert!(engine.can_save(&settings()));
    }

    #[test]
    fn mirror_failures_do_not_block_mutation() {
        let mut engine = SyncEngine::load(FullMirror, board());
        let at = first_day(engine.data());
        engine.update(|b| board::add_task(b, &at, Task::new("still here", "9:00 AM")));
        assert_eq!(board::task_count(engine.data()), 1);
        assert!(engine.has_unsaved_changes());
    }

    #[test]
    fn every_mutation_is_mirrored() {
        let mut engine = engine();
        add_task(&mut engine, "one");
        add_task(&mut engine, "two");
        assert_eq!(*engine.mirror().writes.borrow(), 2);
        let stored: Board =
            serde_json::from_str(&engine.mirror().get(STATE_KEY).unwrap()).unwrap();
        assert_eq!(&stored, engine.data());
    }

    #[test]
    fn load_restores_board_from_mirror() {
        let mirror = MemoryMirror::default();
        let mut stored = board();
        stored[0].weeks[0].days[0]
            .todos
            .push(Task::new("persisted", "9:00 AM"));
        mirror
            .store(STATE_KEY, &serde_json::to_string(&stored).unwrap())
            .unwrap();

        let mut engine = SyncEngine::load(mirror, Vec::new());
        assert_eq!(engine.data(), &stored);

        engine.mutate(stored.clone());
        assert!(!engine.has_unsaved_changes());
    }

    #[test]
    fn load_falls_back_to_initial_board_on_corrupt_mirror() {
        let mirror = MemoryMirror::default();
        mirror.store(STATE_KEY, "{oops").unwrap();
        let engine = SyncEngine::load(mirror, board());
        assert_eq!(engine.data(), &board());
    }

    #[test]
    fn save_updates_snapshots_and_clears_flags() {
        let mut engine = engine();
        let remote = FakeRemote::holding(&serde_json::to_string(&board()).unwrap());
        engine.fetch(&settings(), &remote).expect("fetch");
        add_task(&mut engine, "to save");
        assert!(engine.can_save(&settings()));

        let saved = engine
            .save(&settings(), &remote, true)
            .expect("save")
            .expect("not skipped");

        assert_eq!(remote.saves.borrow().len(), 1);
        assert_eq!(saved.content, remote.saves.borrow()[0]);
        assert!(saved.content.contains("\n  "));
        assert!(saved.download);
        let canonical = serde_json::to_string(engine.data()).unwrap();
        assert!(engine.last_saved_snapshot().unwrap().matches(&canonical));
        assert!(engine.last_fetched_snapshot().unwrap().matches(&canonical));
        assert!(!engine.has_unsaved_changes());
        assert!(!engine.changes_since_last_fetch());
        assert_eq!(engine.last_saved_at(), Some(saved.saved_at));
        assert!(!engine.can_save(&settings()));
    }

    #[test]
    fn save_requires_id_and_token() {
        let mut engine = engine();
        let remote = FakeRemote::default();

        let err = engine
            .save(&RemoteSettings::default(), &remote, false)
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));

        let no_token = RemoteSettings {
            remote_id: "gist-1".to_string(),
            token: " ".to_string(),
            ..Default::default()
        };
        let err = engine.save(&no_token, &remote, false).unwrap_err();
        assert!(err.to_string().contains("token is required"));
        assert!(remote.saves.borrow().is_empty());
    }

    #[test]
    fn operations_are_single_flight() {
        let mut engine = engine();
        let first = engine.begin_save(&settings(), false).expect("begin");
        assert!(first.is_some());
        assert_eq!(engine.status(&settings()), SyncStatus::Loading);

        assert!(engine.begin_save(&settings(), false).expect("second").is_none());
        assert!(engine.begin_fetch(&settings()).expect("fetch").is_none());

        let request = first.unwrap();
        let outcome = SaveOutcome {
            result: Ok(()),
            refetched: None,
        };
        engine.finish_save(request, outcome).expect("finish");
        assert_eq!(engine.phase(), SyncPhase::Idle);
        assert!(engine.begin_fetch(&settings()).expect("fetch").is_some());
    }

    #[test]
    fn conflict_triggers_one_fetch_and_reports_conflict() {
        let mut engine = engine();
        add_task(&mut engine, "local task");

        let remote_board = board();
        let remote = FakeRemote::holding(&serde_json::to_string_pretty(&remote_board).unwrap());
        remote.conflict.set(true);

        let err = engine.save(&settings(), &remote, false).unwrap_err();

        assert!(matches!(err, SyncError::Conflict));
        assert_eq!(remote.fetches.get(), 1);
        assert!(remote.saves.borrow().is_empty());
        assert_eq!(engine.data(), &remote_board);
        assert!(!engine.has_unsaved_changes());
        assert!(engine.has_initial_fetch());
        assert!(engine.error().unwrap().contains("Conflict detected"));
        assert_eq!(engine.phase(), SyncPhase::Idle);
    }

    #[test]
    fn conflict_with_failed_refetch_keeps_local_data() {
        let mut engine = engine();
        add_task(&mut engine, "local task");
        let before = engine.data().clone();

        let remote = FakeRemote::default();
        remote.conflict.set(true);
        remote.missing.set(true);

        let err = engine.save(&settings(), &remote, false).unwrap_err();
        assert!(matches!(err, SyncError::Conflict));
        assert_eq!(engine.data(), &before);
        assert!(engine.has_unsaved_changes());
    }

    #[test]
    fn edits_during_save_stay_dirty() {
        let mut engine = engine();
        engine
            .fetch(&settings(), &FakeRemote::holding("[]"))
            .expect("fetch");
        engine.mutate(board());

        let request = engine.begin_save(&settings(), false).expect("begin").unwrap();
        add_task(&mut engine, "typed while saving");
        let outcome = SaveOutcome {
            result: Ok(()),
            refetched: None,
        };
        engine.finish_save(request, outcome).expect("finish");

        assert!(engine.has_unsaved_changes());
        assert!(engine.changes_since_last_fetch());
        assert_eq!(engine.status(&settings()), SyncStatus::UnsavedChanges);
    }

    #[test]
    fn status_follows_priority_order() {
        let mut engine = engine();
        assert_eq!(
            engine.status(&RemoteSettings::default()),
            SyncStatus::NotConfigured
        );
        assert_eq!(engine.status(&settings()), SyncStatus::FetchRequired);

        engine.has_initial_fetch = true;
        assert_eq!(engine.status(&settings()), SyncStatus::UpToDate);

        engine.changes_since_last_fetch = true;
        engine.has_unsaved_changes = true;
        assert_eq!(engine.status(&settings()), SyncStatus::UnsavedChanges);

        engine.has_unsaved_changes = false;
        assert_eq!(engine.status(&settings()), SyncStatus::ReadyToSync);

        let at = Local::now();
        engine.last_saved_at = Some(at);
        assert_eq!(engine.status(&settings()), SyncStatus::SavedAt(at));

        engine.phase = SyncPhase::Fetching;
        assert_eq!(engine.status(&settings()), SyncStatus::Loading);
    }

    #[test]
    fn abandon_releases_the_busy_phase() {
        let mut engine = engine();
        engine.begin_fetch(&settings()).expect("begin");
        engine.abandon(SyncError::Request("worker stopped".to_string()));
        assert_eq!(engine.phase(), SyncPhase::Idle);
        assert!(engine.error().unwrap().contains("worker stopped"));
        assert!(!engine.has_initial_fetch());
    }

    #[test]
    fn status_labels_are_human_readable() {
        assert_eq!(SyncStatus::FetchRequired.label(), "Fetch required");
        let at = Local::now();
        assert!(SyncStatus::SavedAt(at).label().starts_with("Saved "));
    }
}
