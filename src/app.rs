use crate::board::{self, DayRef};
use crate::clipboard::{ButtonFeedback, DayClipboard};
use crate::config::Config;
use crate::models::{Day, EditorTarget, InputMode, Month, Task, TaskField, Week, default_board};
use crate::storage::{self, FileMirror, RemoteSettings};
use crate::sync::{SyncCompletion, SyncEngine};
use chrono::{DateTime, Duration, Local};
use std::sync::mpsc::Receiver;
use tui_textarea::{CursorMove, TextArea};

const TOAST_SECONDS: i64 = 3;

/// Popup form for one task; one text area per field.
pub struct TaskEditor<'a> {
    pub at: DayRef,
    pub task_id: String,
    pub field: TaskField,
    pub inputs: Vec<TextArea<'a>>,
}

impl<'a> TaskEditor<'a> {
    pub fn new(at: DayRef, task: &Task) -> Self {
        let inputs = TaskField::all()
            .iter()
            .map(|field| {
                let value = match field {
                    TaskField::Text => task.text.clone(),
                    TaskField::Time => task.time.clone(),
                    TaskField::Url => task.url.clone().unwrap_or_default(),
                    TaskField::Notes => task.notes.clone().unwrap_or_default(),
                };
                let mut textarea =
                    TextArea::from(value.split('\n').map(str::to_string).collect::<Vec<_>>());
                textarea.move_cursor(CursorMove::Bottom);
                textarea.move_cursor(CursorMove::End);
                textarea
            })
            .collect();
        Self {
            at,
            task_id: task.id.clone(),
            field: TaskField::Text,
            inputs,
        }
    }

    fn index(field: TaskField) -> usize {
        TaskField::all()
            .iter()
            .position(|f| *f == field)
            .unwrap_or(0)
    }

    pub fn active_mut(&mut self) -> Option<&mut TextArea<'a>> {
        self.inputs.get_mut(Self::index(self.field))
    }

    pub fn input(&self, field: TaskField) -> Option<&TextArea<'a>> {
        self.inputs.get(Self::index(field))
    }

    pub fn value(&self, field: TaskField) -> String {
        self.input(field)
            .map(|textarea| textarea.lines().join("\n"))
            .unwrap_or_default()
    }

    pub fn next_field(&mut self) {
        self.field = self.field.next();
    }

    pub fn prev_field(&mut self) {
        let all = TaskField::all();
        let i = Self::index(self.field);
        self.field = all[(i + all.len() - 1) % all.len()];
    }

    /// Applies the form to `task`. Text and time are single-line fields.
    pub fn apply_to(&self, task: &mut Task) {
        let text = self.value(TaskField::Text).replace('\n', " ");
        if !text.trim().is_empty() {
            task.text = text.trim().to_string();
        }
        let time = self.value(TaskField::Time).replace('\n', " ");
        task.time = time.trim().to_string();
        task.url = Some(self.value(TaskField::Url).trim().to_string());
        task.notes = Some(self.value(TaskField::Notes));
    }
}

pub struct NotesEditor<'a> {
    pub month_id: String,
    pub week_id: String,
    pub textarea: TextArea<'a>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RemoteField {
    Id,
    Token,
}

/// Gist id and token entry.
pub struct RemoteForm<'a> {
    pub focus: RemoteField,
    pub id_input: TextArea<'a>,
    pub token_input: TextArea<'a>,
}

impl<'a> RemoteForm<'a> {
    pub fn new(settings: &RemoteSettings) -> Self {
        let mut token_input = TextArea::from([settings.token.clone()]);
        token_input.set_mask_char('•');
        token_input.move_cursor(CursorMove::End);
        let mut id_input = TextArea::from([settings.remote_id.clone()]);
        id_input.move_cursor(CursorMove::End);
        Self {
            focus: RemoteField::Id,
            id_input,
            token_input,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            RemoteField::Id => RemoteField::Token,
            RemoteField::Token => RemoteField::Id,
        };
    }

    pub fn active_mut(&mut self) -> &mut TextArea<'a> {
        match self.focus {
            RemoteField::Id => &mut self.id_input,
            RemoteField::Token => &mut self.token_input,
        }
    }

    pub fn settings(&self) -> RemoteSettings {
        RemoteSettings {
            remote_id: self.id_input.lines().concat().trim().to_string(),
            token: self.token_input.lines().concat().trim().to_string(),
            ..Default::default()
        }
    }
}

pub struct App<'a> {
    pub input_mode: InputMode,
    pub engine: SyncEngine<FileMirror>,
    pub remote: RemoteSettings,
    pub sync_receiver: Option<Receiver<SyncCompletion>>,
    pub clipboard: DayClipboard,
    pub feedback: ButtonFeedback,

    // Board selection
    pub month_index: usize,
    pub week_index: usize,
    pub day_index: usize,
    pub task_index: usize,

    pub task_editor: Option<TaskEditor<'a>>,
    pub notes_editor: Option<NotesEditor<'a>>,

    pub show_help_popup: bool,
    pub show_fetch_confirm: bool,
    pub show_save_popup: bool,
    pub show_data_popup: bool,
    pub show_clear_confirm: bool,
    pub paste_target: Option<DayRef>,
    pub delete_target: Option<(DayRef, String)>,
    pub remote_form: Option<RemoteForm<'a>>,
    pub import_input: Option<TextArea<'a>>,

    pub toast_message: Option<String>,
    pub toast_expiry: Option<DateTime<Local>>,
    pub should_quit: bool,

    pub config: Config,
}

impl<'a> App<'a> {
    pub fn new(config: Config) -> App<'a> {
        Self::with_env_token(config, storage::env_token())
    }

    /// Builds the app with an explicit fallback token instead of reading the environment.
    pub fn with_env_token(config: Config, env_token: Option<String>) -> App<'a> {
        let mirror = FileMirror::new(&config.data.data_dir);
        let engine = SyncEngine::load(mirror, default_board(config.board.months));
        let remote = RemoteSettings::load_with_env(engine.mirror(), env_token);
        let feedback = ButtonFeedback::new(config.board.feedback_millis);

        let today_month = Local::now().format("%B-%Y").to_string().to_lowercase();
        let month_index = engine
            .data()
            .iter()
            .position(|m| m.id == today_month)
            .unwrap_or(0);

        App {
            input_mode: InputMode::Navigate,
            engine,
            remote,
            sync_receiver: None,
            clipboard: DayClipboard::default(),
            feedback,
            month_index,
            week_index: 0,
            day_index: 0,
            task_index: 0,
            task_editor: None,
            notes_editor: None,
            show_help_popup: false,
            show_fetch_confirm: false,
            show_save_popup: false,
            show_data_popup: false,
            show_clear_confirm: false,
            paste_target: None,
            delete_target: None,
            remote_form: None,
            import_input: None,
            toast_message: None,
            toast_expiry: None,
            should_quit: false,
            config,
        }
    }

    pub fn toast(&mut self, message: impl Into<String>) {
        self.toast_message = Some(message.into());
        self.toast_expiry = Some(Local::now() + Duration::seconds(TOAST_SECONDS));
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn transition_to(&mut self, mode: InputMode) {
        self.input_mode = mode;
        if mode == InputMode::Navigate {
            self.task_editor = None;
            self.notes_editor = None;
        }
    }

    pub fn editor_target(&self) -> Option<EditorTarget> {
        if self.task_editor.is_some() {
            Some(EditorTarget::Task)
        } else if self.notes_editor.is_some() {
            Some(EditorTarget::WeeklyNotes)
        } else {
            None
        }
    }

    pub fn current_month(&self) -> Option<&Month> {
        self.engine.data().get(self.month_index)
    }

    pub fn current_week(&self) -> Option<&Week> {
        self.current_month()?.weeks.get(self.week_index)
    }

    pub fn current_day_ref(&self) -> Option<DayRef> {
        let month = self.current_month()?;
        let week = month.weeks.get(self.week_index)?;
        week.days
            .get(self.day_index)
            .map(|_| DayRef::new(&month.id, &week.id, self.day_index))
    }

    pub fn current_day(&self) -> Option<&Day> {
        self.current_week()?.days.get(self.day_index)
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.current_day()?.todos.get(self.task_index)
    }

    pub fn is_busy(&self) -> bool {
        self.engine.is_busy()
    }

    pub fn next_month(&mut self) {
        if self.month_index + 1 < self.engine.data().len() {
            self.select_month(self.month_index + 1);
        }
    }

    pub fn prev_month(&mut self) {
        if self.month_index > 0 {
            self.select_month(self.month_index - 1);
        }
    }

    /// Switching months always lands on the first week.
    fn select_month(&mut self, index: usize) {
        self.month_index = index;
        self.week_index = 0;
        self.day_index = 0;
        self.task_index = 0;
    }

    pub fn next_week(&mut self) {
        let weeks = self.current_month().map_or(0, |m| m.weeks.len());
        if self.week_index + 1 < weeks {
            self.week_index += 1;
            self.day_index = 0;
            self.task_index = 0;
        } else if self.month_index + 1 < self.engine.data().len() {
            self.select_month(self.month_index + 1);
        }
    }

    pub fn prev_week(&mut self) {
        if self.week_index > 0 {
            self.week_index -= 1;
            self.day_index = 0;
            self.task_index = 0;
        } else if self.month_index > 0 {
            self.select_month(self.month_index - 1);
            let weeks = self.current_month().map_or(0, |m| m.weeks.len());
            self.week_index = weeks.saturating_sub(1);
        }
    }

    pub fn move_day(&mut self, forward: bool) {
        let days = self.current_week().map_or(0, |w| w.days.len());
        if days == 0 {
            return;
        }
        self.day_index = if forward {
            (self.day_index + 1).min(days - 1)
        } else {
            self.day_index.saturating_sub(1)
        };
        self.task_index = 0;
    }

    pub fn move_task(&mut self, down: bool) {
        let tasks = self.current_day().map_or(0, |d| d.todos.len());
        if tasks == 0 {
            self.task_index = 0;
            return;
        }
        self.task_index = if down {
            (self.task_index + 1).min(tasks - 1)
        } else {
            self.task_index.saturating_sub(1)
        };
    }

    /// Pulls every index back into range after the board was replaced.
    pub fn clamp_selection(&mut self) {
        let months = self.engine.data().len();
        self.month_index = self.month_index.min(months.saturating_sub(1));
        let weeks = self.current_month().map_or(0, |m| m.weeks.len());
        self.week_index = self.week_index.min(weeks.saturating_sub(1));
        let days = self.current_week().map_or(0, |w| w.days.len());
        self.day_index = self.day_index.min(days.saturating_sub(1));
        let tasks = self.current_day().map_or(0, |d| d.todos.len());
        self.task_index = self.task_index.min(tasks.saturating_sub(1));
    }

    pub fn weekly_notes(&self) -> &str {
        match (self.current_month(), self.current_week()) {
            (Some(month), Some(week)) => board::weekly_notes(self.engine.data(), &month.id, &week.id),
            _ => "",
        }
    }
}
