use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub fn key_match(key: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|binding| is_match(key, binding))
}

fn parse_binding(binding: &str) -> (KeyModifiers, KeyCode) {
    let binding = binding.to_lowercase();
    let mut modifiers = KeyModifiers::NONE;
    let mut code = KeyCode::Null;

    for part in binding.split('+') {
        match part {
            "ctrl" => modifiers.insert(KeyModifiers::CONTROL),
            "opt" | "alt" => modifiers.insert(KeyModifiers::ALT),
            "shift" => modifiers.insert(KeyModifiers::SHIFT),
            "enter" => code = KeyCode::Enter,
            "esc" => code = KeyCode::Esc,
            "backspace" => code = KeyCode::Backspace,
            "tab" => code = KeyCode::Tab,
            "backtab" => code = KeyCode::BackTab,
            "space" => code = KeyCode::Char(' '),
            "up" => code = KeyCode::Up,
            "down" => code = KeyCode::Down,
            "left" => code = KeyCode::Left,
            "right" => code = KeyCode::Right,
            "pageup" => code = KeyCode::PageUp,
            "pagedown" => code = KeyCode::PageDown,
            "delete" => code = KeyCode::Delete,
            c if c.chars().count() == 1 => {
                if let Some(ch) = c.chars().next() {
                    code = KeyCode::Char(ch);
                }
            }
            _ => {}
        }
    }
    (modifiers, code)
}

fn is_match(key: &KeyEvent, binding: &str) -> bool {
    let (target_modifiers, target_code) = parse_binding(binding);

    let code_matches = match (key.code, target_code) {
        (a, b) if a == b => true,
        (KeyCode::Char(c), KeyCode::Char(tc)) => c.to_lowercase().next() == Some(tc),
        _ => false,
    };
    if !code_matches {
        return false;
    }

    // Enter is exact so `enter` and `ctrl+enter` can be bound separately.
    if target_code == KeyCode::Enter {
        return key.modifiers == target_modifiers;
    }

    // Shift only counts when the binding asks for it (BackTab, '?', 'H').
    let mut key_mods = key.modifiers;
    if !target_modifiers.contains(KeyModifiers::SHIFT) {
        key_mods.remove(KeyModifiers::SHIFT);
    }
    key_mods == target_modifiers
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "weekplan", "weekplan")
}

pub fn default_data_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("WEEKPLAN_DATA_DIR") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.data_dir().to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".weekplan")
}

fn default_log_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("WEEKPLAN_LOG_DIR") {
        return PathBuf::from(path);
    }
    default_data_dir().join("logs")
}

fn default_export_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| default_data_dir().join("exports"))
}

pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("WEEKPLAN_CONFIG") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.config_dir().join("config.toml");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".weekplan-config.toml")
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub sync: SyncConfig,
    pub board: BoardConfig,
    pub log: LogConfig,
    pub keybindings: KeyBindings,
    pub theme: Theme,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: default_export_dir(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    pub api_base: String,
    pub file_name: String,
    pub timeout_seconds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            file_name: "productivity-data.json".to_string(),
            timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BoardConfig {
    /// Months generated for a fresh board, starting at the current month.
    pub months: usize,
    pub default_task_time: String,
    /// How long copy/paste buttons show their check mark.
    pub feedback_millis: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            months: 4,
            default_task_time: "9:00 AM".to_string(),
            feedback_millis: 800,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KeyBindings {
    pub global: GlobalBindings,
    pub board: BoardBindings,
    pub editor: EditorBindings,
    pub popup: PopupBindings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GlobalBindings {
    pub quit: Vec<String>,
    pub help: Vec<String>,
    pub fetch: Vec<String>,
    pub save: Vec<String>,
    pub remote: Vec<String>,
    pub data: Vec<String>,
    pub prev_month: Vec<String>,
    pub next_month: Vec<String>,
    pub prev_week: Vec<String>,
    pub next_week: Vec<String>,
    pub weekly_notes: Vec<String>,
}

impl Default for GlobalBindings {
    fn default() -> Self {
        Self {
            quit: vec!["ctrl+q".to_string(), "q".to_string()],
            help: vec!["?".to_string()],
            fetch: vec!["f".to_string()],
            save: vec!["s".to_string()],
            remote: vec!["g".to_string()],
            data: vec!["i".to_string()],
            prev_month: vec!["[".to_string()],
            next_month: vec!["]".to_string()],
            prev_week: vec!["shift+h".to_string(), "pageup".to_string()],
            next_week: vec!["shift+l".to_string(), "pagedown".to_string()],
            weekly_notes: vec!["w".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BoardBindings {
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub add: Vec<String>,
    pub toggle: Vec<String>,
    pub edit: Vec<String>,
    pub delete: Vec<String>,
    pub copy_day: Vec<String>,
    pub paste_day: Vec<String>,
    pub open_url: Vec<String>,
}

impl Default for BoardBindings {
    fn default() -> Self {
        Self {
            left: vec!["h".to_string(), "left".to_string()],
            right: vec!["l".to_string(), "right".to_string()],
            up: vec!["k".to_string(), "up".to_string()],
            down: vec!["j".to_string(), "down".to_string()],
            add: vec!["a".to_string()],
            toggle: vec!["space".to_string()],
            edit: vec!["e".to_string(), "enter".to_string()],
            delete: vec!["d".to_string(), "delete".to_string()],
            copy_day: vec!["y".to_string()],
            paste_day: vec!["p".to_string()],
            open_url: vec!["o".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EditorBindings {
    pub submit: Vec<String>,
    pub cancel: Vec<String>,
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
    /// Newline that continues a bullet or numbered list.
    pub newline: Vec<String>,
    pub bold: Vec<String>,
    pub italic: Vec<String>,
    pub underline: Vec<String>,
    pub code: Vec<String>,
    pub quote: Vec<String>,
    pub bullet: Vec<String>,
    pub numbered: Vec<String>,
}

impl Default for EditorBindings {
    fn default() -> Self {
        Self {
            submit: vec!["ctrl+s".to_string()],
            cancel: vec!["esc".to_string()],
            next_field: vec!["tab".to_string()],
            prev_field: vec!["backtab".to_string()],
            newline: vec!["enter".to_string()],
            bold: vec!["alt+b".to_string()],
            italic: vec!["alt+i".to_string()],
            underline: vec!["alt+u".to_string()],
            code: vec!["alt+c".to_string()],
            quote: vec!["alt+q".to_string()],
            bullet: vec!["alt+l".to_string()],
            numbered: vec!["alt+n".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PopupBindings {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for PopupBindings {
    fn default() -> Self {
        Self {
            confirm: vec!["enter".to_string(), "y".to_string()],
            cancel: vec!["esc".to_string(), "n".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    pub border_default: String,
    pub border_selected: String,
    pub day_header: String,
    pub text_highlight: String,
    pub task_done: String,
    pub task_time: String,
    pub status_ok: String,
    pub status_warn: String,
    pub status_error: String,
    pub feedback: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border_default: "Reset".to_string(),
            border_selected: "Yellow".to_string(),
            day_header: "LightYellow".to_string(),
            text_highlight: "50,50,50".to_string(),
            task_done: "DarkGray".to_string(),
            task_time: "Blue".to_string(),
            status_ok: "Green".to_string(),
            status_warn: "Yellow".to_string(),
            status_error: "Red".to_string(),
            feedback: "LightGreen".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = config_path();

        let mut config = match fs::read_to_string(&config_path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                log::warn!(
                    "event=config_parse status=error path={} error={e}",
                    config_path.display()
                );
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        let changed = config.normalize_paths();
        if (changed || !config_path.exists())
            && let Err(e) = config.save_to_path(&config_path)
        {
            log::warn!(
                "event=config_write status=error path={} error={e}",
                config_path.display()
            );
        }

        config
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Config>(content)
    }

    pub fn save_to_path(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, content)
    }

    fn normalize_paths(&mut self) -> bool {
        let mut changed = false;

        if self.data.data_dir.as_os_str().is_empty() {
            self.data.data_dir = default_data_dir();
            changed = true;
        }
        if self.data.data_dir.is_relative() {
            self.data.data_dir = default_data_dir().join(&self.data.data_dir);
            changed = true;
        }
        if self.data.export_dir.as_os_str().is_empty() {
            self.data.export_dir = default_export_dir();
            changed = true;
        }
        if self.data.export_dir.is_relative() {
            self.data.export_dir = self.data.data_dir.join(&self.data.export_dir);
            changed = true;
        }
        if self.log.dir.as_os_str().is_empty() || self.log.dir.is_relative() {
            self.log.dir = self.data.data_dir.join("logs");
            changed = true;
        }

        changed
    }
}
