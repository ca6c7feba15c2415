use crate::board;
use crate::models::Board;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const STATE_KEY: &str = "productivity-tracker-data";
pub const REMOTE_KEY: &str = "gist-config";

const TOKEN_ENV: &str = "WEEKPLAN_GITHUB_TOKEN";

/// Key-value persistence for the planner state.
pub trait MirrorStore {
    fn load(&self, key: &str) -> io::Result<Option<String>>;
    fn store(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileMirror {
    dir: PathBuf,
}

impl FileMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl MirrorStore for FileMirror {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(path).map(Some)
    }

    fn store(&self, key: &str, value: &str) -> io::Result<()> {
        ensure_dir(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(tmp, path)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Reads and decodes a JSON value. Missing keys and undecodable content both
/// yield `None`; the latter is logged.
pub fn load_json<T: DeserializeOwned>(mirror: &dyn MirrorStore, key: &str) -> Option<T> {
    let raw = match mirror.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            log::warn!("event=mirror_load status=error key={key} error={err}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("event=mirror_parse status=error key={key} error={err}");
            None
        }
    }
}

/// Best-effort write: failures are logged and swallowed.
pub fn store_raw(mirror: &dyn MirrorStore, key: &str, value: &str) -> bool {
    match mirror.store(key, value) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("event=mirror_store status=error key={key} error={err}");
            false
        }
    }
}

#[cfg(test)]
pub fn store_json<T: Serialize>(mirror: &dyn MirrorStore, key: &str, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(raw) => store_raw(mirror, key, &raw),
        Err(err) => {
            log::warn!("event=mirror_serialize status=error key={key} error={err}");
            false
        }
    }
}

/// Remote target for sync: the gist id and the write token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteSettings {
    #[serde(alias = "githubGistId")]
    pub remote_id: String,
    #[serde(alias = "githubToken")]
    pub token: String,
    /// Fallback token from the environment; never written back.
    #[serde(skip)]
    pub env_token: Option<String>,
}

/// Token from `WEEKPLAN_GITHUB_TOKEN`, if set.
pub fn env_token() -> Option<String> {
    std::env::var(TOKEN_ENV).ok()
}

impl RemoteSettings {
    pub fn load(mirror: &dyn MirrorStore) -> Self {
        Self::load_with_env(mirror, env_token())
    }

    pub fn load_with_env(mirror: &dyn MirrorStore, env_token: Option<String>) -> Self {
        let mut settings: RemoteSettings = load_json(mirror, REMOTE_KEY).unwrap_or_default();
        settings.env_token = env_token;
        settings
    }

    pub fn save(&self, mirror: &dyn MirrorStore) -> io::Result<()> {
        let raw = serde_json::to_string(self).map_err(io::Error::other)?;
        mirror.store(REMOTE_KEY, &raw)
    }

    pub fn remote_id(&self) -> Option<&str> {
        let id = self.remote_id.trim();
        (!id.is_empty()).then_some(id)
    }

    /// Stored token, or the environment token when none is stored.
    pub fn token(&self) -> Option<&str> {
        let token = self.token.trim();
        if !token.is_empty() {
            return Some(token);
        }
        self.env_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.remote_id().is_some() && self.token().is_some()
    }

    /// Token with everything but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let Some(token) = self.token() else {
            return "(none)".to_string();
        };
        let chars: Vec<char> = token.chars().collect();
        let visible = chars.len().min(4);
        let tail: String = chars[chars.len() - visible..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - visible), tail)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageInfo {
    pub size_kb: String,
    pub items: usize,
}

pub fn storage_info(mirror: &dyn MirrorStore) -> StorageInfo {
    let empty = StorageInfo {
        size_kb: "0".to_string(),
        items: 0,
    };
    let raw = match mirror.load(STATE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return empty,
        Err(err) => {
            log::warn!("event=storage_info status=error error={err}");
            return empty;
        }
    };
    let items = serde_json::from_str::<Board>(&raw)
        .map(|b| board::task_count(&b))
        .unwrap_or(0);
    StorageInfo {
        size_kb: format!("{:.2}", raw.len() as f64 / 1024.0),
        items,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, generate_months};
    use chrono::NaiveDate;

    #[test]
    fn file_mirror_stores_loads_and_removes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mirror = FileMirror::new(dir.path().join("nested"));

        assert_eq!(mirror.load(STATE_KEY).expect("load"), None);
        mirror.store(STATE_KEY, "[]").expect("store");
        assert_eq!(mirror.load(STATE_KEY).expect("load"), Some("[]".to_string()));
        assert!(mirror.path_for(STATE_KEY).ends_with("productivity-tracker-data.json"));

        mirror.remove(STATE_KEY).expect("remove");
        assert_eq!(mirror.load(STATE_KEY).expect("load"), None);
        mirror.remove(STATE_KEY).expect("remove twice");
    }

    #[test]
    fn load_json_ignores_corrupt_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mirror = FileMirror::new(dir.path());
        mirror.store(STATE_KEY, "{not json").expect("store");
        assert!(load_json::<Board>(&mirror, STATE_KEY).is_none());
    }

    #[test]
    fn remote_settings_accept_legacy_field_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mirror = FileMirror::new(dir.path());
        mirror
            .store(REMOTE_KEY, r#"{"githubGistId":"abc123","githubToken":"ghp_secret"}"#)
            .expect("store");

        let settings = RemoteSettings::load_with_env(&mirror, None);
        assert_eq!(settings.remote_id(), Some("abc123"));
        assert_eq!(settings.token(), Some("ghp_secret"));
        assert!(settings.is_configured());

        settings.save(&mirror).expect("save");
        let raw = mirror.load(REMOTE_KEY).expect("load").expect("present");
        assert!(raw.contains("\"remoteId\":\"abc123\""));
    }

    #[test]
    fn environment_token_is_used_but_never_stored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mirror = FileMirror::new(dir.path());
        mirror.store(REMOTE_KEY, r#"{"remoteId":"abc"}"#).expect("store");

        let settings = RemoteSettings::load_with_env(&mirror, Some("ghp_env".to_string()));
        assert_eq!(settings.token(), Some("ghp_env"));
        assert!(settings.is_configured());
        assert_eq!(settings.token, "");

        settings.save(&mirror).expect("save");
        let raw = mirror.load(REMOTE_KEY).expect("load").expect("present");
        assert!(!raw.contains("ghp_env"));

        let stored = RemoteSettings {
            token: "ghp_stored".to_string(),
            ..settings
        };
        assert_eq!(stored.token(), Some("ghp_stored"));
    }

    #[test]
    fn blank_remote_fields_count_as_missing() {
        let settings = RemoteSettings {
            remote_id: "  ".to_string(),
            token: "tok".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.remote_id(), None);
        assert!(!settings.is_configured());
    }

    #[test]
    fn masked_token_keeps_last_four_characters() {
        let settings = RemoteSettings {
            remote_id: "id".to_string(),
            token: "ghp_abcdef1234".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.masked_token(), "**********1234");
        assert_eq!(RemoteSettings::default().masked_token(), "(none)");
    }

    #[test]
    fn storage_info_counts_tasks_and_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mirror = FileMirror::new(dir.path());
        assert_eq!(storage_info(&mirror).items, 0);

        let mut board = generate_months(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(), 1);
        board[0].weeks[0].days[0].todos.push(Task::new("a", "9:00 AM"));
        board[0].weeks[1].days[3].todos.push(Task::new("b", "9:00 AM"));
        assert!(store_json(&mirror, STATE_KEY, &board));

        let info = storage_info(&mirror);
        assert_eq!(info.items, 2);
        assert_ne!(info.size_kb, "0");
    }

    #[test]
    fn store_raw_swallows_write_failures() {
        assert!(!store_raw(&testing::FullMirror, STATE_KEY, "[]"));
    }
}
