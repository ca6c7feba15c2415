use crate::config::Theme;
use crate::sync::SyncStatus;
use crate::ui::color_parser::parse_color;
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct ThemeTokens {
    pub border_default: Color,
    pub border_selected: Color,
    pub day_header: Color,
    pub highlight: Color,
    pub task_done: Color,
    pub task_time: Color,
    pub status_ok: Color,
    pub status_warn: Color,
    pub status_error: Color,
    pub feedback: Color,
    pub muted: Color,
}

impl ThemeTokens {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            border_default: parse_color(&theme.border_default),
            border_selected: parse_color(&theme.border_selected),
            day_header: parse_color(&theme.day_header),
            highlight: parse_color(&theme.text_highlight),
            task_done: parse_color(&theme.task_done),
            task_time: parse_color(&theme.task_time),
            status_ok: parse_color(&theme.status_ok),
            status_warn: parse_color(&theme.status_warn),
            status_error: parse_color(&theme.status_error),
            feedback: parse_color(&theme.feedback),
            muted: Color::DarkGray,
        }
    }

    /// Indicator color for the sync status in the status bar.
    pub fn status_color(&self, status: &SyncStatus) -> Color {
        match status {
            SyncStatus::UpToDate | SyncStatus::SavedAt(_) | SyncStatus::ReadyToSync => {
                self.status_ok
            }
            SyncStatus::UnsavedChanges | SyncStatus::FetchRequired | SyncStatus::Loading => {
                self.status_warn
            }
            SyncStatus::NotConfigured => self.muted,
        }
    }
}
