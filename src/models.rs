use chrono::{Datelike, Local, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_TASK_TEXT: &str = "New task";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputMode {
    Navigate,
    Editing,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum EditorTarget {
    Task,
    WeeklyNotes,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TaskField {
    Text,
    Time,
    Url,
    Notes,
}

impl TaskField {
    pub fn all() -> [TaskField; 4] {
        [
            TaskField::Text,
            TaskField::Time,
            TaskField::Url,
            TaskField::Notes,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskField::Text => "Task",
            TaskField::Time => "Time",
            TaskField::Url => "URL(s)",
            TaskField::Notes => "Notes",
        }
    }

    pub fn next(&self) -> TaskField {
        match self {
            TaskField::Text => TaskField::Time,
            TaskField::Time => TaskField::Url,
            TaskField::Url => TaskField::Notes,
            TaskField::Notes => TaskField::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Task {
    pub fn new(text: &str, time: &str) -> Self {
        Self {
            id: new_task_id(),
            text: text.to_string(),
            completed: false,
            time: time.to_string(),
            url: Some(String::new()),
            notes: Some(String::new()),
        }
    }

    /// Copy of this task under a freshly generated identifier.
    pub fn duplicate(&self) -> Self {
        Self {
            id: new_task_id(),
            ..self.clone()
        }
    }

    pub fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    /// Splits the free-text url field into individual links.
    ///
    /// Entries may be separated by whitespace, commas, or a literal `\n` escape
    /// left behind by pasted JSON.
    pub fn urls(&self) -> Vec<String> {
        let Some(raw) = self.url.as_deref() else {
            return Vec::new();
        };
        raw.replace("\\n", "\n")
            .split(|c: char| c.is_whitespace() || c == ',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub date: String,
    pub full_date: String,
    #[serde(default)]
    pub todos: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub days: Vec<Day>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Month {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub weeks: Vec<Week>,
    #[serde(default)]
    pub weekly_notes: BTreeMap<String, String>,
}

/// The whole planner tree; the unit of persistence and of remote sync.
pub type Board = Vec<Month>;

/// Time-sortable identifier: millisecond timestamp followed by 128 random bits.
pub fn new_task_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0);
    format!("{:011x}-{:032x}", millis, rand::random::<u128>())
}

/// Builds `count` consecutive calendar months starting at the month of `start`.
pub fn generate_months(start: NaiveDate, count: usize) -> Board {
    let Some(first) = start.with_day(1) else {
        return Vec::new();
    };

    let mut months = Vec::with_capacity(count);
    for offset in 0..count {
        let Some(month_start) = first.checked_add_months(Months::new(offset as u32)) else {
            break;
        };
        months.push(build_month(month_start));
    }
    months
}

pub fn default_board(months: usize) -> Board {
    generate_months(Local::now().date_naive(), months.max(1))
}

fn build_month(month_start: NaiveDate) -> Month {
    let name = month_start.format("%B").to_string();
    let id = format!("{}-{}", name.to_lowercase(), month_start.year());
    let days_in_month = days_in_month(month_start);

    let mut weeks = Vec::new();
    let mut current: Vec<Day> = Vec::new();
    for day in 1..=days_in_month {
        current.push(Day {
            date: day.to_string(),
            full_date: format!("{name} {day}"),
            todos: Vec::new(),
        });

        if current.len() == 7 || day == days_in_month {
            let number = weeks.len() + 1;
            weeks.push(Week {
                id: format!("{id}-week-{number}"),
                name: format!("Week {number}"),
                days: std::mem::take(&mut current),
            });
        }
    }

    Month {
        id,
        name,
        weeks,
        weekly_notes: BTreeMap::new(),
    }
}

fn days_in_month(month_start: NaiveDate) -> u32 {
    month_start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
