use crate::board::{self, DayRef};
use crate::models::{Board, Day, Task};
use chrono::{DateTime, Duration, Local};
use std::collections::HashMap;

/// Tasks copied from one day, held until pasted elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct CopiedDay {
    pub tasks: Vec<Task>,
    pub source_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PastePlan {
    /// Nothing has been copied.
    Disabled,
    /// The target already has tasks and would lose them.
    NeedsConfirmation,
    Ready,
}

#[derive(Debug, Default)]
pub struct DayClipboard {
    copied: Option<CopiedDay>,
}

impl DayClipboard {
    pub fn copied(&self) -> Option<&CopiedDay> {
        self.copied.as_ref()
    }

    pub fn can_paste(&self) -> bool {
        self.copied.is_some()
    }

    /// Copies the day's tasks. Empty days are ignored and leave any earlier
    /// copy in place.
    pub fn copy(&mut self, day: &Day) -> bool {
        if day.todos.is_empty() {
            return false;
        }
        self.copied = Some(CopiedDay {
            tasks: day.todos.clone(),
            source_date: day.full_date.clone(),
        });
        true
    }

    pub fn plan_paste(&self, target: &Day) -> PastePlan {
        if !self.can_paste() {
            PastePlan::Disabled
        } else if target.todos.is_empty() {
            PastePlan::Ready
        } else {
            PastePlan::NeedsConfirmation
        }
    }

    /// Replaces the target's tasks with fresh-id copies of the clipboard.
    /// Returns the number of tasks pasted.
    pub fn paste_into(&self, target: &mut Day) -> Option<usize> {
        let copied = self.copied.as_ref()?;
        target.todos = copied.tasks.iter().map(Task::duplicate).collect();
        Some(target.todos.len())
    }

    pub fn paste(&self, board: &mut Board, at: &DayRef) -> Option<usize> {
        let day = board::find_day_mut(board, at)?;
        self.paste_into(day)
    }

    pub fn describe(&self) -> String {
        match &self.copied {
            Some(copied) => format!(
                "Paste {} task(s) from {}",
                copied.tasks.len(),
                copied.source_date
            ),
            None => "No tasks copied to paste".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackKind {
    Copy,
    Paste,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedbackKey {
    pub kind: FeedbackKind,
    pub day: DayRef,
}

/// Short-lived confirmation marks shown next to a day after copy or paste.
#[derive(Debug)]
pub struct ButtonFeedback {
    duration: Duration,
    active: HashMap<FeedbackKey, DateTime<Local>>,
}

impl ButtonFeedback {
    pub fn new(millis: u64) -> Self {
        Self {
            duration: Duration::milliseconds(millis.min(i64::MAX as u64) as i64),
            active: HashMap::new(),
        }
    }

    pub fn show(&mut self, kind: FeedbackKind, day: DayRef) {
        self.show_at(kind, day, Local::now());
    }

    fn show_at(&mut self, kind: FeedbackKind, day: DayRef, now: DateTime<Local>) {
        self.active
            .insert(FeedbackKey { kind, day }, now + self.duration);
    }

    pub fn is_active(&self, kind: FeedbackKind, day: &DayRef) -> bool {
        self.active.contains_key(&FeedbackKey {
            kind,
            day: day.clone(),
        })
    }

    pub fn expire(&mut self) {
        self.expire_at(Local::now());
    }

    fn expire_at(&mut self, now: DateTime<Local>) {
        self.active.retain(|_, expiry| *expiry > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(label: &str, texts: &[&str]) -> Day {
        Day {
            date: "1".to_string(),
            full_date: label.to_string(),
            todos: texts.iter().map(|t| Task::new(t, "9:00 AM")).collect(),
        }
    }

    #[test]
    fn copy_ignores_empty_days() {
        let mut clipboard = DayClipboard::default();
        assert!(!clipboard.copy(&day("July 1", &[])));
        assert!(!clipboard.can_paste());

        assert!(clipboard.copy(&day("July 1", &["a"])));
        assert!(!clipboard.copy(&day("July 2", &[])));
        assert_eq!(clipboard.copied().unwrap().source_date, "July 1");
    }

    #[test]
    fn paste_into_empty_day_assigns_fresh_ids() {
        let source = day("July 1", &["A1", "A2"]);
        let mut target = day("July 2", &[]);
        let mut clipboard = DayClipboard::default();
        clipboard.copy(&source);

        assert_eq!(clipboard.plan_paste(&target), PastePlan::Ready);
        assert_eq!(clipboard.paste_into(&mut target), Some(2));

        assert_eq!(target.todos.len(), 2);
        for (pasted, original) in target.todos.iter().zip(&source.todos) {
            assert_eq!(pasted.text, original.text);
            assert_ne!(pasted.id, original.id);
        }
        assert_eq!(source.todos.len(), 2);
        assert_eq!(source.todos[0].text, "A1");
    }

    #[test]
    fn paste_over_existing_tasks_needs_confirmation_and_replaces() {
        let mut clipboard = DayClipboard::default();
        let mut target = day("July 2", &["old"]);
        assert_eq!(clipboard.plan_paste(&target), PastePlan::Disabled);
        assert_eq!(clipboard.paste_into(&mut target), None);

        clipboard.copy(&day("July 1", &["new"]));
        assert_eq!(clipboard.plan_paste(&target), PastePlan::NeedsConfirmation);
        clipboard.paste_into(&mut target);
        assert_eq!(target.todos.len(), 1);
        assert_eq!(target.todos[0].text, "new");
    }

    #[test]
    fn pasting_twice_never_shares_ids() {
        let mut clipboard = DayClipboard::default();
        clipboard.copy(&day("July 1", &["a"]));
        let mut first = day("July 2", &[]);
        let mut second = day("July 3", &[]);
        clipboard.paste_into(&mut first);
        clipboard.paste_into(&mut second);
        assert_ne!(first.todos[0].id, second.todos[0].id);
    }

    #[test]
    fn describe_mentions_source_date() {
        let mut clipboard = DayClipboard::default();
        assert_eq!(clipboard.describe(), "No tasks copied to paste");
        clipboard.copy(&day("July 1", &["a", "b"]));
        assert_eq!(clipboard.describe(), "Paste 2 task(s) from July 1");
    }

    #[test]
    fn feedback_expires_after_duration() {
        let mut feedback = ButtonFeedback::new(800);
        let at = DayRef::new("july-2025", "july-2025-week-1", 2);
        let now = Local::now();
        feedback.show_at(FeedbackKind::Copy, at.clone(), now);

        assert!(feedback.is_active(FeedbackKind::Copy, &at));
        assert!(!feedback.is_active(FeedbackKind::Paste, &at));

        feedback.expire_at(now + Duration::milliseconds(500));
        assert!(feedback.is_active(FeedbackKind::Copy, &at));
        feedback.expire_at(now + Duration::milliseconds(800));
        assert!(!feedback.is_active(FeedbackKind::Copy, &at));
    }
}
