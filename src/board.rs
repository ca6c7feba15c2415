use crate::models::{Board, Day, Month, Task, Week};

/// Addresses one day of the board the way the UI does: month id, week id and
/// the day's position inside the week.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DayRef {
    pub month_id: String,
    pub week_id: String,
    pub day_index: usize,
}

impl DayRef {
    pub fn new(month_id: &str, week_id: &str, day_index: usize) -> Self {
        Self {
            month_id: month_id.to_string(),
            week_id: week_id.to_string(),
            day_index,
        }
    }
}

pub fn find_month<'a>(board: &'a Board, month_id: &str) -> Option<&'a Month> {
    board.iter().find(|m| m.id == month_id)
}

pub fn find_week<'a>(board: &'a Board, month_id: &str, week_id: &str) -> Option<&'a Week> {
    find_month(board, month_id)?
        .weeks
        .iter()
        .find(|w| w.id == week_id)
}

pub fn find_day<'a>(board: &'a Board, at: &DayRef) -> Option<&'a Day> {
    find_week(board, &at.month_id, &at.week_id)?
        .days
        .get(at.day_index)
}

pub fn find_day_mut<'a>(board: &'a mut Board, at: &DayRef) -> Option<&'a mut Day> {
    board
        .iter_mut()
        .find(|m| m.id == at.month_id)?
        .weeks
        .iter_mut()
        .find(|w| w.id == at.week_id)?
        .days
        .get_mut(at.day_index)
}

pub fn add_task(board: &mut Board, at: &DayRef, task: Task) -> bool {
    match find_day_mut(board, at) {
        Some(day) => {
            day.todos.push(task);
            true
        }
        None => false,
    }
}

pub fn update_task<F>(board: &mut Board, at: &DayRef, task_id: &str, apply: F) -> bool
where
    F: FnOnce(&mut Task),
{
    let Some(task) = find_day_mut(board, at)
        .and_then(|day| day.todos.iter_mut().find(|t| t.id == task_id))
    else {
        return false;
    };
    apply(task);
    true
}

pub fn delete_task(board: &mut Board, at: &DayRef, task_id: &str) -> bool {
    let Some(day) = find_day_mut(board, at) else {
        return false;
    };
    let before = day.todos.len();
    day.todos.retain(|t| t.id != task_id);
    day.todos.len() != before
}

pub fn weekly_notes<'a>(board: &'a Board, month_id: &str, week_id: &str) -> &'a str {
    find_month(board, month_id)
        .and_then(|m| m.weekly_notes.get(week_id))
        .map(String::as_str)
        .unwrap_or("")
}

pub fn set_weekly_notes(board: &mut Board, month_id: &str, week_id: &str, notes: &str) -> bool {
    let Some(month) = board.iter_mut().find(|m| m.id == month_id) else {
        return false;
    };
    month
        .weekly_notes
        .insert(week_id.to_string(), notes.to_string());
    true
}

/// True when no day holds a task and every weekly note is blank.
pub fn is_empty(board: &Board) -> bool {
    board.iter().all(|month| {
        month.weeks.iter().all(|week| {
            week.days.iter().all(|day| day.todos.is_empty())
                && month
                    .weekly_notes
                    .get(&week.id)
                    .is_none_or(|notes| notes.trim().is_empty())
        })
    })
}

pub fn task_count(board: &Board) -> usize {
    board
        .iter()
        .flat_map(|m| m.weeks.iter())
        .flat_map(|w| w.days.iter())
        .map(|d| d.todos.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::generate_months;
    use chrono::NaiveDate;

    fn board() -> Board {
        generate_months(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(), 2)
    }

    fn first_day(board: &Board) -> DayRef {
        DayRef::new(&board[0].id, &board[0].weeks[0].id, 0)
    }

    #[test]
    fn add_update_and_delete_task() {
        let mut board = board();
        let at = first_day(&board);
        let task = Task::new("Draft", "9:00 AM");
        let id = task.id.clone();

        assert!(add_task(&mut board, &at, task));
        assert_eq!(task_count(&board), 1);

        assert!(update_task(&mut board, &at, &id, |t| t.completed = true));
        assert!(find_day(&board, &at).unwrap().todos[0].completed);

        assert!(delete_task(&mut board, &at, &id));
        assert_eq!(task_count(&board), 0);
        assert!(!delete_task(&mut board, &at, &id));
    }

    #[test]
    fn unknown_day_is_rejected() {
        let mut board = board();
        let at = DayRef::new(&board[0].id, &board[0].weeks[0].id, 9);
        assert!(!add_task(&mut board, &at, Task::new("x", "9:00 AM")));
        assert!(find_day(&board, &DayRef::new("nope", "nope", 0)).is_none());
    }

    #[test]
    fn weekly_notes_count_towards_emptiness() {
        let mut board = board();
        assert!(is_empty(&board));

        let month_id = board[0].id.clone();
        let week_id = board[0].weeks[1].id.clone();
        assert!(set_weekly_notes(&mut board, &month_id, &week_id, "   "));
        assert!(is_empty(&board));

        assert!(set_weekly_notes(&mut board, &month_id, &week_id, "Ship it"));
        assert!(!is_empty(&board));
        assert_eq!(weekly_notes(&board, &month_id, &week_id), "Ship it");
    }
}
