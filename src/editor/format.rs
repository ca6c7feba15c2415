use tui_textarea::{CursorMove, TextArea};

/// Inserts a newline and repeats the current line's list marker. An empty
/// list item ends the list instead.
pub(crate) fn insert_newline_continuing_list(textarea: &mut TextArea) {
    let (row, _) = textarea.cursor();
    let current_line = textarea.lines().get(row).map(|s| s.as_str()).unwrap_or("");

    match list_continuation(current_line) {
        Continuation::Marker(marker) => {
            textarea.insert_newline();
            textarea.insert_str(marker);
        }
        Continuation::EndList => {
            textarea.move_cursor(CursorMove::End);
            textarea.delete_line_by_head();
        }
        Continuation::None => textarea.insert_newline(),
    }
}

/// Wraps the selection in `marker` on both sides, or inserts an empty pair
/// with the cursor between the markers.
pub(crate) fn wrap_inline(textarea: &mut TextArea, marker: &str) {
    if textarea.is_selecting() && textarea.cut() {
        let selected = textarea.yank_text();
        textarea.insert_str(format!("{marker}{selected}{marker}"));
        return;
    }

    textarea.insert_str(format!("{marker}{marker}"));
    for _ in 0..marker.chars().count() {
        textarea.move_cursor(CursorMove::Back);
    }
}

/// Puts `prefix` at the start of the cursor line unless it is already there.
pub(crate) fn prefix_line(textarea: &mut TextArea, prefix: &str) {
    let (row, col) = textarea.cursor();
    let current_line = textarea.lines().get(row).map(|s| s.as_str()).unwrap_or("");
    if current_line.starts_with(prefix) {
        return;
    }

    textarea.move_cursor(CursorMove::Head);
    textarea.insert_str(prefix);
    textarea.move_cursor(CursorMove::Jump(
        row as u16,
        (col + prefix.chars().count()) as u16,
    ));
}

#[derive(Debug, PartialEq, Eq)]
enum Continuation {
    Marker(String),
    EndList,
    None,
}

fn list_continuation(line: &str) -> Continuation {
    if let Some(content) = line.strip_prefix("- ") {
        return if content.trim().is_empty() {
            Continuation::EndList
        } else {
            Continuation::Marker("- ".to_string())
        };
    }

    if let Some((next_marker, content)) = ordered_list_next_marker(line) {
        return if content.trim().is_empty() {
            Continuation::EndList
        } else {
            Continuation::Marker(next_marker)
        };
    }

    Continuation::None
}

fn ordered_list_next_marker(line: &str) -> Option<(String, &str)> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    let number: usize = line[..digits].parse().ok()?;
    Some((format!("{}. ", number + 1), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textarea_at_end(lines: &[&str]) -> TextArea<'static> {
        let mut textarea = TextArea::from(lines.iter().map(|l| l.to_string()).collect::<Vec<_>>());
        textarea.move_cursor(CursorMove::Bottom);
        textarea.move_cursor(CursorMove::End);
        textarea
    }

    #[test]
    fn list_continuation_follows_marker_kind() {
        assert_eq!(
            list_continuation("- milk"),
            Continuation::Marker("- ".to_string())
        );
        assert_eq!(
            list_continuation("9. nine"),
            Continuation::Marker("10. ".to_string())
        );
        assert_eq!(list_continuation("- "), Continuation::EndList);
        assert_eq!(list_continuation("plain"), Continuation::None);
        assert_eq!(list_continuation("3.no space"), Continuation::None);
    }

    #[test]
    fn newline_continues_bullets() {
        let mut textarea = textarea_at_end(&["- one"]);
        insert_newline_continuing_list(&mut textarea);
        assert_eq!(textarea.lines(), ["- one", "- "]);
    }

    #[test]
    fn newline_on_empty_item_ends_list() {
        let mut textarea = textarea_at_end(&["- one", "- "]);
        insert_newline_continuing_list(&mut textarea);
        assert_eq!(textarea.lines(), ["- one", ""]);
    }

    #[test]
    fn wrap_inline_inserts_pair_around_cursor() {
        let mut textarea = textarea_at_end(&["say "]);
        wrap_inline(&mut textarea, "**");
        textarea.insert_str("hi");
        assert_eq!(textarea.lines(), ["say **hi**"]);
    }

    #[test]
    fn prefix_line_is_idempotent() {
        let mut textarea = textarea_at_end(&["quote me"]);
        prefix_line(&mut textarea, "> ");
        prefix_line(&mut textarea, "> ");
        assert_eq!(textarea.lines(), ["> quote me"]);
        assert_eq!(textarea.cursor(), (0, 10));
    }
}
