use crate::markdown::{Inline, LineKind, classify_line, inline_segments};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Helper function to calculate centered popup position
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Renders one line of notes markdown as styled spans, using the same markers
/// as the HTML preview.
pub fn markdown_line(text: &str) -> Line<'static> {
    let marker_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);

    let mut spans = Vec::new();
    let (body, body_style) = match classify_line(text) {
        LineKind::Rule => {
            return Line::from(Span::styled("─".repeat(24), marker_style));
        }
        LineKind::Quote(rest) => {
            spans.push(Span::styled("▎ ", marker_style));
            (rest, Style::default().add_modifier(Modifier::ITALIC))
        }
        LineKind::Bullet(rest) => {
            spans.push(Span::styled("• ", marker_style));
            (rest, Style::default())
        }
        LineKind::Numbered { marker, text } => {
            spans.push(Span::styled(format!("{marker} "), marker_style));
            (text, Style::default())
        }
        LineKind::Plain(rest) => (rest, Style::default()),
    };

    for (kind, segment) in inline_segments(body) {
        let style = match kind {
            Inline::Text => body_style,
            Inline::Bold => body_style.add_modifier(Modifier::BOLD),
            Inline::Italic => body_style.add_modifier(Modifier::ITALIC),
            Inline::Underline => body_style.add_modifier(Modifier::UNDERLINED),
            Inline::Code => body_style.fg(Color::Yellow),
        };
        spans.push(Span::styled(segment, style));
    }
    Line::from(spans)
}

pub fn markdown_lines(text: &str) -> Vec<Line<'static>> {
    text.split('\n').map(markdown_line).collect()
}

/// Cuts `text` to `max_width` display columns, ending with `…` when shortened.
pub fn truncate(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

/// Wraps plain text to `width` columns, keeping explicit line breaks.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    text.split('\n')
        .flat_map(|line| {
            let wrapped = textwrap::wrap(line, width);
            if wrapped.is_empty() {
                vec![String::new()]
            } else {
                wrapped.into_iter().map(|part| part.into_owned()).collect()
            }
        })
        .collect()
}

pub fn fmt_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        return "-".to_string();
    }
    keys.join(" / ")
}
