//! The small markdown subset used by weekly and task notes.
//!
//! `render_html` is a fixed, ordered list of regex substitutions. It does not
//! nest or escape, so adjacent or overlapping markers can come out wrong;
//! notes are short and this is good enough for them.

use regex::Regex;
use std::sync::OnceLock;

struct Rule {
    pattern: &'static str,
    replacement: &'static str,
}

// Bold must run before italic or `*` would eat half of every `**`.
const RULES: &[Rule] = &[
    Rule {
        pattern: r"\*\*(.*?)\*\*",
        replacement: "<strong>${1}</strong>",
    },
    Rule {
        pattern: r"\*(.*?)\*",
        replacement: "<em>${1}</em>",
    },
    Rule {
        pattern: r"__(.*?)__",
        replacement: "<u>${1}</u>",
    },
    Rule {
        pattern: r"`(.*?)`",
        replacement: "<code>${1}</code>",
    },
    Rule {
        pattern: r"(?m)^(?:>|&gt;) (.*)$",
        replacement: "<blockquote>${1}</blockquote>",
    },
    Rule {
        pattern: r"(?m)^- (.*)$",
        replacement: "<li>• ${1}</li>",
    },
    Rule {
        pattern: r"(?m)^\d+\.\s(.*)$",
        replacement: "<li>${1}</li>",
    },
    Rule {
        pattern: r"---",
        replacement: "<hr />",
    },
    Rule {
        pattern: r"\n",
        replacement: "<br>",
    },
];

fn compiled_rules() -> &'static [(Regex, &'static str)] {
    static COMPILED: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .filter_map(|rule| match Regex::new(rule.pattern) {
                Ok(re) => Some((re, rule.replacement)),
                Err(err) => {
                    log::error!("event=markdown_rule status=invalid pattern={} error={err}", rule.pattern);
                    None
                }
            })
            .collect()
    })
}

pub fn render_html(text: &str) -> String {
    compiled_rules()
        .iter()
        .fold(text.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inline {
    Text,
    Bold,
    Italic,
    Underline,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Plain(&'a str),
    Quote(&'a str),
    Bullet(&'a str),
    Numbered { marker: &'a str, text: &'a str },
    Rule,
}

fn inline_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*|\*(.*?)\*|__(.*?)__|`(.*?)`").ok())
        .as_ref()
}

fn numbered_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+\.)\s(.*)$").ok()).as_ref()
}

/// Classifies one line by its block-level marker, in the same precedence as
/// `render_html`.
pub fn classify_line(line: &str) -> LineKind<'_> {
    if line.trim() == "---" {
        return LineKind::Rule;
    }
    if let Some(rest) = line.strip_prefix("> ").or_else(|| line.strip_prefix("&gt; ")) {
        return LineKind::Quote(rest);
    }
    if let Some(rest) = line.strip_prefix("- ") {
        return LineKind::Bullet(rest);
    }
    if let Some(caps) = numbered_regex().and_then(|re| re.captures(line))
        && let (Some(marker), Some(text)) = (caps.get(1), caps.get(2))
    {
        return LineKind::Numbered {
            marker: marker.as_str(),
            text: text.as_str(),
        };
    }
    LineKind::Plain(line)
}

/// Splits a single line into styled runs. At any position bold wins over
/// italic, matching `render_html`.
pub fn inline_segments(line: &str) -> Vec<(Inline, String)> {
    let Some(re) = inline_regex() else {
        return vec![(Inline::Text, line.to_string())];
    };

    let mut segments = Vec::new();
    let mut last = 0;
    for caps in re.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            segments.push((Inline::Text, line[last..whole.start()].to_string()));
        }
        let styled = [Inline::Bold, Inline::Italic, Inline::Underline, Inline::Code]
            .into_iter()
            .zip(1..=4)
            .find_map(|(kind, group)| caps.get(group).map(|m| (kind, m.as_str().to_string())));
        if let Some(styled) = styled {
            segments.push(styled);
        }
        last = whole.end();
    }
    if last < line.len() {
        segments.push((Inline::Text, line[last..].to_string()));
    }
    segments
}
