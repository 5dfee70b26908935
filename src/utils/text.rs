// Text processing utilities

use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// HTML post bodies
pub mod html {
    /// Convert an HTML fragment to readable plain text.
    ///
    /// The fragment goes through markdown so that paragraphs, line breaks and
    /// list items keep their shape; runs of blank lines are collapsed.
    pub fn to_plain_text(html: &str) -> String {
        let markdown = html2md::parse_html(html);

        let mut out = String::with_capacity(markdown.len());
        let mut blank_run = 0;
        for line in markdown.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                blank_run += 1;
                if blank_run > 1 || out.is_empty() {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            out.push_str(&unescape(line));
            out.push('\n');
        }

        out.trim_end().to_string()
    }

    /// Undo the escaping html2md applies to markdown punctuation
    fn unescape(line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(&next) = chars.peek() {
                    if "\\`*_{}[]()#+-.!<>|~".contains(next) {
                        out.push(next);
                        chars.next();
                        continue;
                    }
                }
            }
            out.push(c);
        }
        out
    }
}

/// String and text manipulation utilities
pub mod string {
    use super::*;

    /// Truncate text to a display width, ending with an ellipsis when cut
    pub fn truncate(text: &str, max_width: usize) -> String {
        if text.width() <= max_width {
            return text.to_string();
        }
        if max_width == 0 {
            return String::new();
        }

        let mut out = String::new();
        let mut width = 0;
        for c in text.chars() {
            let char_width = c.width().unwrap_or(0);
            if width + char_width > max_width - 1 {
                break;
            }
            out.push(c);
            width += char_width;
        }
        out.push('…');
        out
    }

    /// Word wrap text to a display width. Explicit newlines are kept.
    pub fn word_wrap(text: &str, width: usize) -> Vec<String> {
        if width == 0 {
            return vec![text.to_string()];
        }

        text.lines()
            .flat_map(|line| {
                if line.trim().is_empty() {
                    vec![String::new()]
                } else {
                    textwrap::wrap(line, width)
                        .into_iter()
                        .map(|part| part.into_owned())
                        .collect()
                }
            })
            .collect()
    }

    /// Clean and normalize whitespace
    pub fn normalize_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Formatting utilities
pub mod format {
    use super::*;

    /// Short age of a timestamp relative to `now`, e.g. "5m ago"
    pub fn relative_time(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(time);
        if elapsed.num_seconds() < 60 {
            "just now".to_string()
        } else if elapsed.num_minutes() < 60 {
            format!("{}m ago", elapsed.num_minutes())
        } else if elapsed.num_hours() < 24 {
            format!("{}h ago", elapsed.num_hours())
        } else if elapsed.num_days() < 30 {
            format!("{}d ago", elapsed.num_days())
        } else {
            time.format("%Y-%m-%d").to_string()
        }
    }

    /// "1 post", "3 posts"
    pub fn count(n: u64, singular: &str, plural: &str) -> String {
        if n == 1 {
            format!("{} {}", n, singular)
        } else {
            format!("{} {}", n, plural)
        }
    }
}
