//! Helpers shared by the panes: border styling and snapshot value formatting

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
};
use serde_json::Value as Json;

/// Nested containers deeper than this are elided
const MAX_INLINE_DEPTH: usize = 3;

pub(crate) fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    }
}

/// Format a snapshot value as styled spans on one line
pub(crate) fn format_value_styled(value: &Json, depth: usize) -> Vec<Span<'static>> {
    let punct = Style::default().fg(DEFAULT_THEME.comment);

    match value {
        Json::Null => vec![Span::styled("null", Style::default().fg(DEFAULT_THEME.literal))],
        Json::Bool(b) => vec![Span::styled(
            b.to_string(),
            Style::default().fg(DEFAULT_THEME.literal),
        )],
        Json::Number(n) => vec![Span::styled(
            n.to_string(),
            Style::default().fg(DEFAULT_THEME.number),
        )],
        Json::String(s) => vec![Span::styled(
            format!("{:?}", s),
            Style::default().fg(DEFAULT_THEME.string),
        )],
        Json::Array(_) | Json::Object(_) if depth >= MAX_INLINE_DEPTH => {
            let elided = if value.is_array() { "[...]" } else { "{...}" };
            vec![Span::styled(elided, punct)]
        }
        Json::Array(items) => {
            let mut spans = vec![Span::styled("[", punct)];
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(", ", punct));
                }
                spans.extend(format_value_styled(item, depth + 1));
            }
            spans.push(Span::styled("]", punct));
            spans
        }
        Json::Object(fields) => {
            let mut spans = vec![Span::styled("{", punct)];
            for (i, (key, field)) in fields.iter().enumerate() {
                spans.push(Span::styled(if i > 0 { ", " } else { " " }, punct));
                spans.push(Span::styled(
                    format!("{}: ", key),
                    Style::default().fg(DEFAULT_THEME.fg),
                ));
                spans.extend(format_value_styled(field, depth + 1));
            }
            spans.push(Span::styled(if fields.is_empty() { "}" } else { " }" }, punct));
            spans
        }
    }
}

/// Rows of a matrix: an array whose every element is itself an array
pub(crate) fn matrix_rows(value: &Json) -> Option<&[Json]> {
    match value {
        Json::Array(rows) if !rows.is_empty() && rows.iter().all(Json::is_array) => {
            Some(rows.as_slice())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(value: &Json) -> String {
        format_value_styled(value, 0)
            .iter()
            .map(|s| s.content.to_string())
            .collect()
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(text(&json!([1, "a", null])), "[1, \"a\", null]");
        assert_eq!(text(&json!({"x": true})), "{ x: true }");
        assert_eq!(text(&json!({})), "{}");
        assert_eq!(text(&json!([[[[1]]]])), "[[[[...]]]]");
    }

    #[test]
    fn test_matrix_detection() {
        assert_eq!(matrix_rows(&json!([[1, 2], [3, 4]])).map(<[Json]>::len), Some(2));
        assert!(matrix_rows(&json!([1, [2]])).is_none());
        assert!(matrix_rows(&json!([])).is_none());
    }
}
