//! Scope pane: the bindings captured at the current step
//!
//! Each binding is shown as `name = value`. Bindings whose value differs from
//! the previous step are highlighted, and matrices (arrays of arrays) are laid
//! out one row per line so their cells line up.

use super::utils::{border_style, format_value_styled, matrix_rows};
use crate::snapshot::TraceStep;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Data needed to render the scope pane
pub struct ScopeRenderData<'a> {
    pub step: Option<&'a TraceStep>,
    pub previous: Option<&'a TraceStep>,
}

/// Render the scope pane
pub fn render_scope_pane(
    frame: &mut Frame,
    area: Rect,
    data: ScopeRenderData,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let title = match data.step {
        Some(step) => format!(" Scope (line {}) ", step.line_number),
        None => " Scope ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    let Some(step) = data.step.filter(|step| !step.scope.is_empty()) else {
        let paragraph = Paragraph::new("(no bindings)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    };

    let lines = binding_lines(step, data.previous);

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    *scroll_offset = (*scroll_offset).min(lines.len().saturating_sub(visible_height));

    let items: Vec<ListItem> = lines
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(ListItem::new)
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

/// One or more display lines per binding, in snapshot key order
fn binding_lines(step: &TraceStep, previous: Option<&TraceStep>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (name, value) in &step.scope {
        let changed = previous.is_some_and(|prev| prev.get(name) != Some(value));
        let name_style = if changed {
            Style::default()
                .fg(DEFAULT_THEME.changed)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DEFAULT_THEME.fg)
        };
        let mut spans = vec![
            Span::styled(name.clone(), name_style),
            Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
        ];

        match matrix_rows(value) {
            Some(rows) => {
                spans.push(Span::styled(
                    format!("{}×{}", rows.len(), widest_row(rows)),
                    Style::default().fg(DEFAULT_THEME.comment),
                ));
                lines.push(Line::from(spans));
                for row in rows {
                    let mut row_spans = vec![Span::raw("    ")];
                    row_spans.extend(format_value_styled(row, 1));
                    lines.push(Line::from(row_spans));
                }
            }
            None => {
                spans.extend(format_value_styled(value, 0));
                lines.push(Line::from(spans));
            }
        }
    }
    lines
}

fn widest_row(rows: &[serde_json::Value]) -> usize {
    rows.iter()
        .filter_map(|row| row.as_array().map(Vec::len))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn step(line: usize, bindings: serde_json::Value) -> TraceStep {
        let scope: Map<String, serde_json::Value> = match bindings {
            serde_json::Value::Object(map) => map,
            _ => Map::new(),
        };
        TraceStep::new(line, scope)
    }

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_matrix_gets_one_line_per_row() {
        let current = step(2, json!({"grid": [[1, 2], [3, 4]], "n": 2}));
        let lines = binding_lines(&current, None);
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, vec!["grid = 2×2", "    [1, 2]", "    [3, 4]", "n = 2"]);
    }

    #[test]
    fn test_changed_bindings_are_highlighted() {
        let before = step(1, json!({"a": 1, "b": 1}));
        let after = step(2, json!({"a": 1, "b": 2}));
        let lines = binding_lines(&after, Some(&before));
        assert_eq!(lines[0].spans[0].style.fg, Some(DEFAULT_THEME.fg));
        assert_eq!(lines[1].spans[0].style.fg, Some(DEFAULT_THEME.changed));
    }
}
