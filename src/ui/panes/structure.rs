//! Structure pane: complexity estimate and declared functions

use super::utils::border_style;
use crate::analyzer::StructureReport;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_structure_pane(
    frame: &mut Frame,
    area: Rect,
    report: &StructureReport,
    is_focused: bool,
) {
    let block = Block::default()
        .title(" Structure ")
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    let label = Style::default().fg(DEFAULT_THEME.comment);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("complexity  ", label),
            Span::styled(
                report.complexity.to_string(),
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  (estimate)", label),
        ]),
        Line::from(vec![
            Span::styled("max nesting ", label),
            Span::styled(
                report.max_nesting.to_string(),
                Style::default().fg(DEFAULT_THEME.number),
            ),
        ]),
    ];

    if report.functions.is_empty() {
        lines.push(Line::from(Span::styled("no functions", label)));
    } else {
        lines.push(Line::from(Span::styled("functions", label)));
        lines.extend(report.functions.iter().map(|function| {
            Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    function.name.clone(),
                    Style::default().fg(DEFAULT_THEME.function),
                ),
                Span::styled(format!("  line {}", function.line), label),
            ])
        }));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
