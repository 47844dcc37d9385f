//! Trace viewer state and event loop

use crate::analyzer::StructureReport;
use crate::runner::{RunReport, RunStatus};
use crate::snapshot::{Trace, TraceStep};
use crate::ui::panes::{
    render_scope_pane, render_source_pane, render_status_bar, render_structure_pane,
    ScopeRenderData, SourceRenderData, SourceScrollState, StatusRenderData,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::collections::BTreeSet;
use std::io;
use std::time::{Duration, Instant};

/// Delay between steps while playing
const PLAY_INTERVAL: Duration = Duration::from_millis(600);

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Scope,
    Structure,
}

impl FocusedPane {
    /// Move focus to the next pane (source -> scope -> structure)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Scope,
            FocusedPane::Scope => FocusedPane::Structure,
            FocusedPane::Structure => FocusedPane::Source,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Structure,
            FocusedPane::Scope => FocusedPane::Source,
            FocusedPane::Structure => FocusedPane::Scope,
        }
    }
}

/// Position in a trace of `len` steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCursor {
    position: usize,
    len: usize,
}

impl StepCursor {
    pub fn new(len: usize) -> Self {
        StepCursor { position: 0, len }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position + 1 >= self.len
    }

    /// Move one step forward; false when already at the last step
    pub fn forward(&mut self) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.position += 1;
        true
    }

    /// Move one step back; false when already at the first step
    pub fn backward(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        true
    }

    pub fn to_start(&mut self) {
        self.position = 0;
    }

    pub fn to_end(&mut self) {
        self.position = self.len.saturating_sub(1);
    }
}

/// The trace viewer
pub struct App {
    /// Host program the trace's line numbers refer to
    pub source: String,
    pub capture_lines: BTreeSet<usize>,
    pub trace: Trace,
    pub run_status: RunStatus,
    pub structure: StructureReport,

    pub cursor: StepCursor,
    pub focused_pane: FocusedPane,

    pub source_scroll: SourceScrollState,
    pub scope_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Option<Instant>,
}

impl App {
    pub fn new(
        source: String,
        capture_lines: BTreeSet<usize>,
        report: RunReport,
        structure: StructureReport,
    ) -> Self {
        let RunReport { trace, status } = report;
        App {
            source,
            capture_lines,
            cursor: StepCursor::new(trace.len()),
            status_message: status.to_string(),
            trace,
            run_status: status,
            structure,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::default(),
            scope_scroll: 0,
            should_quit: false,
            is_playing: false,
            last_play_time: Instant::now(),
            last_space_press: None,
        }
    }

    /// Step at the cursor
    pub fn current_step(&self) -> Option<&TraceStep> {
        self.trace.get(self.cursor.position())
    }

    /// Run the viewer until the user quits
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= PLAY_INTERVAL {
                if self.cursor.forward() {
                    self.status_message = "Playing...".to_string();
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Poll with a timeout so playback keeps advancing
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Draw every pane
    pub fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Right column: Scope (top) | Structure (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(columns[1]);

        let step = self.trace.get(self.cursor.position());
        let previous = self
            .cursor
            .position()
            .checked_sub(1)
            .and_then(|index| self.trace.get(index));

        render_source_pane(
            frame,
            columns[0],
            SourceRenderData {
                source: &self.source,
                current_line: step.map_or(0, |s| s.line_number),
                capture_lines: &self.capture_lines,
            },
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        render_scope_pane(
            frame,
            right_rows[0],
            ScopeRenderData { step, previous },
            self.focused_pane == FocusedPane::Scope,
            &mut self.scope_scroll,
        );

        render_structure_pane(
            frame,
            right_rows[1],
            &self.structure,
            self.focused_pane == FocusedPane::Structure,
        );

        render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                current_step: self.cursor.position(),
                total_steps: self.trace.len(),
                run_status: &self.run_status,
                is_playing: self.is_playing,
            },
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c.to_digit(10).unwrap_or(1);
                let stepped = (0..n).take_while(|_| self.cursor.forward()).count();
                self.status_message = format!("Stepped forward {} step(s)", stepped);
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => {
                self.is_playing = false;
                self.status_message = if self.cursor.backward() {
                    "Stepped backward".to_string()
                } else {
                    "Already at the first step".to_string()
                };
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.status_message = if self.cursor.forward() {
                    "Stepped forward".to_string()
                } else {
                    self.end_message()
                };
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Scope => {
                    self.scope_scroll = self.scope_scroll.saturating_sub(1);
                }
                FocusedPane::Structure => {}
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Scope => {
                    self.scope_scroll = self.scope_scroll.saturating_add(1);
                }
                FocusedPane::Structure => {}
            },
            KeyCode::Char(' ') => {
                // 200ms debounce against key repeat
                let debounced = self
                    .last_space_press
                    .is_some_and(|t| t.elapsed() < Duration::from_millis(200));
                if !debounced {
                    self.last_space_press = Some(Instant::now());
                    self.toggle_play();
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.cursor.to_end();
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.cursor.to_start();
                self.status_message = "Jumped to start".to_string();
            }
            _ => {}
        }
    }

    fn toggle_play(&mut self) {
        self.is_playing = !self.is_playing;
        if self.is_playing {
            // Take the first step on the next tick
            self.last_play_time = Instant::now()
                .checked_sub(PLAY_INTERVAL)
                .unwrap_or_else(Instant::now);
            self.status_message = "Playing...".to_string();
        } else {
            self.status_message = "Paused".to_string();
        }
    }

    /// Message for trying to step past the last step
    fn end_message(&self) -> String {
        match &self.run_status {
            RunStatus::Completed => "End of trace".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use serde_json::Map;

    fn app(lines: &[usize], status: RunStatus) -> App {
        let trace: Trace = lines
            .iter()
            .map(|&line| TraceStep::new(line, Map::new()))
            .collect();
        App::new(
            "let a = 1;\nlet b = 2;\nlet c = 3;\n".to_string(),
            BTreeSet::from([1, 2, 3]),
            RunReport::new(trace, status),
            StructureReport::default(),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut cursor = StepCursor::new(2);
        assert!(!cursor.backward());
        assert!(cursor.forward());
        assert!(!cursor.forward());
        assert!(cursor.is_at_end());

        let mut empty = StepCursor::new(0);
        assert!(!empty.forward());
        empty.to_end();
        assert_eq!(empty.position(), 0);
    }

    #[test]
    fn test_navigation_keys() {
        let mut app = app(&[1, 2, 3], RunStatus::Completed);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.current_step().map(|s| s.line_number), Some(2));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.cursor.position(), 2);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.status_message, "End of trace");

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.cursor.position(), 0);
        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.status_message, "Stepped forward 2 step(s)");

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_failed_run_reports_its_message_at_the_end() {
        let status = RunStatus::SimulationError {
            message: "TypeError: x is not a function (line 3)".to_string(),
        };
        let mut app = app(&[1], status);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.status_message, "TypeError: x is not a function (line 3)");
    }

    #[test]
    fn test_render_shows_step_counter() {
        let mut app = app(&[1, 2], RunStatus::Completed);
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Step 1/2"));
        assert!(text.contains("Source"));
    }
}
