//! Terminal trace viewer built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: viewer state, the step cursor, keyboard event loop and pane focus
//! - **[`panes`]**: stateless render functions for each visible pane (source,
//!   scope, structure, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point is [`App`]: construct it from a finished
//! [`RunReport`](crate::runner::RunReport) and call [`App::run`].
//!
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
