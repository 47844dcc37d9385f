//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Host program with the current step's line highlighted
//! - [`scope`]: Bindings captured at the current step
//! - [`structure`]: Complexity estimate and declared functions
//! - [`status`]: Status bar with keybindings and run state
//! - `utils`: Border styling and snapshot value formatting
//!
//! Each pane module exports a `render_*` function that draws into a given
//! area from borrowed data; panes hold no state beyond scroll offsets owned
//! by the [`App`](crate::ui::App).

mod utils;

pub mod scope;
pub mod source;
pub mod status;
pub mod structure;

pub use scope::{render_scope_pane, ScopeRenderData};
pub use source::{render_source_pane, SourceRenderData, SourceScrollState};
pub use status::{render_status_bar, StatusRenderData};
pub use structure::render_structure_pane;
