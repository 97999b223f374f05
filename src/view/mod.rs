//! Terminal rendering for the presentation layer.

mod history_panel;
mod result_view;

pub use history_panel::render_history;
pub use result_view::{render_result, MAX_SUGGESTIONS_SHOWN};
