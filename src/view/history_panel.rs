//! Step navigator listing the original result and every round.

use crate::analyzer::SearchType;
use crate::commands::SessionSnapshot;

/// Render `Original`, `Step 1`, ... with the active entry bracketed.
///
/// Returns an empty string while no rounds exist, as there is nothing to
/// navigate between.
pub fn render_history(snapshot: &SessionSnapshot) -> String {
    if snapshot.steps.len() <= 1 {
        return String::new();
    }

    let entries: Vec<String> = snapshot
        .steps
        .iter()
        .enumerate()
        .map(|(position, step)| {
            let mut entry = step.label.clone();
            match step.search_type {
                Some(SearchType::Focus) => entry.push_str(" (focus)"),
                Some(SearchType::Exclude) => entry.push_str(" (exclude)"),
                None => {}
            }
            if !step.success {
                entry.push_str(" !");
            }
            // `back 0` is the original.
            let key = format!("back {}", position);
            if step.active {
                format!("[{}]  <{}>", entry, key)
            } else {
                format!(" {}   <{}>", entry, key)
            }
        })
        .collect();

    format!("Re-examination History\n  {}", entries.join("\n  "))
}
