//! User intents, one function per action.
//!
//! Errors are returned as display-ready strings; failures reported by the
//! recognition service are never errors here, they are results.

pub mod analyzer;
pub mod health;
pub mod refinement;
mod state;

pub use analyzer::{analyze_image, start_over};
pub use health::{check_health, refresh_database};
pub use refinement::{refine, rollback_to_original, rollback_to_step};
pub use state::{AppState, SessionSnapshot, StepLabel};
