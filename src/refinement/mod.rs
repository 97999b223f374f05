//! Iterative refinement of a character guess.
//!
//! After the original analysis, the user can answer "one of these is right"
//! (focus) or "none of these are right" (exclude). Each answer is a round:
//! a new request derived from the current result, whose response is
//! appended to the session history. The user can step back to any earlier
//! round or to the original result.
//!
//! # Architecture
//!
//! - **Session**: original result, ordered rounds, accumulated exclusions,
//!   and the image handle reused by every request
//! - **Engine**: owns the session, builds payloads, applies responses, and
//!   discards responses issued against a state that has since changed
//! - **Exclusions**: grow only on successful exclude rounds; cleared by
//!   going back to the original or starting over
//!
//! # Example
//!
//! ```ignore
//! use anime_guesser::analyzer::{HttpRecognitionClient, SearchType};
//! use anime_guesser::refinement::RefinementEngine;
//!
//! let mut engine = RefinementEngine::default();
//! let original = engine.submit_original(&client, image).await;
//!
//! // "No, try different characters"
//! let step1 = engine.request_refinement(&client, SearchType::Exclude).await?;
//! assert_eq!(engine.step_number(), 1);
//!
//! engine.rollback_to_original()?;
//! assert!(engine.excluded().unwrap().is_empty());
//! ```

mod engine;
mod session;
mod types;

pub use engine::{AnalysisTicket, Applied, EngineOptions, RefinementEngine, RefinementTicket};
pub use session::{RefinementSession, SessionId};
pub use types::{ExclusionSet, RefinementRound, RollbackMode};
