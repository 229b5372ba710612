// ============================================================================
// Engine Module
// Per-symbol dispatch, time-in-force handling, and market-data emission
// ============================================================================

mod matching_engine;

pub use matching_engine::{EngineError, MatchingEngine, SubmitOutcome};
