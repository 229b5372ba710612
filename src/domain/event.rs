// ============================================================================
// Engine Event
// The tagged union carried across the ingress channel
// ============================================================================

use super::order::{CancelOrder, NewOrder};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One ingress event: a submission or a cancellation, stamped with the
/// producer's arrival timestamp.
///
/// The timestamp is an opaque monotonic nanosecond count; the engine uses
/// it as the arrival time of resting orders and the match time of trades.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EngineEvent {
    New { order: NewOrder, ts_ns: u64 },
    Cancel { cancel: CancelOrder, ts_ns: u64 },
}

impl EngineEvent {
    /// Producer-assigned arrival timestamp of the event.
    pub fn ts_ns(&self) -> u64 {
        match self {
            EngineEvent::New { ts_ns, .. } => *ts_ns,
            EngineEvent::Cancel { ts_ns, .. } => *ts_ns,
        }
    }
}
