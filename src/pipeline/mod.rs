// ============================================================================
// Pipeline Module
// Lock-free ingress channel and the dedicated matching thread
// ============================================================================

pub mod spsc;

mod event_loop;

pub use event_loop::{EventLoop, EventPipeline, PipelineError, ShutdownReport};
pub use spsc::{Consumer, Producer};
