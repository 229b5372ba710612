// ============================================================================
// Scope Timer
// RAII timing into per-thread label slots, for coarse instrumentation off
// the hot path
// ============================================================================

use std::cell::RefCell;
use std::time::{Duration, Instant};

thread_local! {
    /// Accumulated elapsed time per label, on this thread. A small linear
    /// table: timed scopes are few and labels are static.
    static SLOTS: RefCell<Vec<(&'static str, Duration)>> = const { RefCell::new(Vec::new()) };
}

/// Guard that measures the time from construction to drop and adds it to
/// this thread's accumulator for `label`.
///
/// ```
/// use matchbook::utils::scope_timer::{self, ScopeTimer};
///
/// {
///     let _timer = ScopeTimer::start("load");
///     // timed work
/// }
/// assert!(scope_timer::elapsed("load").is_some());
/// ```
#[derive(Debug)]
pub struct ScopeTimer {
    label: &'static str,
    begin: Instant,
}

impl ScopeTimer {
    #[must_use = "the timer measures until it is dropped"]
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            begin: Instant::now(),
        }
    }
}

impl Drop for ScopeTimer {
    fn drop(&mut self) {
        let elapsed = self.begin.elapsed();
        SLOTS.with(|slots| {
            let mut slots = slots.borrow_mut();
            match slots.iter_mut().find(|(label, _)| *label == self.label) {
                Some((_, total)) => *total += elapsed,
                None => slots.push((self.label, elapsed)),
            }
        });
    }
}

/// Total time accumulated under `label` on the calling thread.
pub fn elapsed(label: &str) -> Option<Duration> {
    SLOTS.with(|slots| {
        slots
            .borrow()
            .iter()
            .find(|(slot, _)| *slot == label)
            .map(|(_, total)| *total)
    })
}

/// Remove and return the accumulated time for `label` on this thread.
pub fn take(label: &str) -> Option<Duration> {
    SLOTS.with(|slots| {
        let mut slots = slots.borrow_mut();
        let position = slots.iter().position(|(slot, _)| *slot == label)?;
        Some(slots.swap_remove(position).1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_across_scopes() {
        {
            let _timer = ScopeTimer::start("test_accumulate");
        }
        let first = elapsed("test_accumulate").unwrap();
        {
            let _timer = ScopeTimer::start("test_accumulate");
        }
        let second = elapsed("test_accumulate").unwrap();
        assert!(second >= first);

        assert!(take("test_accumulate").is_some());
        assert_eq!(elapsed("test_accumulate"), None);
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(elapsed("test_never_started"), None);
        assert_eq!(take("test_never_started"), None);
    }

    #[test]
    fn test_slots_are_per_thread() {
        {
            let _timer = ScopeTimer::start("test_thread_local");
        }
        assert!(elapsed("test_thread_local").is_some());

        std::thread::spawn(|| {
            assert_eq!(elapsed("test_thread_local"), None);
        })
        .join()
        .unwrap();
    }
}
