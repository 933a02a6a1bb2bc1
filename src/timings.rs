use std::time::{Duration, Instant};

/// Per-phase wall-clock timing for one search, returned to the caller
/// instead of being logged ad hoc from inside the hot loop.
#[derive(Debug, Clone, Default)]
pub struct Timings {
    pub prefilter: Duration,
    pub scheduled_pass: Duration,
    pub monte_carlo_pass: Duration,
    /// Left at zero by [`RaptorEngine::run`](crate::raptor::RaptorEngine::run)
    /// itself; the egress-propagation stage runs after the engine returns,
    /// so a caller wraps its own `propagate_target`/`transpose` calls with
    /// [`timed`] against this field to fill it in.
    pub propagation: Duration,
    pub iterations: usize,
}

impl Timings {
    pub fn new() -> Self {
        Timings::default()
    }

    pub fn log_summary(&self) {
        log::debug!(
            "raptor search timings: prefilter={:?} scheduled_pass={:?} monte_carlo_pass={:?} propagation={:?} iterations={}",
            self.prefilter,
            self.scheduled_pass,
            self.monte_carlo_pass,
            self.propagation,
            self.iterations
        );
    }
}

/// Measures a closure and accumulates its duration into `target`.
///
/// Exported (not crate-private) so a caller driving the egress-propagation
/// stage -- which runs after [`RaptorEngine::run`](crate::raptor::RaptorEngine::run)
/// returns its [`Timings`], not inside it -- can fold `propagate_target`/
/// `transpose` calls into the same `propagation` field the engine leaves at
/// zero, e.g. `timed(&mut output.timings.propagation, || propagate_target(...))`.
pub fn timed<T>(target: &mut Duration, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    *target += start.elapsed();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_accumulates_across_calls_rather_than_overwriting() {
        let mut total = Duration::ZERO;
        timed(&mut total, || ());
        let after_first = total;
        timed(&mut total, || ());
        assert!(total >= after_first);
    }

    #[test]
    fn timed_returns_the_closures_value() {
        let mut total = Duration::ZERO;
        let value = timed(&mut total, || 42);
        assert_eq!(value, 42);
    }
}
