//! Mount configuration.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::logger::{LogEvents, Logger, TracingLogger};

/// Options accepted by [`mount`](crate::pipeline::mount).
#[derive(Clone)]
pub struct RenderOptions {
    /// Commit window of the batch layer. `Duration::ZERO` forwards every
    /// placement intent to the adapter immediately.
    pub batch_time: Duration,
    /// Debounce applied to every suspension's published state.
    pub suspense_debounce: Duration,
    /// Debounce applied before a component swaps in its placeholder.
    pub pending_debounce: Duration,
    pub log_events: LogEvents,
    /// Custom logger. When unset, a [`TracingLogger`] filtered by
    /// `log_events` is used.
    pub logger: Option<Rc<dyn Logger>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            batch_time: Duration::from_millis(10),
            suspense_debounce: Duration::from_millis(1),
            pending_debounce: Duration::from_millis(1),
            log_events: LogEvents::empty(),
            logger: None,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_time(mut self, batch_time: Duration) -> Self {
        self.batch_time = batch_time;
        self
    }

    /// Disable batching.
    pub fn unbatched(self) -> Self {
        self.batch_time(Duration::ZERO)
    }

    pub fn suspense_debounce(mut self, debounce: Duration) -> Self {
        self.suspense_debounce = debounce;
        self
    }

    pub fn pending_debounce(mut self, debounce: Duration) -> Self {
        self.pending_debounce = debounce;
        self
    }

    pub fn log_events(mut self, events: LogEvents) -> Self {
        self.log_events = events;
        self
    }

    pub fn logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub(crate) fn resolve_logger(&self) -> Rc<dyn Logger> {
        match &self.logger {
            Some(logger) => logger.clone(),
            None => Rc::new(TracingLogger::new(self.log_events)),
        }
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("batch_time", &self.batch_time)
            .field("suspense_debounce", &self.suspense_debounce)
            .field("pending_debounce", &self.pending_debounce)
            .field("log_events", &self.log_events)
            .field("logger", &self.logger.as_ref().map(|_| ".."))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!(options.batch_time, Duration::from_millis(10));
        assert_eq!(options.suspense_debounce, Duration::from_millis(1));
        assert!(options.logger.is_none());
    }

    #[test]
    fn test_builder() {
        let options = RenderOptions::new()
            .unbatched()
            .pending_debounce(Duration::from_millis(5))
            .log_events(LogEvents::debug());
        assert_eq!(options.batch_time, Duration::ZERO);
        assert_eq!(options.pending_debounce, Duration::from_millis(5));
        assert_eq!(options.log_events, LogEvents::debug());
    }
}
