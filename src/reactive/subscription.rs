use crate::types::Cleanup;

/// Ordered set of teardown closures.
///
/// Unsubscribing runs every closure once, in the order they were added.
/// Closures added after the subscription closed run immediately. Dropping a
/// subscription unsubscribes it.
#[derive(Default)]
pub struct Subscription {
    cleanups: Vec<Cleanup>,
    closed: bool,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cleanup(cleanup: impl FnOnce() + 'static) -> Self {
        let mut subscription = Self::new();
        subscription.add(cleanup);
        subscription
    }

    pub fn add(&mut self, cleanup: impl FnOnce() + 'static) {
        if self.closed {
            cleanup();
        } else {
            self.cleanups.push(Box::new(cleanup));
        }
    }

    /// Tie `other` to this subscription's lifetime.
    pub fn add_subscription(&mut self, mut other: Subscription) {
        self.add(move || other.unsubscribe());
    }

    pub fn unsubscribe(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for cleanup in std::mem::take(&mut self.cleanups) {
            cleanup();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("cleanups", &self.cleanups.len())
            .field("closed", &self.closed)
            .finish()
    }
}
