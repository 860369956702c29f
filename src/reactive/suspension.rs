//! Suspension context: a hierarchical "this subtree is loading" signal.
//!
//! A [`Suspension`] is a set of tokens. Any controller below it can mint a
//! token with [`Suspension::downstream`] and raise or lower it; the set being
//! non-empty means "suspended". Tokens land in the nearest enclosing set,
//! which is either a suspense boundary's private context or the root.
//!
//! The published state is distinct-until-changed and debounced, so a
//! suspend/resume pair inside one window never reaches observers.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use spark_signals::{signal, Signal};

use super::scheduler::{Debouncer, Scheduler};
use super::stream::Stream;
use crate::logger::Logger;

#[derive(Clone)]
pub struct Suspension {
    inner: Rc<Inner>,
}

struct Inner {
    tokens: RefCell<BTreeSet<u64>>,
    next_token: Cell<u64>,
    published: Signal<bool>,
    debouncer: Debouncer,
    /// Present on the root context only.
    unbounded: Option<Rc<dyn Logger>>,
}

impl Suspension {
    /// Top-level context. Turning suspended here is reported as a warning.
    pub fn root(scheduler: Rc<Scheduler>, debounce: Duration, logger: Rc<dyn Logger>) -> Self {
        Self::with_warning(scheduler, debounce, Some(logger))
    }

    /// Private context of a suspense boundary.
    pub fn boundary(scheduler: Rc<Scheduler>, debounce: Duration) -> Self {
        Self::with_warning(scheduler, debounce, None)
    }

    fn with_warning(scheduler: Rc<Scheduler>, debounce: Duration, unbounded: Option<Rc<dyn Logger>>) -> Self {
        Self {
            inner: Rc::new(Inner {
                tokens: RefCell::new(BTreeSet::new()),
                next_token: Cell::new(0),
                published: signal(false),
                debouncer: Debouncer::new(scheduler, debounce),
                unbounded,
            }),
        }
    }

    /// Mint a token that suspends this context while raised.
    pub fn downstream(&self) -> SuspensionToken {
        let id = self.inner.next_token.get();
        self.inner.next_token.set(id + 1);
        SuspensionToken {
            owner: Rc::downgrade(&self.inner),
            id,
            raised: Cell::new(false),
        }
    }

    /// Published (debounced) state.
    pub fn is_suspended(&self) -> bool {
        self.inner.published.get()
    }

    /// Undebounced state: whether any token is raised right now.
    pub fn has_raised_tokens(&self) -> bool {
        !self.inner.tokens.borrow().is_empty()
    }

    pub fn suspended_stream(&self) -> Stream<bool> {
        Stream::from_signal(self.inner.published.clone())
    }

    pub fn is_root(&self) -> bool {
        self.inner.unbounded.is_some()
    }
}

impl Inner {
    fn changed(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.debouncer.call(move || {
            if let Some(inner) = weak.upgrade() {
                inner.publish();
            }
            Ok(())
        });
    }

    fn publish(&self) {
        let suspended = !self.tokens.borrow().is_empty();
        if self.published.get() == suspended {
            return;
        }
        self.published.set(suspended);
        if suspended {
            if let Some(logger) = &self.unbounded {
                logger.suspension_without_boundary();
            }
        }
    }
}

impl fmt::Debug for Suspension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suspension")
            .field("tokens", &self.inner.tokens.borrow().len())
            .field("suspended", &self.inner.published.get())
            .field("root", &self.is_root())
            .finish()
    }
}

/// Handle on one token of a [`Suspension`].
///
/// Dropping the token completes it.
pub struct SuspensionToken {
    owner: Weak<Inner>,
    id: u64,
    raised: Cell<bool>,
}

impl SuspensionToken {
    pub fn suspend(&self) {
        self.set(true);
    }

    pub fn resume(&self) {
        self.set(false);
    }

    pub fn set(&self, suspended: bool) {
        if self.raised.replace(suspended) == suspended {
            return;
        }
        let Some(owner) = self.owner.upgrade() else {
            return;
        };
        if suspended {
            owner.tokens.borrow_mut().insert(self.id);
        } else {
            owner.tokens.borrow_mut().remove(&self.id);
        }
        owner.changed();
    }

    /// Lower the token for good.
    pub fn complete(&self) {
        self.resume();
    }

    pub fn is_suspended(&self) -> bool {
        self.raised.get()
    }
}

impl Drop for SuspensionToken {
    fn drop(&mut self) {
        self.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NoopLogger;

    const WINDOW: Duration = Duration::from_millis(1);

    fn root(scheduler: &Rc<Scheduler>) -> Suspension {
        Suspension::root(scheduler.clone(), WINDOW, Rc::new(NoopLogger))
    }

    #[test]
    fn test_suspend_is_published_after_window() {
        let scheduler = Scheduler::new();
        let suspension = root(&scheduler);
        let token = suspension.downstream();

        token.suspend();
        assert!(suspension.has_raised_tokens());
        assert!(!suspension.is_suspended());

        scheduler.advance(WINDOW).unwrap();
        assert!(suspension.is_suspended());

        token.resume();
        scheduler.advance(WINDOW).unwrap();
        assert!(!suspension.is_suspended());
    }

    #[test]
    fn test_rapid_toggle_never_publishes() {
        let scheduler = Scheduler::new();
        let suspension = Suspension::boundary(scheduler.clone(), WINDOW);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = suspension
            .suspended_stream()
            .subscribe(&scheduler, move |s| {
                sink.borrow_mut().push(s);
                Ok(())
            })
            .unwrap();

        let token = suspension.downstream();
        token.suspend();
        token.resume();
        token.suspend();
        token.resume();
        scheduler.advance(Duration::from_millis(5)).unwrap();

        assert_eq!(*seen.borrow(), vec![false]);
    }

    #[test]
    fn test_any_token_keeps_suspended() {
        let scheduler = Scheduler::new();
        let suspension = root(&scheduler);
        let a = suspension.downstream();
        let b = suspension.downstream();

        a.suspend();
        b.suspend();
        a.resume();
        scheduler.advance(WINDOW).unwrap();
        assert!(suspension.is_suspended());

        drop(b);
        scheduler.advance(WINDOW).unwrap();
        assert!(!suspension.is_suspended());
    }
}
