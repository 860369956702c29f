//! Reactive value stream with an auxiliary pending signal.
//!
//! A [`Stream`] is a reader over `spark-signals` state: calling it inside an
//! effect tracks whatever signals it touches. `None` means "has not emitted
//! yet". The optional pending reader reports whether the source is currently
//! loading, which the reconciler forwards into suspension.
//!
//! # Delivery
//!
//! [`Stream::subscribe`] observes the stream through an effect, but the sink
//! never runs inside that effect:
//!
//! - the first available value is delivered synchronously, right after the
//!   subscription is established
//! - later values are delivered on the next scheduler turn, coalesced to the
//!   latest one
//! - consecutive equal values are delivered once
//!
//! Unsubscribing stops the effect and drops any delivery still queued.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::{effect, Signal};

use super::scheduler::Scheduler;
use super::subscription::Subscription;
use crate::error::Result;

pub struct Stream<T> {
    read: Rc<dyn Fn() -> Option<T>>,
    pending: Option<Rc<dyn Fn() -> bool>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
            pending: self.pending.clone(),
        }
    }
}

/// Streams are equal when they share the same reader.
impl<T> PartialEq for Stream<T> {
    fn eq(&self, other: &Self) -> bool {
        let same_pending = match (&self.pending, &other.pending) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        Rc::ptr_eq(&self.read, &other.read) && same_pending
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("read", &Rc::as_ptr(&self.read).cast::<()>())
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Stream<T> {
    pub fn constant(value: T) -> Self {
        Self::from_fn(move || value.clone())
    }

    pub fn from_signal(signal: Signal<T>) -> Self {
        Self::from_fn(move || signal.get())
    }

    /// Stream over a signal that starts empty. Pending while it holds `None`.
    pub fn from_deferred(signal: Signal<Option<T>>) -> Self {
        let pending = signal.clone();
        Self::from_fn_opt(move || signal.get()).with_pending(move || pending.get().is_none())
    }

    pub fn from_fn(read: impl Fn() -> T + 'static) -> Self {
        Self {
            read: Rc::new(move || Some(read())),
            pending: None,
        }
    }

    pub fn from_fn_opt(read: impl Fn() -> Option<T> + 'static) -> Self {
        Self {
            read: Rc::new(read),
            pending: None,
        }
    }

    pub fn with_pending(mut self, pending: impl Fn() -> bool + 'static) -> Self {
        self.pending = Some(Rc::new(pending));
        self
    }

    pub fn with_pending_signal(self, pending: Signal<bool>) -> Self {
        self.with_pending(move || pending.get())
    }

    /// Project every value through `f`. The pending signal is kept.
    pub fn map<U: Clone + PartialEq + 'static>(&self, f: impl Fn(T) -> U + 'static) -> Stream<U> {
        let read = self.read.clone();
        Stream {
            read: Rc::new(move || read().map(&f)),
            pending: self.pending.clone(),
        }
    }

    /// Current value. Tracks dependencies when called inside an effect.
    pub fn current(&self) -> Option<T> {
        (self.read)()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|pending| pending())
    }

    pub fn has_pending_signal(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending signal as a stream of its own.
    pub fn pending_stream(&self) -> Option<Stream<bool>> {
        let pending = self.pending.clone()?;
        Some(Stream::from_fn(move || pending()))
    }

    /// Deliver values to `sink` until the returned subscription closes.
    ///
    /// Errors from the synchronous first delivery are returned here; errors
    /// from later deliveries surface from [`Scheduler::flush`].
    pub fn subscribe(
        &self,
        scheduler: &Rc<Scheduler>,
        sink: impl FnMut(T) -> Result<()> + 'static,
    ) -> Result<Subscription> {
        let delivery = Rc::new(Delivery {
            latest: RefCell::new(None),
            delivered: RefCell::new(None),
            queued: Cell::new(false),
            starting: Cell::new(true),
            closed: Cell::new(false),
            sink: RefCell::new(Box::new(sink)),
        });

        let read = self.read.clone();
        let observer = delivery.clone();
        let scheduler: Weak<Scheduler> = Rc::downgrade(scheduler);
        let stop = effect(move || {
            let Some(value) = read() else {
                return;
            };
            if observer.closed.get() {
                return;
            }
            *observer.latest.borrow_mut() = Some(value);
            if observer.starting.get() || observer.queued.replace(true) {
                return;
            }
            let Some(scheduler) = scheduler.upgrade() else {
                return;
            };
            let pending = observer.clone();
            scheduler.defer(move || pending.deliver());
        });

        let mut subscription = Subscription::new();
        let owner = delivery.clone();
        subscription.add(move || {
            owner.close();
            stop();
        });

        delivery.starting.set(false);
        delivery.deliver()?;
        Ok(subscription)
    }
}

struct Delivery<T> {
    latest: RefCell<Option<T>>,
    delivered: RefCell<Option<T>>,
    queued: Cell<bool>,
    starting: Cell<bool>,
    closed: Cell<bool>,
    sink: RefCell<Box<dyn FnMut(T) -> Result<()>>>,
}

impl<T: Clone + PartialEq> Delivery<T> {
    fn deliver(&self) -> Result<()> {
        self.queued.set(false);
        if self.closed.get() {
            return Ok(());
        }
        let Some(value) = self.latest.borrow_mut().take() else {
            return Ok(());
        };
        if self.delivered.borrow().as_ref() == Some(&value) {
            return Ok(());
        }
        *self.delivered.borrow_mut() = Some(value.clone());

        let mut sink = self.sink.borrow_mut();
        (*sink)(value)
    }

    fn close(&self) {
        self.closed.set(true);
        self.latest.borrow_mut().take();
        self.delivered.borrow_mut().take();
        // The sink may be the caller (a controller tearing itself down from
        // inside a delivery); it is then released with the effect instead.
        if let Ok(mut sink) = self.sink.try_borrow_mut() {
            *sink = Box::new(|_| Ok(()));
        }
    }
}
