//! Cooperative task scheduler with a virtual clock.
//!
//! Everything the reconciler does later than "right now" goes through here:
//! stream deliveries after the first, the suspension debounce, the component
//! placeholder window and the batch commit window. Time only moves when the
//! host calls [`Scheduler::advance`] (or `MountHandle::tick`, which advances
//! by wall-clock time), so tests drive every timer deterministically.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use spark_signals::flush_sync;

use crate::error::Result;

type Task = Box<dyn FnOnce() -> Result<()>>;

/// Identifier of a scheduled timer, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Default)]
pub struct Scheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<VecDeque<Task>>,
    timers: RefCell<BTreeMap<(Duration, u64), Task>>,
    deadlines: RefCell<HashMap<u64, Duration>>,
}

impl Scheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Current virtual time, measured from scheduler creation.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Run `task` on the next turn.
    pub fn defer(&self, task: impl FnOnce() -> Result<()> + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Run `task` once `delay` has elapsed.
    pub fn schedule(&self, delay: Duration, task: impl FnOnce() -> Result<()> + 'static) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let at = self.now.get() + delay;
        self.timers.borrow_mut().insert((at, id), Box::new(task));
        self.deadlines.borrow_mut().insert(id, at);
        TimerId(id)
    }

    /// Cancel a timer. Returns false if it already ran or was cancelled.
    pub fn cancel(&self, timer: TimerId) -> bool {
        let Some(at) = self.deadlines.borrow_mut().remove(&timer.0) else {
            return false;
        };
        self.timers.borrow_mut().remove(&(at, timer.0)).is_some()
    }

    /// True when no task is queued and no timer is pending.
    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty() && self.timers.borrow().is_empty()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.borrow().keys().next().map(|(at, _)| *at)
    }

    /// Drain the queue and every timer that is due at the current time.
    ///
    /// Stops at the first failing task and returns its error. Remaining work
    /// stays queued.
    pub fn flush(&self) -> Result<()> {
        loop {
            flush_sync();

            let task = self.queue.borrow_mut().pop_front();
            if let Some(task) = task {
                task()?;
                continue;
            }

            match self.take_due() {
                Some(task) => task()?,
                None => return Ok(()),
            }
        }
    }

    /// Move the clock forward by `by`, firing timers in deadline order.
    pub fn advance(&self, by: Duration) -> Result<()> {
        let target = self.now.get() + by;
        self.flush()?;

        while let Some(at) = self.next_deadline().filter(|at| *at <= target) {
            if at > self.now.get() {
                self.now.set(at);
            }
            self.flush()?;
        }

        self.now.set(target);
        self.flush()
    }

    fn take_due(&self) -> Option<Task> {
        let now = self.now.get();
        let mut timers = self.timers.borrow_mut();
        let key = *timers.keys().next()?;
        if key.0 > now {
            return None;
        }
        self.deadlines.borrow_mut().remove(&key.1);
        timers.remove(&key)
    }
}

/// Trailing debounce on a [`Scheduler`].
///
/// Every [`call`](Debouncer::call) replaces the pending task and restarts
/// the window.
pub struct Debouncer {
    scheduler: Rc<Scheduler>,
    delay: Duration,
    timer: Cell<Option<TimerId>>,
}

impl Debouncer {
    pub fn new(scheduler: Rc<Scheduler>, delay: Duration) -> Self {
        Self {
            scheduler,
            delay,
            timer: Cell::new(None),
        }
    }

    pub fn call(&self, task: impl FnOnce() -> Result<()> + 'static) {
        self.cancel();
        let id = self.scheduler.schedule(self.delay, task);
        self.timer.set(Some(id));
    }

    pub fn cancel(&self) {
        if let Some(id) = self.timer.take() {
            self.scheduler.cancel(id);
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
