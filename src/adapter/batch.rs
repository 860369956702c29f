//! Batched commit layer.
//!
//! Placement intents are buffered until the window goes quiet, then
//! coalesced per handle and forwarded to the wrapped adapter. Removals go
//! first; placements follow in emission order, except that one whose
//! previous sibling is still pending waits for it. The net effect for a
//! handle depends on whether it was attached when the batch opened and on
//! the last intent it received:
//!
//! | attached before | last intent   | committed                  |
//! |-----------------|---------------|----------------------------|
//! | no              | place / move  | place at latest position   |
//! | no              | remove        | nothing                    |
//! | yes             | remove        | remove                     |
//! | yes             | place / move  | move to latest position    |
//!
//! A remove followed by a place at the very same position commits nothing.

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use indexmap::IndexMap;

use super::{Adapter, Position};
use crate::logger::Logger;
use crate::reactive::{Debouncer, Scheduler};
use crate::types::Handle;

#[derive(Clone)]
enum Intent {
    Place(Rc<Position>),
    Move(Rc<Position>),
    Remove(Rc<Position>),
}

impl Intent {
    fn position(&self) -> &Rc<Position> {
        match self {
            Intent::Place(position) | Intent::Move(position) | Intent::Remove(position) => position,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Intent::Place(_) => "place",
            Intent::Move(_) => "move",
            Intent::Remove(_) => "remove",
        }
    }
}

struct Pending {
    attached_before: bool,
    /// Position the handle was removed from, when the batch opened with a removal.
    removed_from: Option<Rc<Position>>,
    last: Intent,
}

pub struct BatchAdapter {
    inner: Rc<dyn Adapter>,
    logger: Rc<dyn Logger>,
    window: Option<Debouncer>,
    pending: RefCell<IndexMap<Handle, Pending>>,
    received: Cell<usize>,
    this: Weak<Self>,
}

impl BatchAdapter {
    /// Wrap `inner`. A zero `batch_time` forwards every intent immediately.
    pub fn new(
        inner: Rc<dyn Adapter>,
        scheduler: Rc<Scheduler>,
        logger: Rc<dyn Logger>,
        batch_time: Duration,
    ) -> Rc<Self> {
        let window = (!batch_time.is_zero()).then(|| Debouncer::new(scheduler, batch_time));
        Rc::new_cyclic(|this| Self {
            inner,
            logger,
            window,
            pending: RefCell::new(IndexMap::new()),
            received: Cell::new(0),
            this: this.clone(),
        })
    }

    pub fn adapter(&self) -> &Rc<dyn Adapter> {
        &self.inner
    }

    pub fn is_batching(&self) -> bool {
        self.window.is_some()
    }

    /// Number of handles with an uncommitted intent.
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn place(&self, handle: Handle, position: &Rc<Position>) {
        self.publish(handle, Intent::Place(position.clone()));
    }

    pub fn move_to(&self, handle: Handle, position: &Rc<Position>) {
        self.publish(handle, Intent::Move(position.clone()));
    }

    /// Detach `handle` from the position it was placed at.
    pub fn remove(&self, handle: Handle, position: &Rc<Position>) {
        self.publish(handle, Intent::Remove(position.clone()));
    }

    /// Commit buffered intents now.
    pub fn flush_now(&self) {
        if let Some(window) = &self.window {
            window.cancel();
        }
        self.commit();
    }

    fn publish(&self, handle: Handle, intent: Intent) {
        self.logger.publish_event(intent.name(), handle);

        let Some(window) = &self.window else {
            self.apply(handle, &intent);
            return;
        };

        self.received.set(self.received.get() + 1);
        {
            let mut pending = self.pending.borrow_mut();
            let entry = match pending.shift_remove(&handle) {
                Some(mut existing) => {
                    existing.last = intent;
                    existing
                }
                None => Pending {
                    attached_before: !matches!(intent, Intent::Place(_)),
                    removed_from: match &intent {
                        Intent::Remove(position) => Some(position.clone()),
                        _ => None,
                    },
                    last: intent,
                },
            };
            pending.insert(handle, entry);
        }

        let this = self.this.clone();
        window.call(move || {
            if let Some(this) = this.upgrade() {
                this.commit();
            }
            Ok(())
        });
    }

    fn commit(&self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        let received = self.received.replace(0);
        if pending.is_empty() {
            return;
        }
        self.logger.begin_batch(received);

        let mut applied = 0;
        let mut placements: IndexMap<Handle, Intent> = IndexMap::new();
        for (handle, entry) in pending {
            let intent = match (entry.attached_before, entry.last) {
                (false, Intent::Remove(_)) => continue,
                (false, Intent::Place(position) | Intent::Move(position)) => Intent::Place(position),
                (true, Intent::Remove(position)) => {
                    self.apply(handle, &Intent::Remove(position));
                    applied += 1;
                    continue;
                }
                (true, Intent::Place(position)) if entry
                    .removed_from
                    .as_ref()
                    .is_some_and(|from| Rc::ptr_eq(from, &position)) =>
                {
                    continue;
                }
                (true, Intent::Place(position) | Intent::Move(position)) => Intent::Move(position),
            };
            placements.insert(handle, intent);
        }

        // Sibling chains are acyclic, so some placement is always ready.
        while !placements.is_empty() {
            let ready = placements
                .iter()
                .position(|(_, intent)| {
                    intent
                        .position()
                        .previous()
                        .is_none_or(|previous| !placements.contains_key(&previous))
                })
                .unwrap_or(0);
            if let Some((handle, intent)) = placements.shift_remove_index(ready) {
                self.apply(handle, &intent);
                applied += 1;
            }
        }

        self.logger.complete_batch(applied, received - applied);
    }

    fn apply(&self, handle: Handle, intent: &Intent) {
        match intent {
            Intent::Place(position) => {
                self.inner.place(handle, position);
                self.logger.place_event(handle, position.parent());
            }
            Intent::Move(position) => {
                self.inner.move_to(handle, position);
                self.logger.move_event(handle, position.parent());
            }
            Intent::Remove(position) => {
                self.inner.remove(handle, position.parent());
                self.logger.remove_event(handle, position.parent());
            }
        }
    }
}
