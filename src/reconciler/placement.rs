use std::cell::RefCell;
use std::rc::Rc;

use crate::adapter::{BatchAdapter, Position};
use crate::types::Handle;

/// Where a handle-owning controller is currently placed.
///
/// Placing at the same position object twice is a no-op; placing at a new
/// one issues a move.
#[derive(Default)]
pub(crate) struct Placement {
    position: RefCell<Option<Rc<Position>>>,
}

impl Placement {
    pub fn place(&self, batch: &BatchAdapter, handle: Handle, position: Rc<Position>) {
        let previous = self.position.replace(Some(position.clone()));
        match previous {
            Some(current) if Rc::ptr_eq(&current, &position) => {}
            Some(_) => batch.move_to(handle, &position),
            None => batch.place(handle, &position),
        }
    }

    pub fn remove(&self, batch: &BatchAdapter, handle: Handle) {
        let previous = self.position.take();
        if let Some(position) = previous {
            batch.remove(handle, &position);
        }
    }

    pub fn is_placed(&self) -> bool {
        self.position.borrow().is_some()
    }
}

/// Position slot for controllers that delegate placement to children.
///
/// `update` returns false when `position` is the one already stored.
#[derive(Default)]
pub(crate) struct Anchored {
    position: RefCell<Option<Rc<Position>>>,
}

impl Anchored {
    pub fn update(&self, position: &Rc<Position>) -> bool {
        let mut current = self.position.borrow_mut();
        if current.as_ref().is_some_and(|p| Rc::ptr_eq(p, position)) {
            return false;
        }
        *current = Some(position.clone());
        true
    }

    pub fn take(&self) -> Option<Rc<Position>> {
        self.position.take()
    }

    pub fn get(&self) -> Option<Rc<Position>> {
        self.position.borrow().clone()
    }

    pub fn is_placed(&self) -> bool {
        self.position.borrow().is_some()
    }
}
