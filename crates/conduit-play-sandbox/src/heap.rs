//! Per-execution registry of the script's shared containers.
//!
//! Script values point at each other through `Rc`, so a list holding itself,
//! an instance whose field refers back to it, or a closure stored in the
//! scope it captured never drops to a zero count. While a [`Session`] is open,
//! every list, object, instance, class and scope created on this thread is
//! recorded weakly. Ending the session empties each one still alive, which
//! breaks every cycle among them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::value::Value;

/// A container whose contents can be dropped in place.
pub(crate) trait Clear {
    fn clear(&self);
}

impl Clear for RefCell<Vec<Value>> {
    fn clear(&self) {
        if let Ok(mut items) = self.try_borrow_mut() {
            items.clear();
        }
    }
}

impl Clear for RefCell<BTreeMap<String, Value>> {
    fn clear(&self) {
        if let Ok(mut fields) = self.try_borrow_mut() {
            fields.clear();
        }
    }
}

thread_local! {
    static TRACKED: RefCell<Option<Vec<Weak<dyn Clear>>>> = const { RefCell::new(None) };
}

/// Record `container` in the open session, if there is one.
pub(crate) fn track<T: Clear + 'static>(container: &Rc<T>) {
    TRACKED.with(|tracked| {
        let mut tracked = tracked.borrow_mut();
        let Some(list) = tracked.as_mut() else {
            return;
        };
        if list.len() == list.capacity() {
            list.retain(|weak| weak.strong_count() > 0);
            list.reserve(list.len().max(64));
        }
        let weak: Weak<dyn Clear> = Rc::<T>::downgrade(container);
        list.push(weak);
    });
}

/// The registry for one execution. Dropping it empties every container
/// created since [`Session::begin`]. A session begun while another is open
/// on the same thread leaves the cleanup to the outer one.
#[must_use = "containers are only released when the session is dropped"]
pub struct Session {
    owner: bool,
}

impl Session {
    pub fn begin() -> Self {
        let owner = TRACKED.with(|tracked| {
            let mut tracked = tracked.borrow_mut();
            if tracked.is_some() {
                false
            } else {
                *tracked = Some(Vec::new());
                true
            }
        });
        Self { owner }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.owner {
            return;
        }
        let Some(tracked) = TRACKED.with(|tracked| tracked.borrow_mut().take()) else {
            return;
        };
        // Everything stays alive until every container is empty, so no drop
        // below recurses into a nested container.
        let live: Vec<Rc<dyn Clear>> = tracked.iter().filter_map(Weak::upgrade).collect();
        for container in &live {
            container.clear();
        }
    }
}
