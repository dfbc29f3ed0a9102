#![forbid(unsafe_code)]

//! Shared result handle for asynchronous open requests.
//!
//! An [`OpenHandle`] is what `open` returns: initially pending, it settles
//! exactly once into ready (carrying the form) or failed (carrying a
//! message). Clones share the same underlying state, which is how request
//! coalescing stays observable: two callers whose requests share a dedup
//! key hold handles that resolve to the *same* eventual form.
//!
//! Settling is first-write-wins; later attempts are ignored. Only the
//! manager settles handles, but the methods are public because the
//! orchestrator lives in a separate crate.

use std::cell::RefCell;
use std::rc::Rc;

use crate::form::FormRef;

#[derive(Debug)]
enum OpenState {
    Pending,
    Ready(FormRef),
    Failed(String),
}

/// Asynchronous handle to the result of one open request.
#[derive(Clone)]
pub struct OpenHandle {
    inner: Rc<RefCell<OpenState>>,
}

impl OpenHandle {
    /// A handle that has not settled yet.
    pub fn pending() -> Self {
        Self {
            inner: Rc::new(RefCell::new(OpenState::Pending)),
        }
    }

    /// A handle that settled successfully at creation time (active match or
    /// cache revival).
    pub fn ready(form: FormRef) -> Self {
        Self {
            inner: Rc::new(RefCell::new(OpenState::Ready(form))),
        }
    }

    /// A handle that failed synchronously with a validation message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(OpenState::Failed(message.into()))),
        }
    }

    /// Settle the handle with a form. No-op if already settled.
    pub fn complete(&self, form: FormRef) {
        let mut state = self.inner.borrow_mut();
        if matches!(*state, OpenState::Pending) {
            *state = OpenState::Ready(form);
        }
    }

    /// Settle the handle with a failure message. No-op if already settled.
    pub fn fail(&self, message: impl Into<String>) {
        let mut state = self.inner.borrow_mut();
        if matches!(*state, OpenState::Pending) {
            *state = OpenState::Failed(message.into());
        }
    }

    /// Whether the handle has not settled yet.
    pub fn is_pending(&self) -> bool {
        matches!(*self.inner.borrow(), OpenState::Pending)
    }

    /// Whether the handle settled successfully.
    pub fn is_ready(&self) -> bool {
        matches!(*self.inner.borrow(), OpenState::Ready(_))
    }

    /// Whether the handle settled with a failure.
    pub fn is_failed(&self) -> bool {
        matches!(*self.inner.borrow(), OpenState::Failed(_))
    }

    /// The resulting form, if ready.
    pub fn form(&self) -> Option<FormRef> {
        match &*self.inner.borrow() {
            OpenState::Ready(form) => Some(form.clone()),
            _ => None,
        }
    }

    /// The failure message, if failed.
    pub fn error(&self) -> Option<String> {
        match &*self.inner.borrow() {
            OpenState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Whether two handles share the same underlying state (coalesced).
    pub fn shares_state_with(&self, other: &OpenHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for OpenHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.inner.borrow() {
            OpenState::Pending => "pending",
            OpenState::Ready(_) => "ready",
            OpenState::Failed(_) => "failed",
        };
        f.debug_struct("OpenHandle").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Form, OpenPolicy};
    use crate::logic::NoopLogic;

    fn some_form() -> FormRef {
        Form::new(
            1,
            "Inventory",
            "HUD",
            OpenPolicy::SingleInstanceGlobal,
            false,
            None,
            Box::new(()),
            Box::new(NoopLogic),
        )
        .into_ref()
    }

    #[test]
    fn pending_then_complete() {
        let handle = OpenHandle::pending();
        assert!(handle.is_pending());
        assert!(handle.form().is_none());

        handle.complete(some_form());
        assert!(handle.is_ready());
        assert_eq!(handle.form().unwrap().borrow().serial_id(), 1);
    }

    #[test]
    fn pending_then_fail() {
        let handle = OpenHandle::pending();
        handle.fail("load failed");
        assert!(handle.is_failed());
        assert_eq!(handle.error().as_deref(), Some("load failed"));
    }

    #[test]
    fn settling_is_first_write_wins() {
        let handle = OpenHandle::pending();
        handle.fail("first");
        handle.complete(some_form());
        handle.fail("second");
        assert!(handle.is_failed());
        assert_eq!(handle.error().as_deref(), Some("first"));
    }

    #[test]
    fn clones_share_state() {
        let handle = OpenHandle::pending();
        let other = handle.clone();
        assert!(handle.shares_state_with(&other));

        handle.complete(some_form());
        assert!(other.is_ready());
    }

    #[test]
    fn independent_handles_do_not_share_state() {
        let a = OpenHandle::pending();
        let b = OpenHandle::pending();
        assert!(!a.shares_state_with(&b));
    }

    #[test]
    fn synchronously_failed_handle_carries_message() {
        let handle = OpenHandle::failed("unknown group `HUD`");
        assert!(handle.is_failed());
        assert_eq!(handle.error().as_deref(), Some("unknown group `HUD`"));
    }
}
