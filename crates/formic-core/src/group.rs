#![forbid(unsafe_code)]

//! The group seam: a named container implementing stacking policy over a
//! set of opened forms.
//!
//! The manager owns a registry of groups and delegates every structural
//! visibility decision to them: which forms are covered, which are paused,
//! what depth each sits at. The *policy* is the group's business; the
//! manager only guarantees it calls [`Group::refresh`] after every
//! structural change.
//!
//! `formic-runtime` ships a reference implementation (`StackGroup`); hosts
//! with their own stacking rules implement this trait instead.

use crate::form::{FormRef, SerialId};

/// A named container implementing stacking/visibility policy over forms.
///
/// Implementations own the interaction stack. The form at the front of the
/// stack is the topmost one; [`Group::refresh`] recomputes depth, cover,
/// and pause state and drives the corresponding [`FormLogic`] hooks.
///
/// [`FormLogic`]: crate::logic::FormLogic
pub trait Group {
    /// The unique group name the manager registered this group under.
    fn name(&self) -> &str;

    /// Whether a form with this serial id is currently in the group.
    fn has_form(&self, serial_id: SerialId) -> bool;

    /// Add a form to the top of the stack and open it.
    fn add_and_open(&mut self, form: &FormRef);

    /// Remove a form from the stack and close it (user-initiated).
    fn remove_and_close(&mut self, form: &FormRef);

    /// Remove and close every form. `is_shutdown` is forwarded to each
    /// form's close hook.
    fn remove_and_close_all(&mut self, is_shutdown: bool);

    /// Move an already-opened form to the top of the stack.
    fn refocus(&mut self, form: &FormRef);

    /// Recompute depth/cover/pause state and fire the affected hooks.
    fn refresh(&mut self);

    /// Per-frame tick: forward `on_update` to forms the policy considers
    /// active (typically the unpaused ones).
    fn update(&mut self);

    /// Snapshot of the stack, topmost first.
    fn forms(&self) -> Vec<FormRef>;
}
