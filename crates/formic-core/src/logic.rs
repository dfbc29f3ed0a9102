#![forbid(unsafe_code)]

//! Per-form behavior as a polymorphic hook trait.
//!
//! Concrete behaviors are supplied by the host application (usually shipped
//! alongside the template in the asset store) and attached to a [`Form`].
//! Every hook has a no-op default so behaviors implement only what they
//! care about.
//!
//! # Hook ordering
//!
//! For one open session the runtime guarantees:
//!
//! 1. `on_init` - once per open session, before the form joins its group.
//!    `SessionInfo::new_instance` distinguishes a freshly loaded instance
//!    from one revived out of the reuse cache.
//! 2. `on_open` - the form joined its group and is interactive.
//! 3. `on_cover`/`on_reveal`, `on_pause`/`on_resume`, `on_depth_changed`,
//!    `on_refocus`, `on_update` - any number of times while opened, driven
//!    by the group's stacking policy and the frame pump.
//! 4. `on_close` - the session ended. `is_shutdown` distinguishes manager
//!    teardown from a user-initiated close.
//! 5. `on_release` - at most once ever, when the instance is destroyed
//!    (cache eviction, zero-capacity close, or shutdown). After this the
//!    instance is never opened or cached again.
//!
//! [`Form`]: crate::form::Form

use crate::form::{OpenPolicy, SerialId};

/// Immutable description of one open session, passed to [`FormLogic::on_init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Serial id allocated for this session.
    pub serial_id: SerialId,
    /// The template/view identifier.
    pub asset_name: String,
    /// The group the form is about to join.
    pub group_name: String,
    /// Caller-supplied discriminator, already normalized (`None` for empty).
    pub instance_key: Option<String>,
    /// The policy this session was opened under.
    pub open_policy: OpenPolicy,
    /// `true` for a freshly loaded instance, `false` for a cache revival.
    pub new_instance: bool,
}

/// Lifecycle hooks for one form instance.
///
/// All hooks default to no-ops. Hooks never receive a reference back into
/// the manager, so they cannot re-enter it; side effects that need the
/// manager are deferred to the host's own update loop.
pub trait FormLogic {
    /// The form is about to be (re)opened; session context is bound.
    fn on_init(&mut self, info: &SessionInfo) {
        let _ = info;
    }

    /// The form joined its group and became interactive.
    fn on_open(&mut self) {}

    /// The session ended. `is_shutdown` is `true` during manager teardown.
    fn on_close(&mut self, is_shutdown: bool) {
        let _ = is_shutdown;
    }

    /// The instance is being destroyed. Called at most once.
    fn on_release(&mut self) {}

    /// Another form was stacked on top of this one.
    fn on_cover(&mut self) {}

    /// The form on top of this one went away.
    fn on_reveal(&mut self) {}

    /// A covering form requested that covered forms pause.
    fn on_pause(&mut self) {}

    /// The pause condition lifted.
    fn on_resume(&mut self) {}

    /// Per-frame tick while opened and not paused.
    fn on_update(&mut self) {}

    /// The form's depth within its group changed.
    ///
    /// `group_count` is the number of forms currently in the group and
    /// `depth` the form's position from the top (0 = topmost).
    fn on_depth_changed(&mut self, group_count: usize, depth: usize) {
        let _ = (group_count, depth);
    }

    /// The form was moved back to the top of its group without reopening.
    fn on_refocus(&mut self) {}
}

/// A behavior that does nothing. Useful as a placeholder template behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogic;

impl FormLogic for NoopLogic {}
