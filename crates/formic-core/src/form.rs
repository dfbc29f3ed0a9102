#![forbid(unsafe_code)]

//! The form entity: one instantiated view and its open-session state.
//!
//! A [`Form`] is created when an asset load completes and lives until it is
//! destroyed by cache eviction, a zero-capacity close, or manager shutdown.
//! Between sessions it may sit in the reuse cache; revival rebinds its
//! session context ([`Form::prepare_session`]) under a new serial id.
//!
//! # State machine
//!
//! ```text
//! created ──open──▶ opened ──close──▶ closed/cached ──prepare_session──▶ (reopen)
//!                                          │
//!                                       release ──▶ released (terminal)
//! ```
//!
//! Invariants:
//! - `released` implies not opened; a released form is never opened or
//!   cached again.
//! - while opened, `group_name` names the owning group and `serial_id` was
//!   allocated by the current session.
//! - while cached, `group_name` and `serial_id` are stale leftovers of the
//!   previous session.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::logic::{FormLogic, SessionInfo};

/// Session-scoped unique identifier for one open instance.
///
/// Reallocated every time an instance is taken from the reuse cache and
/// reopened; not a persistent identity.
pub type SerialId = u64;

/// Shared, single-threaded handle to a form.
///
/// The manager, the owning group, the reuse cache, and any number of
/// lookups all refer to the same instance; mutation happens on one logical
/// thread, so `Rc<RefCell<_>>` rather than locking.
pub type FormRef = Rc<RefCell<Form>>;

/// How many concurrent instances of a form asset may exist, and at what
/// scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpenPolicy {
    /// At most one instance of the asset across all groups.
    #[default]
    SingleInstanceGlobal,
    /// At most one instance of the asset per group.
    SingleInstancePerGroup,
    /// Every open creates (or revives) an independent instance.
    MultiInstanceGlobal,
}

/// Normalize a caller-supplied instance key: empty means "no key".
pub fn normalize_instance_key(key: Option<String>) -> Option<String> {
    key.filter(|k| !k.is_empty())
}

/// One instantiated, interactive view backed by a template and a behavior
/// object.
pub struct Form {
    serial_id: SerialId,
    asset_name: String,
    instance_key: Option<String>,
    open_policy: OpenPolicy,
    group_name: String,
    pause_covered_form: bool,
    depth_in_group: usize,
    last_focus_sequence: u64,
    template: Box<dyn Any>,
    logic: Box<dyn FormLogic>,
    opened: bool,
    released: bool,
}

impl Form {
    /// Construct a fresh instance for its first open session.
    ///
    /// The instance key is normalized; the form starts closed. The runtime
    /// fires `on_init` separately, before adding the form to its group.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        serial_id: SerialId,
        asset_name: impl Into<String>,
        group_name: impl Into<String>,
        open_policy: OpenPolicy,
        pause_covered_form: bool,
        instance_key: Option<String>,
        template: Box<dyn Any>,
        logic: Box<dyn FormLogic>,
    ) -> Self {
        Self {
            serial_id,
            asset_name: asset_name.into(),
            instance_key: normalize_instance_key(instance_key),
            open_policy,
            group_name: group_name.into(),
            pause_covered_form,
            depth_in_group: 0,
            last_focus_sequence: 0,
            template,
            logic,
            opened: false,
            released: false,
        }
    }

    /// Wrap a form into the shared handle the rest of the system passes
    /// around.
    pub fn into_ref(self) -> FormRef {
        Rc::new(RefCell::new(self))
    }

    // ── Session lifecycle ─────────────────────────────────────────

    /// Rebind session context for a revival out of the reuse cache.
    ///
    /// Allocates nothing itself: the caller supplies the freshly allocated
    /// serial id. Transient focus/depth state is reset; the template and
    /// behavior object are retained from the previous session.
    pub fn prepare_session(
        &mut self,
        serial_id: SerialId,
        group_name: impl Into<String>,
        open_policy: OpenPolicy,
        pause_covered_form: bool,
        instance_key: Option<String>,
    ) {
        debug_assert!(!self.released, "released forms must never be revived");
        debug_assert!(!self.opened, "cached forms must never be opened");
        self.serial_id = serial_id;
        self.group_name = group_name.into();
        self.open_policy = open_policy;
        self.pause_covered_form = pause_covered_form;
        self.instance_key = normalize_instance_key(instance_key);
        self.depth_in_group = 0;
        self.last_focus_sequence = 0;
    }

    /// Replace the behavior object for the next session, returning the old
    /// one.
    pub fn replace_logic(&mut self, logic: Box<dyn FormLogic>) -> Box<dyn FormLogic> {
        std::mem::replace(&mut self.logic, logic)
    }

    /// Mark the form opened and fire `on_open`.
    pub fn open(&mut self) {
        debug_assert!(!self.released);
        self.opened = true;
        self.logic.on_open();
    }

    /// Mark the form closed and fire `on_close`.
    pub fn close(&mut self, is_shutdown: bool) {
        self.opened = false;
        self.logic.on_close(is_shutdown);
    }

    /// Destroy the instance. Idempotent: `on_release` fires at most once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.opened = false;
        self.logic.on_release();
    }

    // ── Hook pass-throughs (driven by the group and the frame pump) ──

    /// Fire `on_init` with this form's current session context.
    pub fn on_init(&mut self, new_instance: bool) {
        let info = self.session_info(new_instance);
        self.logic.on_init(&info);
    }

    /// Fire `on_cover`.
    pub fn on_cover(&mut self) {
        self.logic.on_cover();
    }

    /// Fire `on_reveal`.
    pub fn on_reveal(&mut self) {
        self.logic.on_reveal();
    }

    /// Fire `on_pause`.
    pub fn on_pause(&mut self) {
        self.logic.on_pause();
    }

    /// Fire `on_resume`.
    pub fn on_resume(&mut self) {
        self.logic.on_resume();
    }

    /// Fire `on_update`.
    pub fn on_update(&mut self) {
        self.logic.on_update();
    }

    /// Fire `on_refocus`.
    pub fn on_refocus(&mut self) {
        self.logic.on_refocus();
    }

    /// Record the form's depth within its group, firing `on_depth_changed`
    /// when the depth actually changed.
    pub fn set_depth_in_group(&mut self, group_count: usize, depth: usize) {
        if self.depth_in_group == depth {
            return;
        }
        self.depth_in_group = depth;
        self.logic.on_depth_changed(group_count, depth);
    }

    /// Record the focus sequence assigned by the manager.
    pub fn set_focus_sequence(&mut self, sequence: u64) {
        self.last_focus_sequence = sequence;
    }

    // ── Accessors ─────────────────────────────────────────────────

    /// Serial id of the current (or, while cached, previous) session.
    pub fn serial_id(&self) -> SerialId {
        self.serial_id
    }

    /// The template/view identifier. Immutable after creation.
    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    /// Normalized caller-supplied discriminator.
    pub fn instance_key(&self) -> Option<&str> {
        self.instance_key.as_deref()
    }

    /// The policy this session was opened under.
    pub fn open_policy(&self) -> OpenPolicy {
        self.open_policy
    }

    /// Owning group name while opened; stale while cached.
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Whether covered forms should pause while this one is on top.
    pub fn pause_covered_form(&self) -> bool {
        self.pause_covered_form
    }

    /// Position from the top of the owning group (0 = topmost).
    pub fn depth_in_group(&self) -> usize {
        self.depth_in_group
    }

    /// Monotonic recency-of-interaction rank; higher is more recent.
    pub fn last_focus_sequence(&self) -> u64 {
        self.last_focus_sequence
    }

    /// Opaque template payload delivered by the asset store.
    pub fn template(&self) -> &dyn Any {
        self.template.as_ref()
    }

    /// Mutable access to the template payload.
    pub fn template_mut(&mut self) -> &mut dyn Any {
        self.template.as_mut()
    }

    /// True between a successful open and a successful close.
    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Terminal flag: once true, the form is never opened or cached again.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Current session context, as passed to `on_init`.
    pub fn session_info(&self, new_instance: bool) -> SessionInfo {
        SessionInfo {
            serial_id: self.serial_id,
            asset_name: self.asset_name.clone(),
            group_name: self.group_name.clone(),
            instance_key: self.instance_key.clone(),
            open_policy: self.open_policy,
            new_instance,
        }
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("serial_id", &self.serial_id)
            .field("asset_name", &self.asset_name)
            .field("group_name", &self.group_name)
            .field("open_policy", &self.open_policy)
            .field("instance_key", &self.instance_key)
            .field("opened", &self.opened)
            .field("released", &self.released)
            .finish()
    }
}
