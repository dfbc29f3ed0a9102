#![forbid(unsafe_code)]

//! The form manager: open/close/refocus orchestration, request
//! coalescing, the reuse cache, and the active-instance indices.
//!
//! An open request resolves against, in priority order:
//!
//! 1. an already-active instance satisfying the request's policy,
//! 2. an in-flight load sharing the request's dedup key,
//! 3. the reuse cache,
//! 4. a fresh asynchronous load.
//!
//! All state mutation happens on the thread that owns the manager; load
//! completions are observed only through [`FormManager::update`], which
//! drains the asset store on that same thread. There is no mid-load
//! cancellation: a load always runs to completion and its result is
//! delivered (or, after shutdown, dropped) rather than leaking a pending
//! handle.
//!
//! Expected failures never panic: validation problems come back as a
//! synchronously failed [`OpenHandle`], structural-invariant violations
//! log at error level and become no-ops.

use std::collections::{BTreeMap, HashMap};

use formic_core::{
    AssetStore, Form, FormError, FormRef, Group, LoadCompletion, LoadTicket, OpenHandle,
    OpenPolicy, SerialId, normalize_instance_key,
};

use crate::cache::ReuseCache;
use crate::config::ManagerConfig;
use crate::registry::ActiveRegistry;

/// One open request.
///
/// `asset_name` and `group_name` are required and must reference a
/// registered group; everything else defaults.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    /// The template/view identifier to load or revive.
    pub asset_name: String,
    /// The group the form will join. Must be registered.
    pub group_name: String,
    /// Concurrency policy for this session.
    pub open_policy: OpenPolicy,
    /// Whether forms covered by this one should pause.
    pub pause_covered_form: bool,
    /// Caller-supplied discriminator; empty means none.
    pub instance_key: Option<String>,
    /// When the request matches an already-active instance, move it to the
    /// top of its group instead of leaving the stack untouched.
    pub refocus_if_exists: bool,
}

impl OpenRequest {
    /// A request with default policy (`SingleInstanceGlobal`), no pause,
    /// no instance key, and refocus-on-match enabled.
    pub fn new(asset_name: impl Into<String>, group_name: impl Into<String>) -> Self {
        Self {
            asset_name: asset_name.into(),
            group_name: group_name.into(),
            open_policy: OpenPolicy::default(),
            pause_covered_form: false,
            instance_key: None,
            refocus_if_exists: true,
        }
    }

    /// Set the open policy.
    pub fn with_policy(mut self, policy: OpenPolicy) -> Self {
        self.open_policy = policy;
        self
    }

    /// Pause the forms this one covers.
    pub fn pause_covered(mut self) -> Self {
        self.pause_covered_form = true;
        self
    }

    /// Attach an instance key.
    pub fn with_instance_key(mut self, key: impl Into<String>) -> Self {
        self.instance_key = Some(key.into());
        self
    }

    /// Leave an already-active match where it is instead of refocusing it.
    pub fn without_refocus(mut self) -> Self {
        self.refocus_if_exists = false;
        self
    }
}

/// Identifier coalescing concurrent open requests that must not trigger
/// duplicate loads. `MultiInstanceGlobal` requests never carry one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// One load per asset, across all groups.
    Global(String),
    /// One load per (asset, group).
    PerGroup {
        /// The asset name.
        asset: String,
        /// The group name.
        group: String,
    },
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupKey::Global(asset) => write!(f, "{asset}"),
            DedupKey::PerGroup { asset, group } => write!(f, "{asset}@{group}"),
        }
    }
}

struct PendingOpen {
    serial_id: SerialId,
    request: OpenRequest,
    dedup: Option<DedupKey>,
    handle: OpenHandle,
}

/// Read-only copy of one active instance, safe for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    /// Serial id of the current session.
    pub serial_id: SerialId,
    /// The template/view identifier.
    pub asset_name: String,
    /// The owning group.
    pub group_name: String,
    /// The policy the session was opened under.
    pub open_policy: OpenPolicy,
    /// Normalized instance key.
    pub instance_key: Option<String>,
    /// Position from the top of the group (0 = topmost).
    pub depth_in_group: usize,
    /// Recency-of-interaction rank.
    pub last_focus_sequence: u64,
}

/// Read-only copy of one cached instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFormSnapshot {
    /// The template/view identifier.
    pub asset_name: String,
    /// Serial id of the session that closed into the cache. Stale: the
    /// next revival allocates a new one.
    pub previous_serial_id: SerialId,
}

/// Read-only copy of one in-flight load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSnapshot {
    /// The asset being loaded.
    pub asset_name: String,
    /// Serial id already allocated for the session.
    pub serial_id: SerialId,
    /// Rendered dedup key, if the request coalesces.
    pub dedup_key: Option<String>,
}

/// The core orchestrator. Owns the group registry, the reuse cache, the
/// active-instance indices, the in-flight-request map, and the monotonic
/// serial/focus counters.
pub struct FormManager<S: AssetStore> {
    store: S,
    groups: BTreeMap<String, Box<dyn Group>>,
    registry: ActiveRegistry,
    cache: ReuseCache,
    cache_capacity: usize,
    pending: HashMap<LoadTicket, PendingOpen>,
    pending_by_key: HashMap<DedupKey, LoadTicket>,
    /// Next serial id to hand out. Only ever raised.
    serial_counter: SerialId,
    /// Last focus sequence handed out. Only ever raised.
    focus_counter: u64,
    shut_down: bool,
}

impl<S: AssetStore> FormManager<S> {
    /// A manager with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ManagerConfig::default())
    }

    /// A manager with the given configuration.
    pub fn with_config(store: S, config: ManagerConfig) -> Self {
        Self {
            store,
            groups: BTreeMap::new(),
            registry: ActiveRegistry::new(),
            cache: ReuseCache::new(),
            cache_capacity: config.cache_capacity,
            pending: HashMap::new(),
            pending_by_key: HashMap::new(),
            serial_counter: config.start_of_serial_id,
            focus_counter: 0,
            shut_down: false,
        }
    }

    /// The asset store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the asset store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ── Groups ────────────────────────────────────────────────────

    /// Register a group under its own name. Names are unique.
    pub fn add_group(&mut self, group: Box<dyn Group>) -> Result<(), FormError> {
        let name = group.name().to_string();
        if name.is_empty() {
            return Err(FormError::EmptyGroupName);
        }
        if self.groups.contains_key(&name) {
            return Err(FormError::DuplicateGroup(name));
        }
        self.groups.insert(name, group);
        Ok(())
    }

    /// Whether a group with this name is registered.
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Registered group names, sorted.
    pub fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    /// Read-only access to a group.
    pub fn group(&self, name: &str) -> Option<&dyn Group> {
        self.groups.get(name).map(|g| g.as_ref())
    }

    // ── Open ──────────────────────────────────────────────────────

    /// Resolve an open request.
    ///
    /// Never panics for expected failures: validation problems return a
    /// synchronously failed handle carrying the message.
    pub fn open(&mut self, mut request: OpenRequest) -> OpenHandle {
        if self.shut_down {
            return OpenHandle::failed(FormError::ShutDown.to_string());
        }
        if request.asset_name.is_empty() {
            return OpenHandle::failed(FormError::EmptyAssetName.to_string());
        }
        if request.group_name.is_empty() {
            return OpenHandle::failed(FormError::EmptyGroupName.to_string());
        }
        if !self.groups.contains_key(&request.group_name) {
            return OpenHandle::failed(
                FormError::UnknownGroup(request.group_name.clone()).to_string(),
            );
        }
        request.instance_key = normalize_instance_key(request.instance_key.take());

        // 1. Already-active instance satisfying the policy.
        if let Some(form) = self.active_match(&request) {
            self.warn_on_context_mismatch(&form, &request);
            if request.refocus_if_exists {
                self.refocus_form(&form);
            }
            return OpenHandle::ready(form);
        }

        // 2. In-flight load under the same dedup key.
        let dedup = Self::dedup_key(&request);
        if let Some(key) = &dedup
            && let Some(ticket) = self.pending_by_key.get(key)
            && let Some(pending) = self.pending.get(ticket)
        {
            tracing::debug!(
                target: "formic.manager",
                asset = %request.asset_name,
                dedup_key = %key,
                "coalescing open into in-flight load"
            );
            return pending.handle.clone();
        }

        // 3. Reuse cache.
        if let Some(form) = self.cache.take_by_asset(&request.asset_name) {
            let serial_id = self.alloc_serial();
            {
                let mut f = form.borrow_mut();
                f.prepare_session(
                    serial_id,
                    request.group_name.clone(),
                    request.open_policy,
                    request.pause_covered_form,
                    request.instance_key.clone(),
                );
                f.on_init(false);
            }
            tracing::debug!(
                target: "formic.manager",
                asset = %request.asset_name,
                serial_id,
                "revived form from cache"
            );
            if !self.finish_open(&form) {
                return OpenHandle::failed(
                    FormError::UnknownGroup(request.group_name.clone()).to_string(),
                );
            }
            return OpenHandle::ready(form);
        }

        // 4. Fresh asynchronous load.
        let serial_id = self.alloc_serial();
        let ticket = self.store.begin_load(&request.asset_name);
        let handle = OpenHandle::pending();
        if let Some(key) = dedup.clone() {
            self.pending_by_key.insert(key, ticket);
        }
        tracing::debug!(
            target: "formic.manager",
            asset = %request.asset_name,
            serial_id,
            ticket,
            "started asset load"
        );
        self.pending.insert(
            ticket,
            PendingOpen {
                serial_id,
                request,
                dedup,
                handle: handle.clone(),
            },
        );
        handle
    }

    // ── Close ─────────────────────────────────────────────────────

    /// Close by serial id (canonical).
    pub fn close(&mut self, serial_id: SerialId) {
        let Some(form) = self.registry.get(serial_id) else {
            tracing::error!(
                target: "formic.manager",
                serial_id,
                "close: no active instance with this serial id"
            );
            return;
        };
        self.close_form(&form);
    }

    /// Close the topmost active instance of this asset.
    pub fn close_by_asset(&mut self, asset_name: &str) {
        let matches = self.registry.forms_by_asset(asset_name);
        let Some(form) = Self::topmost(&matches) else {
            tracing::error!(
                target: "formic.manager",
                asset = %asset_name,
                "close: no active instance of this asset"
            );
            return;
        };
        self.close_form(&form);
    }

    /// Close the topmost active instance of this asset with this instance
    /// key (empty key means "no key").
    pub fn close_by_key(&mut self, asset_name: &str, instance_key: &str) {
        let key = normalize_instance_key(Some(instance_key.to_string()));
        let matches: Vec<FormRef> = self
            .registry
            .forms_by_asset(asset_name)
            .into_iter()
            .filter(|f| f.borrow().instance_key() == key.as_deref())
            .collect();
        let Some(form) = Self::topmost(&matches) else {
            tracing::error!(
                target: "formic.manager",
                asset = %asset_name,
                instance_key = ?key,
                "close: no active instance with this key"
            );
            return;
        };
        self.close_form(&form);
    }

    // ── Refocus ───────────────────────────────────────────────────

    /// Move an opened instance to the top of its group's interaction
    /// stack and bump its focus sequence, without reopening it.
    pub fn refocus(&mut self, serial_id: SerialId) {
        let Some(form) = self.registry.get(serial_id) else {
            tracing::error!(
                target: "formic.manager",
                serial_id,
                "refocus: no active instance with this serial id"
            );
            return;
        };
        if self.validate_registered(&form, "refocus") {
            self.refocus_form(&form);
        }
    }

    /// Refocus the topmost active instance of this asset.
    pub fn refocus_by_asset(&mut self, asset_name: &str) {
        let matches = self.registry.forms_by_asset(asset_name);
        let Some(form) = Self::topmost(&matches) else {
            tracing::error!(
                target: "formic.manager",
                asset = %asset_name,
                "refocus: no active instance of this asset"
            );
            return;
        };
        if self.validate_registered(&form, "refocus") {
            self.refocus_form(&form);
        }
    }

    // ── Frame pump ────────────────────────────────────────────────

    /// Drain finished loads and tick opened forms.
    ///
    /// Called once per host frame. Completions are delivered here and
    /// nowhere else, so all mutation stays on the owning thread.
    pub fn update(&mut self) {
        for completion in self.store.poll_completed() {
            self.finish_load(completion);
        }
        for group in self.groups.values_mut() {
            group.update();
        }
    }

    // ── Shutdown ──────────────────────────────────────────────────

    /// Tear the manager down: force-close every active instance with the
    /// shutdown flag, release everything, fail pending handles, clear all
    /// tracking.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        tracing::debug!(
            target: "formic.manager",
            active = self.registry.len(),
            cached = self.cache.len(),
            pending = self.pending.len(),
            "shutting down"
        );
        for group in self.groups.values_mut() {
            group.remove_and_close_all(true);
        }
        for form in self.registry.drain() {
            form.borrow_mut().release();
        }
        for form in self.cache.drain_all() {
            form.borrow_mut().release();
        }
        for (_, pending) in self.pending.drain() {
            pending.handle.fail(FormError::ShutDown.to_string());
        }
        self.pending_by_key.clear();
        self.groups.clear();
        self.shut_down = true;
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    // ── Configuration ─────────────────────────────────────────────

    /// Current reuse-cache capacity.
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    /// Change the cache capacity. A decrease evicts immediately.
    pub fn set_cache_capacity(&mut self, capacity: usize) {
        self.cache_capacity = capacity;
        self.evict_over_capacity();
    }

    /// Raise the serial-id floor. Attempts to lower it are ignored so
    /// serial ids never collide.
    pub fn raise_serial_floor(&mut self, floor: SerialId) {
        if floor > self.serial_counter {
            self.serial_counter = floor;
        } else if floor < self.serial_counter {
            tracing::warn!(
                target: "formic.manager",
                requested = floor,
                current = self.serial_counter,
                "ignoring attempt to lower the serial-id floor"
            );
        }
    }

    /// Apply a (re)loaded configuration with hot-reload semantics.
    pub fn apply_config(&mut self, config: &ManagerConfig) {
        self.set_cache_capacity(config.cache_capacity);
        self.raise_serial_floor(config.start_of_serial_id);
    }

    // ── Lookups ───────────────────────────────────────────────────

    /// Look up an active instance by serial id.
    pub fn form(&self, serial_id: SerialId) -> Option<FormRef> {
        self.registry.get(serial_id)
    }

    /// The topmost active instance of this asset, if any.
    pub fn form_by_asset(&self, asset_name: &str) -> Option<FormRef> {
        Self::topmost(&self.registry.forms_by_asset(asset_name))
    }

    /// Every active instance of this asset.
    pub fn forms_by_asset(&self, asset_name: &str) -> Vec<FormRef> {
        self.registry.forms_by_asset(asset_name)
    }

    /// The topmost active instance of this asset in this group.
    pub fn form_in_group(&self, asset_name: &str, group_name: &str) -> Option<FormRef> {
        Self::topmost(&self.registry.forms_by_asset_and_group(asset_name, group_name))
    }

    /// The topmost active instance of this asset with this instance key.
    pub fn form_by_key(&self, asset_name: &str, instance_key: &str) -> Option<FormRef> {
        let key = normalize_instance_key(Some(instance_key.to_string()));
        let matches: Vec<FormRef> = self
            .registry
            .forms_by_asset(asset_name)
            .into_iter()
            .filter(|f| f.borrow().instance_key() == key.as_deref())
            .collect();
        Self::topmost(&matches)
    }

    /// Number of currently active instances.
    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of cached instances.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Number of in-flight loads.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // ── Diagnostic snapshots ──────────────────────────────────────

    /// Copies of every active instance, sorted by serial id.
    pub fn active_snapshot(&self) -> Vec<FormSnapshot> {
        let mut out: Vec<FormSnapshot> = self
            .registry
            .iter()
            .map(|(_, form)| {
                let f = form.borrow();
                FormSnapshot {
                    serial_id: f.serial_id(),
                    asset_name: f.asset_name().to_string(),
                    group_name: f.group_name().to_string(),
                    open_policy: f.open_policy(),
                    instance_key: f.instance_key().map(ToString::to_string),
                    depth_in_group: f.depth_in_group(),
                    last_focus_sequence: f.last_focus_sequence(),
                }
            })
            .collect();
        out.sort_by_key(|s| s.serial_id);
        out
    }

    /// Copies of every cached instance, most recently cached first.
    pub fn cache_snapshot(&self) -> Vec<CachedFormSnapshot> {
        self.cache
            .iter()
            .map(|form| {
                let f = form.borrow();
                CachedFormSnapshot {
                    asset_name: f.asset_name().to_string(),
                    previous_serial_id: f.serial_id(),
                }
            })
            .collect()
    }

    /// Copies of every in-flight load, sorted by serial id.
    pub fn pending_snapshot(&self) -> Vec<PendingSnapshot> {
        let mut out: Vec<PendingSnapshot> = self
            .pending
            .values()
            .map(|p| PendingSnapshot {
                asset_name: p.request.asset_name.clone(),
                serial_id: p.serial_id,
                dedup_key: p.dedup.as_ref().map(ToString::to_string),
            })
            .collect();
        out.sort_by_key(|s| s.serial_id);
        out
    }

    /// Rendered dedup keys of in-flight loads, sorted.
    pub fn pending_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.pending_by_key.keys().map(ToString::to_string).collect();
        keys.sort();
        keys
    }

    // ── Internal helpers ──────────────────────────────────────────

    fn alloc_serial(&mut self) -> SerialId {
        let serial_id = self.serial_counter;
        self.serial_counter += 1;
        serial_id
    }

    fn next_focus(&mut self) -> u64 {
        self.focus_counter += 1;
        self.focus_counter
    }

    fn dedup_key(request: &OpenRequest) -> Option<DedupKey> {
        match request.open_policy {
            OpenPolicy::SingleInstanceGlobal => {
                Some(DedupKey::Global(request.asset_name.clone()))
            }
            OpenPolicy::SingleInstancePerGroup => Some(DedupKey::PerGroup {
                asset: request.asset_name.clone(),
                group: request.group_name.clone(),
            }),
            OpenPolicy::MultiInstanceGlobal => None,
        }
    }

    /// Greatest `(last_focus_sequence, serial_id)` wins.
    fn topmost(forms: &[FormRef]) -> Option<FormRef> {
        forms
            .iter()
            .max_by_key(|f| {
                let b = f.borrow();
                (b.last_focus_sequence(), b.serial_id())
            })
            .cloned()
    }

    fn active_match(&self, request: &OpenRequest) -> Option<FormRef> {
        let matches = match request.open_policy {
            OpenPolicy::SingleInstanceGlobal => self.registry.forms_by_asset(&request.asset_name),
            OpenPolicy::SingleInstancePerGroup => self
                .registry
                .forms_by_asset_and_group(&request.asset_name, &request.group_name),
            OpenPolicy::MultiInstanceGlobal => Vec::new(),
        };
        if matches.len() > 1 {
            tracing::error!(
                target: "formic.manager",
                asset = %request.asset_name,
                count = matches.len(),
                "multiple active instances under a singleton policy; \
                 resolving to the most recently focused"
            );
        }
        Self::topmost(&matches)
    }

    fn warn_on_context_mismatch(&self, form: &FormRef, request: &OpenRequest) {
        let f = form.borrow();
        let group_differs = f.group_name() != request.group_name;
        let pause_differs = f.pause_covered_form() != request.pause_covered_form;
        let key_differs = f.instance_key() != request.instance_key.as_deref();
        if group_differs || pause_differs || key_differs {
            tracing::warn!(
                target: "formic.manager",
                serial_id = f.serial_id(),
                asset = %f.asset_name(),
                existing_group = %f.group_name(),
                requested_group = %request.group_name,
                "open matched an active instance; differing request context is ignored"
            );
        }
    }

    /// Add a prepared form to its group, register it, and focus it.
    /// Returns `false` (after failing defensively) if the group vanished.
    fn finish_open(&mut self, form: &FormRef) -> bool {
        let group_name = form.borrow().group_name().to_string();
        let focus = self.next_focus();
        let Some(group) = self.groups.get_mut(&group_name) else {
            tracing::warn!(
                target: "formic.manager",
                group = %group_name,
                serial_id = form.borrow().serial_id(),
                "group disappeared before the form could join it"
            );
            return false;
        };
        group.add_and_open(form);
        self.registry.register(form);
        form.borrow_mut().set_focus_sequence(focus);
        group.refresh();
        true
    }

    fn finish_load(&mut self, completion: LoadCompletion) {
        let Some(pending) = self.pending.remove(&completion.ticket) else {
            tracing::warn!(
                target: "formic.manager",
                asset = %completion.asset_name,
                ticket = completion.ticket,
                shut_down = self.shut_down,
                "load completed with no pending request; dropping"
            );
            return;
        };
        if let Some(key) = &pending.dedup {
            self.pending_by_key.remove(key);
        }
        match completion.result {
            Ok(asset) => {
                let form = Form::new(
                    pending.serial_id,
                    pending.request.asset_name.clone(),
                    pending.request.group_name.clone(),
                    pending.request.open_policy,
                    pending.request.pause_covered_form,
                    pending.request.instance_key.clone(),
                    asset.template,
                    asset.logic,
                )
                .into_ref();
                form.borrow_mut().on_init(true);
                if !self.finish_open(&form) {
                    pending.handle.fail(
                        FormError::UnknownGroup(pending.request.group_name.clone()).to_string(),
                    );
                    return;
                }
                tracing::debug!(
                    target: "formic.manager",
                    asset = %pending.request.asset_name,
                    serial_id = pending.serial_id,
                    "load completed; form opened"
                );
                pending.handle.complete(form);
            }
            Err(message) => {
                tracing::debug!(
                    target: "formic.manager",
                    asset = %pending.request.asset_name,
                    serial_id = pending.serial_id,
                    error = %message,
                    "load failed"
                );
                pending.handle.fail(message);
            }
        }
    }

    /// Validate the structural invariants before a close/refocus:
    /// not released, opened, and actually present in its recorded group.
    fn validate_registered(&self, form: &FormRef, operation: &str) -> bool {
        let f = form.borrow();
        if f.is_released() {
            tracing::error!(
                target: "formic.manager",
                serial_id = f.serial_id(),
                "{operation}: form is released"
            );
            return false;
        }
        if !f.is_opened() {
            tracing::error!(
                target: "formic.manager",
                serial_id = f.serial_id(),
                "{operation}: form is not opened"
            );
            return false;
        }
        let in_group = self
            .groups
            .get(f.group_name())
            .is_some_and(|g| g.has_form(f.serial_id()));
        if !in_group {
            tracing::error!(
                target: "formic.manager",
                serial_id = f.serial_id(),
                group = %f.group_name(),
                "{operation}: form's recorded group does not contain it"
            );
            return false;
        }
        true
    }

    fn close_form(&mut self, form: &FormRef) {
        if !self.validate_registered(form, "close") {
            return;
        }
        let (serial_id, group_name) = {
            let f = form.borrow();
            (f.serial_id(), f.group_name().to_string())
        };
        if let Some(group) = self.groups.get_mut(&group_name) {
            group.remove_and_close(form);
            group.refresh();
        }
        self.registry.unregister(serial_id);
        if self.cache_capacity > 0 {
            self.cache.insert_front(form.clone());
            self.evict_over_capacity();
        } else {
            form.borrow_mut().release();
        }
        tracing::debug!(
            target: "formic.manager",
            serial_id,
            group = %group_name,
            cached = self.cache_capacity > 0,
            "form closed"
        );
    }

    /// Move an opened form to the top of its group and bump its focus.
    /// Caller has already validated the structural invariants.
    fn refocus_form(&mut self, form: &FormRef) {
        let group_name = form.borrow().group_name().to_string();
        let focus = self.next_focus();
        if let Some(group) = self.groups.get_mut(&group_name) {
            group.refocus(form);
            {
                let mut f = form.borrow_mut();
                f.set_focus_sequence(focus);
                f.on_refocus();
            }
            group.refresh();
        }
    }

    fn evict_over_capacity(&mut self) {
        for form in self.cache.trim_to(self.cache_capacity) {
            tracing::debug!(
                target: "formic.manager",
                asset = %form.borrow().asset_name(),
                "evicting form from cache"
            );
            form.borrow_mut().release();
        }
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &ActiveRegistry {
        &self.registry
    }
}

impl<S: AssetStore> std::fmt::Debug for FormManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormManager")
            .field("groups", &self.groups.len())
            .field("active", &self.registry.len())
            .field("cached", &self.cache.len())
            .field("pending", &self.pending.len())
            .field("shut_down", &self.shut_down)
            .finish()
    }
}
