#![forbid(unsafe_code)]

//! Test doubles for exercising the manager without a real asset backend.
//!
//! - [`ScriptedStore`] - an [`AssetStore`] whose completions the test
//!   releases explicitly, so load timing (and therefore coalescing,
//!   failure, and shutdown-orphan behavior) is fully deterministic.
//! - [`RecordingLogic`] - a [`FormLogic`] that appends every hook
//!   invocation to a shared [`SharedEvents`] log.
//!
//! These live in the library (not behind `cfg(test)`) so integration tests
//! and downstream crates can drive the same scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use formic_core::{AssetStore, FormLogic, LoadCompletion, LoadTicket, LoadedAsset, SessionInfo};

/// One recorded hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicEvent {
    /// `on_init`, with the session's `new_instance` flag.
    Init { new_instance: bool },
    /// `on_open`.
    Open,
    /// `on_close`, with the shutdown flag.
    Close { is_shutdown: bool },
    /// `on_release`.
    Release,
    /// `on_cover`.
    Cover,
    /// `on_reveal`.
    Reveal,
    /// `on_pause`.
    Pause,
    /// `on_resume`.
    Resume,
    /// `on_update`.
    Update,
    /// `on_depth_changed`.
    DepthChanged { count: usize, depth: usize },
    /// `on_refocus`.
    Refocus,
}

/// Shared, labeled log of hook invocations across many logics.
#[derive(Default, Clone)]
pub struct SharedEvents {
    entries: Rc<RefCell<Vec<(String, LogicEvent)>>>,
}

impl SharedEvents {
    /// A fresh, empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, label: &str, event: LogicEvent) {
        self.entries.borrow_mut().push((label.to_string(), event));
    }

    /// Whether the labeled logic recorded this event at least once.
    pub fn contains(&self, label: &str, event: &LogicEvent) -> bool {
        self.count(label, event) > 0
    }

    /// How many times the labeled logic recorded this event.
    pub fn count(&self, label: &str, event: &LogicEvent) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, e)| l == label && e == event)
            .count()
    }

    /// All events recorded for a label, in order.
    pub fn for_label(&self, label: &str) -> Vec<LogicEvent> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| l == label)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Every recorded `(label, event)` pair, in order.
    pub fn all(&self) -> Vec<(String, LogicEvent)> {
        self.entries.borrow().clone()
    }
}

/// A behavior object that records every hook call.
pub struct RecordingLogic {
    label: String,
    events: SharedEvents,
}

impl RecordingLogic {
    /// A logic that records under `label` into the shared log.
    pub fn new(label: impl Into<String>, events: &SharedEvents) -> Self {
        Self {
            label: label.into(),
            events: events.clone(),
        }
    }

    /// Boxed convenience for [`ScriptedStore::succeed`].
    pub fn boxed(label: impl Into<String>, events: &SharedEvents) -> Box<dyn FormLogic> {
        Box::new(Self::new(label, events))
    }
}

impl FormLogic for RecordingLogic {
    fn on_init(&mut self, info: &SessionInfo) {
        self.events.push(
            &self.label,
            LogicEvent::Init {
                new_instance: info.new_instance,
            },
        );
    }

    fn on_open(&mut self) {
        self.events.push(&self.label, LogicEvent::Open);
    }

    fn on_close(&mut self, is_shutdown: bool) {
        self.events.push(&self.label, LogicEvent::Close { is_shutdown });
    }

    fn on_release(&mut self) {
        self.events.push(&self.label, LogicEvent::Release);
    }

    fn on_cover(&mut self) {
        self.events.push(&self.label, LogicEvent::Cover);
    }

    fn on_reveal(&mut self) {
        self.events.push(&self.label, LogicEvent::Reveal);
    }

    fn on_pause(&mut self) {
        self.events.push(&self.label, LogicEvent::Pause);
    }

    fn on_resume(&mut self) {
        self.events.push(&self.label, LogicEvent::Resume);
    }

    fn on_update(&mut self) {
        self.events.push(&self.label, LogicEvent::Update);
    }

    fn on_depth_changed(&mut self, group_count: usize, depth: usize) {
        self.events.push(
            &self.label,
            LogicEvent::DepthChanged {
                count: group_count,
                depth,
            },
        );
    }

    fn on_refocus(&mut self) {
        self.events.push(&self.label, LogicEvent::Refocus);
    }
}

/// An asset store whose completions are released by the test.
///
/// `begin_load` parks the request as in-flight; nothing completes until
/// the test calls [`succeed`](Self::succeed) or [`fail`](Self::fail), and
/// the manager observes the completion on its next `update`.
#[derive(Default)]
pub struct ScriptedStore {
    next_ticket: LoadTicket,
    in_flight: Vec<(LoadTicket, String)>,
    completed: Vec<LoadCompletion>,
    loads_started: usize,
}

impl ScriptedStore {
    /// An empty store with no in-flight loads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total `begin_load` calls observed. The coalescing assertions hang
    /// off this number.
    pub fn loads_started(&self) -> usize {
        self.loads_started
    }

    /// Asset names currently in flight, oldest first.
    pub fn in_flight(&self) -> Vec<String> {
        self.in_flight.iter().map(|(_, a)| a.clone()).collect()
    }

    /// Complete the oldest in-flight load for `asset_name` successfully,
    /// attaching the given behavior object. Returns `false` if no such
    /// load is in flight.
    pub fn succeed(&mut self, asset_name: &str, logic: Box<dyn FormLogic>) -> bool {
        self.succeed_with(asset_name, Box::new(()), logic)
    }

    /// Like [`succeed`](Self::succeed) with an explicit template payload.
    pub fn succeed_with(
        &mut self,
        asset_name: &str,
        template: Box<dyn std::any::Any>,
        logic: Box<dyn FormLogic>,
    ) -> bool {
        let Some(pos) = self.in_flight.iter().position(|(_, a)| a == asset_name) else {
            return false;
        };
        let (ticket, asset_name) = self.in_flight.remove(pos);
        self.completed.push(LoadCompletion {
            ticket,
            asset_name,
            result: Ok(LoadedAsset { template, logic }),
        });
        true
    }

    /// Fail the oldest in-flight load for `asset_name` with a message.
    pub fn fail(&mut self, asset_name: &str, message: &str) -> bool {
        let Some(pos) = self.in_flight.iter().position(|(_, a)| a == asset_name) else {
            return false;
        };
        let (ticket, asset_name) = self.in_flight.remove(pos);
        self.completed.push(LoadCompletion {
            ticket,
            asset_name,
            result: Err(message.to_string()),
        });
        true
    }
}

impl AssetStore for ScriptedStore {
    fn begin_load(&mut self, asset_name: &str) -> LoadTicket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.loads_started += 1;
        self.in_flight.push((ticket, asset_name.to_string()));
        ticket
    }

    fn poll_completed(&mut self) -> Vec<LoadCompletion> {
        std::mem::take(&mut self.completed)
    }
}
