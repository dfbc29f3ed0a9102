#![forbid(unsafe_code)]

//! Reference [`Group`] implementation: a plain interaction stack.
//!
//! The policy is the simplest faithful one:
//!
//! - the stack front is the topmost, focused form;
//! - every form below the top is *covered*;
//! - a form is *paused* while any form above it was opened with
//!   `pause_covered_form`;
//! - `update` ticks opened, unpaused forms only.
//!
//! Cover/pause state lives here, per slot, not on the form: it is a
//! property of the stack arrangement, and it is what lets `refresh` fire
//! `on_cover`/`on_reveal`/`on_pause`/`on_resume` exactly on transitions.
//!
//! Hosts with richer stacking rules (modal layers, transparency, shared
//! depth ranges) implement [`Group`] themselves; the manager only requires
//! the trait.

use std::rc::Rc;

use formic_core::{FormRef, Group, SerialId};

struct Slot {
    form: FormRef,
    paused: bool,
    covered: bool,
}

/// A named stack of opened forms, front = topmost.
pub struct StackGroup {
    name: String,
    slots: Vec<Slot>,
}

impl StackGroup {
    /// An empty group with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
        }
    }

    fn position_of(&self, form: &FormRef) -> Option<usize> {
        self.slots.iter().position(|s| Rc::ptr_eq(&s.form, form))
    }
}

impl Group for StackGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_form(&self, serial_id: SerialId) -> bool {
        self.slots
            .iter()
            .any(|s| s.form.borrow().serial_id() == serial_id)
    }

    fn add_and_open(&mut self, form: &FormRef) {
        if self.position_of(form).is_some() {
            tracing::error!(
                target: "formic.group",
                group = %self.name,
                serial_id = form.borrow().serial_id(),
                "form added to group twice; ignoring"
            );
            return;
        }
        self.slots.insert(
            0,
            Slot {
                form: form.clone(),
                paused: false,
                covered: false,
            },
        );
        form.borrow_mut().open();
    }

    fn remove_and_close(&mut self, form: &FormRef) {
        let Some(pos) = self.position_of(form) else {
            tracing::error!(
                target: "formic.group",
                group = %self.name,
                serial_id = form.borrow().serial_id(),
                "form not in group; close skipped"
            );
            return;
        };
        self.slots.remove(pos);
        form.borrow_mut().close(false);
    }

    fn remove_and_close_all(&mut self, is_shutdown: bool) {
        // Topmost first, matching the visual stacking order.
        for slot in self.slots.drain(..) {
            slot.form.borrow_mut().close(is_shutdown);
        }
    }

    fn refocus(&mut self, form: &FormRef) {
        if let Some(pos) = self.position_of(form) {
            let slot = self.slots.remove(pos);
            self.slots.insert(0, slot);
        }
    }

    fn refresh(&mut self) {
        let count = self.slots.len();
        let mut pause_below = false;
        for (depth, slot) in self.slots.iter_mut().enumerate() {
            let covered = depth > 0;
            let paused = pause_below;
            {
                let mut form = slot.form.borrow_mut();
                form.set_depth_in_group(count, depth);
                if paused != slot.paused {
                    if paused {
                        form.on_pause();
                    } else {
                        form.on_resume();
                    }
                }
                if covered != slot.covered {
                    if covered {
                        form.on_cover();
                    } else {
                        form.on_reveal();
                    }
                }
                if form.pause_covered_form() {
                    pause_below = true;
                }
            }
            slot.paused = paused;
            slot.covered = covered;
        }
    }

    fn update(&mut self) {
        for slot in &self.slots {
            if slot.paused {
                continue;
            }
            let mut form = slot.form.borrow_mut();
            if form.is_opened() {
                form.on_update();
            }
        }
    }

    fn forms(&self) -> Vec<FormRef> {
        self.slots.iter().map(|s| s.form.clone()).collect()
    }
}

impl std::fmt::Debug for StackGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackGroup")
            .field("name", &self.name)
            .field("forms", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{LogicEvent, RecordingLogic, SharedEvents};
    use formic_core::{Form, OpenPolicy};

    fn recorded_form(
        serial: SerialId,
        asset: &str,
        pause_covered: bool,
        events: &SharedEvents,
    ) -> FormRef {
        Form::new(
            serial,
            asset,
            "Main",
            OpenPolicy::MultiInstanceGlobal,
            pause_covered,
            None,
            Box::new(()),
            Box::new(RecordingLogic::new(asset, events)),
        )
        .into_ref()
    }

    #[test]
    fn add_and_open_opens_at_the_top() {
        let events = SharedEvents::default();
        let mut group = StackGroup::new("Main");
        let a = recorded_form(1, "A", false, &events);
        let b = recorded_form(2, "B", false, &events);
        group.add_and_open(&a);
        group.add_and_open(&b);

        assert!(a.borrow().is_opened());
        assert!(group.has_form(1));
        let forms = group.forms();
        assert_eq!(forms[0].borrow().serial_id(), 2);
        assert_eq!(forms[1].borrow().serial_id(), 1);
    }

    #[test]
    fn refresh_covers_everything_below_the_top() {
        let events = SharedEvents::default();
        let mut group = StackGroup::new("Main");
        let a = recorded_form(1, "A", false, &events);
        let b = recorded_form(2, "B", false, &events);
        group.add_and_open(&a);
        group.refresh();
        group.add_and_open(&b);
        group.refresh();

        assert!(events.contains("A", &LogicEvent::Cover));
        assert!(!events.contains("B", &LogicEvent::Cover));
        assert!(!events.contains("A", &LogicEvent::Pause));

        group.remove_and_close(&b);
        group.refresh();
        assert!(events.contains("A", &LogicEvent::Reveal));
    }

    #[test]
    fn pausing_form_pauses_covered_forms_only() {
        let events = SharedEvents::default();
        let mut group = StackGroup::new("Main");
        let below = recorded_form(1, "Below", false, &events);
        let pauser = recorded_form(2, "Pauser", true, &events);
        group.add_and_open(&below);
        group.refresh();
        group.add_and_open(&pauser);
        group.refresh();

        assert!(events.contains("Below", &LogicEvent::Pause));
        assert!(!events.contains("Pauser", &LogicEvent::Pause));

        group.remove_and_close(&pauser);
        group.refresh();
        assert!(events.contains("Below", &LogicEvent::Resume));
    }

    #[test]
    fn update_skips_paused_forms() {
        let events = SharedEvents::default();
        let mut group = StackGroup::new("Main");
        let below = recorded_form(1, "Below", false, &events);
        let pauser = recorded_form(2, "Pauser", true, &events);
        group.add_and_open(&below);
        group.add_and_open(&pauser);
        group.refresh();
        group.update();

        assert!(events.contains("Pauser", &LogicEvent::Update));
        assert!(!events.contains("Below", &LogicEvent::Update));
    }

    #[test]
    fn refocus_moves_to_front() {
        let events = SharedEvents::default();
        let mut group = StackGroup::new("Main");
        let a = recorded_form(1, "A", false, &events);
        let b = recorded_form(2, "B", false, &events);
        group.add_and_open(&a);
        group.add_and_open(&b);
        group.refocus(&a);

        assert_eq!(group.forms()[0].borrow().serial_id(), 1);
    }

    #[test]
    fn depth_hook_reports_position_from_top() {
        let events = SharedEvents::default();
        let mut group = StackGroup::new("Main");
        let a = recorded_form(1, "A", false, &events);
        let b = recorded_form(2, "B", false, &events);
        group.add_and_open(&a);
        group.add_and_open(&b);
        group.refresh();

        assert!(events.contains("A", &LogicEvent::DepthChanged { count: 2, depth: 1 }));
        assert_eq!(a.borrow().depth_in_group(), 1);
        assert_eq!(b.borrow().depth_in_group(), 0);
    }

    #[test]
    fn remove_and_close_all_forwards_shutdown_flag() {
        let events = SharedEvents::default();
        let mut group = StackGroup::new("Main");
        let a = recorded_form(1, "A", false, &events);
        group.add_and_open(&a);
        group.remove_and_close_all(true);

        assert!(events.contains("A", &LogicEvent::Close { is_shutdown: true }));
        assert!(group.forms().is_empty());
    }
}
