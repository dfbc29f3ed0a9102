#![forbid(unsafe_code)]

//! Active-instance registry: the primary by-serial map plus the two
//! secondary indices used for policy matching and fast lookup.
//!
//! Register and unregister update all three maps as one conceptual
//! operation; no caller ever observes one index disagreeing with another.
//! A violation here would only manifest indirectly, as wrong dedup
//! decisions or orphaned entries, which is why [`ActiveRegistry::is_consistent`]
//! exists and is stress-tested.

use std::collections::HashMap;

use formic_core::{FormRef, SerialId};

/// Key for the by-(asset, group) secondary index.
type AssetGroupKey = (String, String);

/// Indexed set of currently opened form instances.
#[derive(Default)]
pub struct ActiveRegistry {
    /// Primary map: one entry per currently opened instance.
    by_serial: HashMap<SerialId, FormRef>,
    /// Secondary index mirroring `by_serial`, keyed by asset name.
    by_asset: HashMap<String, Vec<SerialId>>,
    /// Secondary index mirroring `by_serial`, keyed by (asset, group).
    by_asset_group: HashMap<AssetGroupKey, Vec<SerialId>>,
}

impl ActiveRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance under its current serial, asset, and group.
    ///
    /// All three maps are updated together. Registering a serial that is
    /// already present is a programmer error caught by a debug assertion;
    /// in release builds the old entry is displaced from every index first
    /// so the maps stay mutually consistent.
    pub fn register(&mut self, form: &FormRef) {
        let (serial_id, asset_name, group_name) = {
            let f = form.borrow();
            (
                f.serial_id(),
                f.asset_name().to_string(),
                f.group_name().to_string(),
            )
        };
        debug_assert!(
            !self.by_serial.contains_key(&serial_id),
            "serial {serial_id} registered twice"
        );
        if self.by_serial.contains_key(&serial_id) {
            self.unregister(serial_id);
        }

        self.by_serial.insert(serial_id, form.clone());
        self.by_asset
            .entry(asset_name.clone())
            .or_default()
            .push(serial_id);
        self.by_asset_group
            .entry((asset_name, group_name))
            .or_default()
            .push(serial_id);
    }

    /// Remove an instance from all three maps. Returns the form if it was
    /// registered.
    pub fn unregister(&mut self, serial_id: SerialId) -> Option<FormRef> {
        let form = self.by_serial.remove(&serial_id)?;
        let (asset_name, group_name) = {
            let f = form.borrow();
            (f.asset_name().to_string(), f.group_name().to_string())
        };

        if let Some(serials) = self.by_asset.get_mut(&asset_name) {
            serials.retain(|s| *s != serial_id);
            if serials.is_empty() {
                self.by_asset.remove(&asset_name);
            }
        }
        let key = (asset_name, group_name);
        if let Some(serials) = self.by_asset_group.get_mut(&key) {
            serials.retain(|s| *s != serial_id);
            if serials.is_empty() {
                self.by_asset_group.remove(&key);
            }
        }
        Some(form)
    }

    /// Look up by serial id (primary map).
    pub fn get(&self, serial_id: SerialId) -> Option<FormRef> {
        self.by_serial.get(&serial_id).cloned()
    }

    /// Every registered instance with this asset name.
    pub fn forms_by_asset(&self, asset_name: &str) -> Vec<FormRef> {
        self.by_asset
            .get(asset_name)
            .map(|serials| {
                serials
                    .iter()
                    .filter_map(|s| self.by_serial.get(s).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every registered instance with this asset name in this group.
    pub fn forms_by_asset_and_group(&self, asset_name: &str, group_name: &str) -> Vec<FormRef> {
        self.by_asset_group
            .get(&(asset_name.to_string(), group_name.to_string()))
            .map(|serials| {
                serials
                    .iter()
                    .filter_map(|s| self.by_serial.get(s).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.by_serial.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_serial.is_empty()
    }

    /// Iterate every registered instance.
    pub fn iter(&self) -> impl Iterator<Item = (&SerialId, &FormRef)> {
        self.by_serial.iter()
    }

    /// Remove and return every registered instance.
    pub fn drain(&mut self) -> Vec<FormRef> {
        self.by_asset.clear();
        self.by_asset_group.clear();
        self.by_serial.drain().map(|(_, form)| form).collect()
    }

    /// Whether the secondary indices exactly mirror the primary map.
    ///
    /// Diagnostic; intended for tests and assertions, not hot paths.
    pub fn is_consistent(&self) -> bool {
        let indexed_by_asset: usize = self.by_asset.values().map(Vec::len).sum();
        let indexed_by_group: usize = self.by_asset_group.values().map(Vec::len).sum();
        if indexed_by_asset != self.by_serial.len() || indexed_by_group != self.by_serial.len() {
            return false;
        }
        for (serial_id, form) in &self.by_serial {
            let f = form.borrow();
            let by_asset_ok = self
                .by_asset
                .get(f.asset_name())
                .is_some_and(|s| s.contains(serial_id));
            let key = (f.asset_name().to_string(), f.group_name().to_string());
            let by_group_ok = self
                .by_asset_group
                .get(&key)
                .is_some_and(|s| s.contains(serial_id));
            if !by_asset_ok || !by_group_ok {
                return false;
            }
        }
        true
    }
}

impl std::fmt::Debug for ActiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveRegistry")
            .field("active", &self.by_serial.len())
            .field("assets", &self.by_asset.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formic_core::{Form, NoopLogic, OpenPolicy};

    fn active_form(serial: SerialId, asset: &str, group: &str) -> FormRef {
        let form = Form::new(
            serial,
            asset,
            group,
            OpenPolicy::MultiInstanceGlobal,
            false,
            None,
            Box::new(()),
            Box::new(NoopLogic),
        )
        .into_ref();
        form.borrow_mut().open();
        form
    }

    #[test]
    fn register_populates_all_three_maps() {
        let mut reg = ActiveRegistry::new();
        reg.register(&active_form(1, "Inventory", "HUD"));

        assert!(reg.get(1).is_some());
        assert_eq!(reg.forms_by_asset("Inventory").len(), 1);
        assert_eq!(reg.forms_by_asset_and_group("Inventory", "HUD").len(), 1);
        assert!(reg.is_consistent());
    }

    #[test]
    fn unregister_clears_all_three_maps() {
        let mut reg = ActiveRegistry::new();
        reg.register(&active_form(1, "Inventory", "HUD"));
        let removed = reg.unregister(1);

        assert!(removed.is_some());
        assert!(reg.get(1).is_none());
        assert!(reg.forms_by_asset("Inventory").is_empty());
        assert!(reg.forms_by_asset_and_group("Inventory", "HUD").is_empty());
        assert!(reg.is_empty());
        assert!(reg.is_consistent());
    }

    #[test]
    fn unregister_unknown_serial_is_none() {
        let mut reg = ActiveRegistry::new();
        assert!(reg.unregister(99).is_none());
    }

    #[test]
    fn asset_index_tracks_multiple_groups() {
        let mut reg = ActiveRegistry::new();
        reg.register(&active_form(1, "Dialog", "HUD"));
        reg.register(&active_form(2, "Dialog", "Popup"));

        assert_eq!(reg.forms_by_asset("Dialog").len(), 2);
        assert_eq!(reg.forms_by_asset_and_group("Dialog", "HUD").len(), 1);
        assert_eq!(reg.forms_by_asset_and_group("Dialog", "Popup").len(), 1);
        assert!(reg.is_consistent());

        reg.unregister(1);
        assert_eq!(reg.forms_by_asset("Dialog").len(), 1);
        assert!(reg.forms_by_asset_and_group("Dialog", "HUD").is_empty());
        assert!(reg.is_consistent());
    }

    #[test]
    fn drain_empties_everything() {
        let mut reg = ActiveRegistry::new();
        reg.register(&active_form(1, "A", "HUD"));
        reg.register(&active_form(2, "B", "HUD"));
        let drained = reg.drain();
        assert_eq!(drained.len(), 2);
        assert!(reg.is_empty());
        assert!(reg.forms_by_asset("A").is_empty());
        assert!(reg.is_consistent());
    }

    #[test]
    fn consistency_detects_a_planted_orphan() {
        let mut reg = ActiveRegistry::new();
        reg.register(&active_form(1, "A", "HUD"));
        // Simulate the exact corruption the invariant guards against.
        reg.by_asset.entry("A".into()).or_default().push(42);
        assert!(!reg.is_consistent());
    }
}
