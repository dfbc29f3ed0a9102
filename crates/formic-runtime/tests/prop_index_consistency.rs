//! Property tests: random operation sequences must never desynchronize
//! the lookup surfaces or overflow the cache bound, and invalid targets
//! must degrade to no-ops rather than corrupting state.

use formic_core::{NoopLogic, OpenPolicy};
use formic_runtime::testing::ScriptedStore;
use formic_runtime::{FormManager, ManagerConfig, OpenRequest, StackGroup};
use proptest::prelude::*;

const ASSETS: &[&str] = &["Inventory", "Settings", "Dialog", "Toast", "Panel", "Map"];
const GROUPS: &[&str] = &["HUD", "Popup", "Overlay"];

/// Policy is a fixed property of the asset, as it would be in a real UI
/// table, so singleton assertions stay meaningful under random sequences.
fn policy_for(asset_index: usize) -> OpenPolicy {
    match asset_index % 3 {
        0 => OpenPolicy::SingleInstanceGlobal,
        1 => OpenPolicy::SingleInstancePerGroup,
        _ => OpenPolicy::MultiInstanceGlobal,
    }
}

#[derive(Debug, Clone)]
enum Op {
    Open { asset: usize, group: usize },
    CompleteOldestLoad,
    FailOldestLoad,
    CloseNthActive(usize),
    CloseRawSerial(u64),
    CloseAsset(usize),
    RefocusNthActive(usize),
    RefocusRawSerial(u64),
    Update,
    SetCapacity(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ASSETS.len(), 0..GROUPS.len())
            .prop_map(|(asset, group)| Op::Open { asset, group }),
        Just(Op::CompleteOldestLoad),
        Just(Op::CompleteOldestLoad),
        Just(Op::FailOldestLoad),
        (0..8usize).prop_map(Op::CloseNthActive),
        (0..64u64).prop_map(Op::CloseRawSerial),
        (0..ASSETS.len()).prop_map(Op::CloseAsset),
        (0..8usize).prop_map(Op::RefocusNthActive),
        (0..64u64).prop_map(Op::RefocusRawSerial),
        Just(Op::Update),
        (0..5usize).prop_map(Op::SetCapacity),
    ]
}

fn apply(mgr: &mut FormManager<ScriptedStore>, op: &Op) {
    match op {
        Op::Open { asset, group } => {
            let request = OpenRequest::new(ASSETS[*asset], GROUPS[*group])
                .with_policy(policy_for(*asset));
            mgr.open(request);
        }
        Op::CompleteOldestLoad => {
            if let Some(asset) = mgr.store().in_flight().first().cloned() {
                mgr.store_mut().succeed(&asset, Box::new(NoopLogic));
                mgr.update();
            }
        }
        Op::FailOldestLoad => {
            if let Some(asset) = mgr.store().in_flight().first().cloned() {
                mgr.store_mut().fail(&asset, "scripted failure");
                mgr.update();
            }
        }
        Op::CloseNthActive(n) => {
            let snapshot = mgr.active_snapshot();
            if let Some(entry) = snapshot.get(n % snapshot.len().max(1)) {
                mgr.close(entry.serial_id);
            }
        }
        Op::CloseRawSerial(serial) => mgr.close(*serial),
        Op::CloseAsset(asset) => mgr.close_by_asset(ASSETS[*asset]),
        Op::RefocusNthActive(n) => {
            let snapshot = mgr.active_snapshot();
            if let Some(entry) = snapshot.get(n % snapshot.len().max(1)) {
                mgr.refocus(entry.serial_id);
            }
        }
        Op::RefocusRawSerial(serial) => mgr.refocus(*serial),
        Op::Update => mgr.update(),
        Op::SetCapacity(capacity) => mgr.set_cache_capacity(*capacity),
    }
}

/// Every lookup surface must agree with the active snapshot.
fn check_invariants(mgr: &FormManager<ScriptedStore>) {
    let snapshot = mgr.active_snapshot();

    // Serial ids are unique.
    for window in snapshot.windows(2) {
        assert!(window[0].serial_id < window[1].serial_id);
    }

    for entry in &snapshot {
        // By-serial, by-asset, and by-(asset, group) lookups all see the
        // same instance.
        let form = mgr.form(entry.serial_id).expect("by-serial lookup");
        assert_eq!(form.borrow().asset_name(), entry.asset_name);
        assert!(form.borrow().is_opened());
        assert!(!form.borrow().is_released());

        let by_asset = mgr.forms_by_asset(&entry.asset_name);
        assert!(
            by_asset
                .iter()
                .any(|f| f.borrow().serial_id() == entry.serial_id),
            "asset index lost serial {}",
            entry.serial_id
        );
        assert!(
            mgr.form_in_group(&entry.asset_name, &entry.group_name).is_some(),
            "group index lost {}@{}",
            entry.asset_name,
            entry.group_name
        );
    }

    // Policy bounds hold for every asset.
    for (index, asset) in ASSETS.iter().enumerate() {
        let active: Vec<_> = snapshot.iter().filter(|e| e.asset_name == *asset).collect();
        match policy_for(index) {
            OpenPolicy::SingleInstanceGlobal => assert!(active.len() <= 1),
            OpenPolicy::SingleInstancePerGroup => {
                for group in GROUPS {
                    let in_group = active.iter().filter(|e| e.group_name == *group).count();
                    assert!(in_group <= 1);
                }
            }
            OpenPolicy::MultiInstanceGlobal => {}
        }
    }

    // The cache honors its bound, and no cached form is active or released.
    assert!(mgr.cached_count() <= mgr.cache_capacity());
    for cached in mgr.cache_snapshot() {
        assert!(
            mgr.form(cached.previous_serial_id).is_none(),
            "serial {} is both active and cached",
            cached.previous_serial_id
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_operation_sequences_keep_indices_consistent(
        ops in proptest::collection::vec(op_strategy(), 1..120),
    ) {
        let mut mgr = FormManager::with_config(
            ScriptedStore::new(),
            ManagerConfig { cache_capacity: 3, start_of_serial_id: 1 },
        );
        for group in GROUPS {
            mgr.add_group(Box::new(StackGroup::new(*group))).unwrap();
        }

        for op in &ops {
            apply(&mut mgr, op);
            check_invariants(&mgr);
        }

        // Shutdown from any reachable state leaves nothing behind.
        mgr.shutdown();
        prop_assert_eq!(mgr.active_count(), 0);
        prop_assert_eq!(mgr.cached_count(), 0);
        prop_assert_eq!(mgr.pending_count(), 0);
    }

    #[test]
    fn serial_ids_are_strictly_increasing_across_sessions(
        rounds in 1..20usize,
    ) {
        let mut mgr = FormManager::new(ScriptedStore::new());
        mgr.add_group(Box::new(StackGroup::new("HUD"))).unwrap();

        let mut last_serial = 0;
        for _ in 0..rounds {
            let handle = mgr.open(OpenRequest::new("Inventory", "HUD"));
            if handle.is_pending() {
                mgr.store_mut().succeed("Inventory", Box::new(NoopLogic));
                mgr.update();
            }
            let form = handle.form().expect("open");
            let serial = form.borrow().serial_id();
            prop_assert!(serial > last_serial);
            last_serial = serial;
            mgr.close(serial);
        }
    }
}
