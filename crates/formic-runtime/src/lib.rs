#![forbid(unsafe_code)]

//! Formic Runtime
//!
//! The orchestration layer of the Formic form manager:
//!
//! - [`FormManager`] - open/close/refocus resolution, request coalescing,
//!   the frame pump, and shutdown
//! - [`StackGroup`] - the reference [`Group`](formic_core::Group)
//!   implementation (plain interaction stack)
//! - [`ReuseCache`] - bounded most-recently-closed-first reuse cache
//! - [`ActiveRegistry`] - indexed set of currently opened instances
//! - [`ManagerConfig`] - TOML-loadable tunables with hot-reload semantics
//! - [`testing`] - deterministic test doubles ([`testing::ScriptedStore`],
//!   [`testing::RecordingLogic`])
//!
//! # Threading model
//! Everything here is single-threaded and cooperative. Forms are shared as
//! `Rc<RefCell<_>>`; asynchronous asset loads surface only through
//! [`FormManager::update`], which the host calls once per frame. There are
//! no locks and no cross-thread callbacks.
//!
//! # Quick start
//!
//! ```no_run
//! use formic_runtime::{FormManager, ManagerConfig, OpenRequest, StackGroup};
//! use formic_runtime::testing::ScriptedStore;
//!
//! let mut manager = FormManager::with_config(
//!     ScriptedStore::new(),
//!     ManagerConfig::default(),
//! );
//! manager.add_group(Box::new(StackGroup::new("HUD")))?;
//!
//! let handle = manager.open(OpenRequest::new("Inventory", "HUD"));
//! // ... each frame:
//! manager.update();
//! if let Some(form) = handle.form() {
//!     println!("opened serial {}", form.borrow().serial_id());
//! }
//! # Ok::<(), formic_core::FormError>(())
//! ```

pub mod cache;
pub mod config;
pub mod manager;
pub mod registry;
pub mod stack_group;
pub mod testing;

pub use cache::ReuseCache;
pub use config::{ConfigError, ManagerConfig};
pub use manager::{
    CachedFormSnapshot, DedupKey, FormManager, FormSnapshot, OpenRequest, PendingSnapshot,
};
pub use registry::ActiveRegistry;
pub use stack_group::StackGroup;
