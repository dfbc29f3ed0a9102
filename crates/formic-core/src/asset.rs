#![forbid(unsafe_code)]

//! The asset-store seam: asynchronous load-by-name of form templates.
//!
//! Loads are started with [`AssetStore::begin_load`] and complete later,
//! on the same logical thread, when the manager drains
//! [`AssetStore::poll_completed`] from its frame pump. There is no
//! cancellation: every ticket eventually produces exactly one completion,
//! success or failure, even if the requester has lost interest.
//!
//! Failures are values carrying a message, never panics; the manager
//! forwards them through the open handle's failure path.

use std::any::Any;

use crate::logic::FormLogic;

/// Identifier for one in-flight load. Unique per store instance.
pub type LoadTicket = u64;

/// The product of a successful load: a template plus the behavior object
/// to attach to the instantiated form.
pub struct LoadedAsset {
    /// Opaque template payload; the manager stores it on the form untouched.
    pub template: Box<dyn Any>,
    /// Behavior object to attach to the new form instance.
    pub logic: Box<dyn FormLogic>,
}

/// One finished load, delivered through [`AssetStore::poll_completed`].
pub struct LoadCompletion {
    /// The ticket returned by the matching [`AssetStore::begin_load`].
    pub ticket: LoadTicket,
    /// The asset name the load was issued for.
    pub asset_name: String,
    /// The loaded asset, or a failure message.
    pub result: Result<LoadedAsset, String>,
}

/// Asynchronous load-by-name producing a template + attachable behavior.
///
/// Implementations may load on background threads or synchronously; the
/// only contract is that completions are observed exclusively through
/// [`poll_completed`](Self::poll_completed), called from the thread that
/// owns the manager.
pub trait AssetStore {
    /// Start loading the named asset. Returns a ticket the completion will
    /// carry.
    fn begin_load(&mut self, asset_name: &str) -> LoadTicket;

    /// Drain every load that has finished since the last call.
    fn poll_completed(&mut self) -> Vec<LoadCompletion>;
}

impl std::fmt::Debug for LoadCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadCompletion")
            .field("ticket", &self.ticket)
            .field("asset_name", &self.asset_name)
            .field("ok", &self.result.is_ok())
            .finish()
    }
}
