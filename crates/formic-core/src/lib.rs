#![forbid(unsafe_code)]

//! Formic Core
//!
//! Entity and seam types for the Formic form manager:
//!
//! - [`Form`] - one instantiated, interactive view with its session state
//! - [`FormLogic`] - polymorphic per-form lifecycle hooks
//! - [`Group`] - the stacking container a form belongs to while opened
//! - [`AssetStore`] - asynchronous load-by-name of templates and behaviors
//! - [`OpenHandle`] - shared pending/ready/failed result of an open request
//! - [`FormError`] - validation error taxonomy
//!
//! # Role in Formic
//! `formic-core` holds everything both the orchestrator (`formic-runtime`)
//! and host applications need to agree on: the form entity, the hook trait
//! concrete behaviors implement, and the traits the host supplies
//! implementations for (asset loading, group stacking). It has no policy of
//! its own; open policies, caching, and request coalescing live in the
//! runtime crate.

pub mod asset;
pub mod error;
pub mod form;
pub mod group;
pub mod handle;
pub mod logic;

pub use asset::{AssetStore, LoadCompletion, LoadTicket, LoadedAsset};
pub use error::FormError;
pub use form::{Form, FormRef, OpenPolicy, SerialId, normalize_instance_key};
pub use group::Group;
pub use handle::OpenHandle;
pub use logic::{FormLogic, NoopLogic, SessionInfo};
