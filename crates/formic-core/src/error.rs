#![forbid(unsafe_code)]

//! Validation error taxonomy for the public form API.
//!
//! These cover the *expected* failure modes: bad arguments and unknown or
//! duplicate groups. Structural-invariant violations (closing a released
//! form, refocusing an unopened one) are not errors in this sense; the
//! runtime logs them and turns the call into a no-op.

use thiserror::Error;

/// Validation errors reported synchronously by the form manager.
///
/// Open requests surface these through a failed [`OpenHandle`]'s message
/// rather than a `Result`, so callers have a single completion path.
///
/// [`OpenHandle`]: crate::handle::OpenHandle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// The request's asset name was empty.
    #[error("asset name must not be empty")]
    EmptyAssetName,

    /// The request's group name was empty.
    #[error("group name must not be empty")]
    EmptyGroupName,

    /// The request referenced a group that was never registered.
    #[error("unknown group `{0}`")]
    UnknownGroup(String),

    /// A group with this name is already registered.
    #[error("group `{0}` is already registered")]
    DuplicateGroup(String),

    /// The manager has been shut down and accepts no further requests.
    #[error("form manager has been shut down")]
    ShutDown,
}
