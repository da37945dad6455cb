//! Error types.
//!
//! Two families, matching the two places things can go wrong:
//! - [`ReactiveError`] - misuse of the reactive layer (non-fatal)
//! - [`HostError`] - a host adapter refused or could not apply an operation

use thiserror::Error;

use crate::renderer::HostNode;
use crate::reactivity::EffectId;

/// Misuse of the reactive layer.
///
/// These never abort the caller. The offending operation degrades gracefully
/// (the write is discarded, the run is skipped) and the error is returned so
/// callers that care can react.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A write went through a read-only wrapper.
    #[error("property `{key}` is read-only, write discarded")]
    ReadOnlyWrite { key: String },

    /// An effect was asked to run while its closure was already executing.
    #[error("effect {id} is already running")]
    Reentrant { id: EffectId },
}

/// Failure reported by a [`Host`](crate::renderer::Host) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The node handle does not belong to this host.
    #[error("unknown host node {0}")]
    UnknownNode(HostNode),

    /// The host refused to perform the operation.
    #[error("host rejected operation: {0}")]
    Rejected(String),

    /// An insertion anchor is not a child of the insertion parent.
    #[error("anchor {anchor} is not a child of {parent}")]
    AnchorMismatch { anchor: HostNode, parent: HostNode },
}
