//! Error taxonomy: caller misuse fails fast, structural faults are recovered
//! locally by the engine.

use thiserror::Error;

use crate::surface::NodeHandle;

/// Invalid arguments passed to a queue builder. Raised at the builder call,
/// never deferred to execution.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BuilderError {
    #[error("must provide amount of characters to delete")]
    ZeroDeleteAmount,

    #[error("must provide a new delay greater than zero")]
    ZeroDelay,

    #[error("must provide a new delete speed greater than zero")]
    ZeroDeleteSpeed,

    #[error("must provide a non-empty cursor glyph")]
    EmptyCursorGlyph,
}

/// Structural failure reported by a [`Surface`](crate::surface::Surface)
/// implementation. The engine logs these and skips the affected step.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("unknown node handle {handle:?}")]
    UnknownHandle { handle: NodeHandle },

    #[error("node {node:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeHandle, node: NodeHandle },

    #[error("reference node {reference:?} is not attached to any parent")]
    DetachedReference { reference: NodeHandle },
}
