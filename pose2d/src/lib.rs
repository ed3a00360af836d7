//! Pull-to-pose solver for 2D bone hierarchies.
//!
//! Dragging a point on one bone pulls the whole connected skeleton along: the pull is pushed
//! through a rigid shadow of the bone tree, relaxed back into a connected chain, and turned into
//! per-bone rotation deltas. Input handling, rendering and undo stacks stay with the caller
//! (see [`BoneSource`] and [`PoseCommitter`]).

#![forbid(unsafe_code)]

mod error;
mod hierarchy;
mod model;
mod runtime;

#[cfg(feature = "json")]
pub mod json;

pub use error::*;
pub use hierarchy::*;
pub use model::*;
pub use runtime::*;

#[cfg(test)]
mod hierarchy_tests;
