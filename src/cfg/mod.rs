//! Control Flow Graph (CFG) module
//!
//! This module builds the instruction-level (raw) control flow graph for
//! one method and reduces it into the basic-block-level (actual) graph.

pub mod actual;
pub mod block;
pub mod generator;
pub mod raw;
pub mod registry;

pub use actual::ActualControlFlowGraph;
pub use block::BasicBlock;
pub use generator::{CfgGenerator, GeneratorState};
pub use raw::RawControlFlowGraph;
pub use registry::CfgRegistry;

use serde::{Deserialize, Serialize};

/// Edge kind in the control flow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Normal control transfer (fallthrough, jump, switch case)
    Plain,
    /// Implicit transfer to an exception handler
    Exception,
}

/// Outcome tag on a conditional branch's outgoing edges
///
/// Determined by edge-registration call order: the first non-exception edge
/// registered out of a branch is the taken edge, every later one is
/// not-taken. Call order, not offset order, is authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchOutcome {
    /// Successor when the branch condition holds
    Taken,
    /// Successor when the branch condition does not hold
    NotTaken,
    /// Not an outcome-carrying edge
    #[default]
    Unset,
}

/// Edge weight shared by the raw and the actual graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlowEdge {
    /// Normal or exceptional transfer
    pub kind: EdgeKind,
    /// Branch outcome, `Unset` unless the source is a decision point
    pub outcome: BranchOutcome,
}

impl ControlFlowEdge {
    /// Create a plain edge without an outcome tag
    pub fn plain() -> Self {
        Self {
            kind: EdgeKind::Plain,
            outcome: BranchOutcome::Unset,
        }
    }

    /// Create an exception edge
    pub fn exception() -> Self {
        Self {
            kind: EdgeKind::Exception,
            outcome: BranchOutcome::Unset,
        }
    }

    /// Attach a branch outcome tag
    pub fn with_outcome(mut self, outcome: BranchOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Whether this edge models an exceptional transfer
    pub fn is_exception(&self) -> bool {
        self.kind == EdgeKind::Exception
    }
}
