//! bytecode-cfg-rs: per-method control flow graph construction
//!
//! This library builds an instruction-level (raw) control flow graph for
//! each decoded method and reduces it into a basic-block-level (actual)
//! graph. Decoding and dataflow reachability analysis are external: the
//! decoder supplies an ordered instruction list per method, the dataflow
//! pass supplies a per-offset frame table, and an edge-discovery driver
//! reports candidate transitions in an order that fixes the taken/not-taken
//! tags on branch edges.

pub mod bytecode;
pub mod cfg;
pub mod diagnostics;
pub mod error;

pub use error::{Error as CfgError, Result as CfgResult};

// Re-export commonly used types
pub use bytecode::{
    BytecodeInstruction, Frame, FrameTable, InstructionKind, InstructionPool, MethodBody,
    MethodKey, RawInstruction,
};
pub use cfg::{
    ActualControlFlowGraph, BasicBlock, BranchOutcome, CfgGenerator, CfgRegistry, ControlFlowEdge,
    EdgeKind, GeneratorState, RawControlFlowGraph,
};
pub use diagnostics::{DiagnosticSink, LogSink};
