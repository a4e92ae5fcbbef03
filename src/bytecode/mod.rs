//! Decoded bytecode module
//!
//! This module holds the instruction-level input types produced by an
//! external decoder, the frame table produced by an external dataflow
//! analysis, and the process-wide instruction pool that interns one
//! canonical handle per (unit, method, offset).

pub mod frame;
pub mod instruction;
pub mod pool;

pub use frame::{Frame, FrameTable};
pub use instruction::{BytecodeInstruction, InstructionKind, MethodBody, RawInstruction};
pub use pool::{InstructionPool, MethodKey};
