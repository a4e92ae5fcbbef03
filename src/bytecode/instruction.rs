//! Instruction types
//!
//! This module contains the decoded instruction representation handed in by
//! the decoder and the interned [`BytecodeInstruction`] handle payload used
//! as the vertex type of the raw control flow graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opcode classification of a decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// Straight-line instruction with a single fallthrough successor
    Plain,
    /// Conditional branch with a taken and a not-taken successor
    Branch,
    /// Unconditional jump
    Goto,
    /// Multi-way dispatch (table or lookup switch)
    Switch,
    /// Method exit returning to the caller
    Return,
    /// Method exit raising an exception
    Throw,
    /// Positional marker carrying no executable semantics
    Label,
    /// Source line marker carrying no executable semantics
    LineNumber,
}

/// A decoded instruction as delivered by the external decoder
///
/// Offsets are zero-based instruction indices within the method body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInstruction {
    /// Zero-based offset within the method body
    pub offset: u32,
    /// Opcode classification
    pub kind: InstructionKind,
    /// Raw operand payload, uninterpreted by this crate
    pub operands: Vec<u8>,
    /// Whether this instruction is the entry of an exception handler
    pub handler_entry: bool,
}

impl RawInstruction {
    /// Create a decoded instruction without operands
    pub fn new(offset: u32, kind: InstructionKind) -> Self {
        Self {
            offset,
            kind,
            operands: Vec::new(),
            handler_entry: false,
        }
    }

    /// Attach a raw operand payload
    pub fn with_operands(mut self, operands: Vec<u8>) -> Self {
        self.operands = operands;
        self
    }

    /// Mark this instruction as an exception handler entry
    pub fn as_handler_entry(mut self) -> Self {
        self.handler_entry = true;
        self
    }
}

/// The body of one decoded method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBody {
    /// Instructions in offset order
    pub instructions: Vec<RawInstruction>,
    /// Whether the method has a native (bodyless) implementation
    pub is_native: bool,
}

impl MethodBody {
    /// Create a body from an ordered instruction list
    pub fn new(instructions: Vec<RawInstruction>) -> Self {
        Self {
            instructions,
            is_native: false,
        }
    }

    /// Create the body of a native method (no executable instructions)
    pub fn native() -> Self {
        Self {
            instructions: Vec::new(),
            is_native: true,
        }
    }

    /// Number of decoded instructions
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }
}

/// One interned instruction within one method
///
/// Identity is the (unit, method, offset) triple; the pool guarantees a
/// single `Arc<BytecodeInstruction>` per identity, so handle equality and
/// identity equality coincide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BytecodeInstruction {
    /// Compilation unit (e.g. class) the method belongs to
    pub unit: Arc<str>,
    /// Method the instruction belongs to
    pub method: Arc<str>,
    /// Zero-based offset within the method body
    pub offset: u32,
    /// Opcode classification
    pub kind: InstructionKind,
    /// Raw operand payload
    pub operands: Vec<u8>,
    /// Whether this instruction is the entry of an exception handler
    pub handler_entry: bool,
}

impl BytecodeInstruction {
    /// Create an instruction handle payload from a decoded instruction
    pub fn from_raw(unit: Arc<str>, method: Arc<str>, raw: &RawInstruction) -> Self {
        Self {
            unit,
            method,
            offset: raw.offset,
            kind: raw.kind,
            operands: raw.operands.clone(),
            handler_entry: raw.handler_entry,
        }
    }

    /// Whether this is a conditional branch
    pub fn is_branch(&self) -> bool {
        self.kind == InstructionKind::Branch
    }

    /// Whether this is a switch dispatch
    pub fn is_switch(&self) -> bool {
        self.kind == InstructionKind::Switch
    }

    /// Whether this is a positional label
    pub fn is_label(&self) -> bool {
        self.kind == InstructionKind::Label
    }

    /// Whether this is a source line marker
    pub fn is_line_number(&self) -> bool {
        self.kind == InstructionKind::LineNumber
    }

    /// Whether this instruction is the entry of an exception handler
    pub fn is_handler_entry(&self) -> bool {
        self.handler_entry
    }

    /// Whether this instruction can transfer control to more than one
    /// non-exceptional successor
    pub fn is_decision_point(&self) -> bool {
        matches!(self.kind, InstructionKind::Branch | InstructionKind::Switch)
    }
}

impl PartialEq for BytecodeInstruction {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.unit == other.unit && self.method == other.method
    }
}

impl Eq for BytecodeInstruction {}

impl Hash for BytecodeInstruction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unit.hash(state);
        self.method.hash(state);
        self.offset.hash(state);
    }
}

impl fmt::Display for BytecodeInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}@{} {:?}",
            self.unit, self.method, self.offset, self.kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(offset: u32, kind: InstructionKind) -> BytecodeInstruction {
        BytecodeInstruction::from_raw(
            Arc::from("Example"),
            Arc::from("run"),
            &RawInstruction::new(offset, kind),
        )
    }

    #[test]
    fn test_identity_ignores_attributes() {
        let mut a = handle(3, InstructionKind::Plain);
        let b = handle(3, InstructionKind::Branch);
        a.operands = vec![1, 2];
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_distinguishes_offsets() {
        assert_ne!(handle(0, InstructionKind::Plain), handle(1, InstructionKind::Plain));
    }

    #[test]
    fn test_classification_flags() {
        assert!(handle(0, InstructionKind::Branch).is_decision_point());
        assert!(handle(0, InstructionKind::Switch).is_decision_point());
        assert!(!handle(0, InstructionKind::Goto).is_decision_point());
        assert!(handle(0, InstructionKind::LineNumber).is_line_number());
    }

    #[test]
    fn test_native_body_is_empty() {
        let body = MethodBody::native();
        assert!(body.is_native);
        assert_eq!(body.instruction_count(), 0);
    }
}
