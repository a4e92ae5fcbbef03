//! Basic block module
//!
//! This module contains the BasicBlock struct used as the vertex type of
//! the actual (block-level) control flow graph.

use crate::bytecode::BytecodeInstruction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Basic block containing a maximal single-entry single-exit instruction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    /// Block id, unique within one actual graph
    pub id: usize,
    /// Instructions in this block, in control flow order
    pub instructions: Vec<Arc<BytecodeInstruction>>,
    /// Whether this block starts at a method entry (no predecessors)
    pub is_entry: bool,
    /// Whether this block ends the method (no successors)
    pub is_exit: bool,
}

impl BasicBlock {
    /// Create a basic block from its instruction run
    pub fn new(id: usize, instructions: Vec<Arc<BytecodeInstruction>>) -> Self {
        Self {
            id,
            instructions,
            is_entry: false,
            is_exit: false,
        }
    }

    /// Offset of the first instruction (the block leader)
    pub fn first_offset(&self) -> Option<u32> {
        self.instructions.first().map(|i| i.offset)
    }

    /// Offset of the last instruction (the block's exit boundary)
    pub fn last_offset(&self) -> Option<u32> {
        self.instructions.last().map(|i| i.offset)
    }

    /// All instructions of this block
    pub fn instructions(&self) -> &[Arc<BytecodeInstruction>] {
        &self.instructions
    }

    /// Number of instructions in this block
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the block contains the instruction at `offset`
    pub fn contains_offset(&self, offset: u32) -> bool {
        self.instructions.iter().any(|i| i.offset == offset)
    }

    /// The last instruction of this block
    pub fn last_instruction(&self) -> Option<&Arc<BytecodeInstruction>> {
        self.instructions.last()
    }

    /// Whether this block ends with a decision point (branch or switch)
    pub fn ends_with_decision(&self) -> bool {
        self.last_instruction()
            .map(|i| i.is_decision_point())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{InstructionKind, RawInstruction};

    fn handle(offset: u32, kind: InstructionKind) -> Arc<BytecodeInstruction> {
        Arc::new(BytecodeInstruction::from_raw(
            Arc::from("Example"),
            Arc::from("run"),
            &RawInstruction::new(offset, kind),
        ))
    }

    #[test]
    fn test_block_boundaries() {
        let block = BasicBlock::new(
            0,
            vec![
                handle(4, InstructionKind::Plain),
                handle(5, InstructionKind::Branch),
            ],
        );
        assert_eq!(block.first_offset(), Some(4));
        assert_eq!(block.last_offset(), Some(5));
        assert!(block.contains_offset(4));
        assert!(!block.contains_offset(6));
        assert!(block.ends_with_decision());
    }

    #[test]
    fn test_empty_block() {
        let block = BasicBlock::new(0, vec![]);
        assert_eq!(block.first_offset(), None);
        assert_eq!(block.instruction_count(), 0);
        assert!(!block.ends_with_decision());
    }
}
