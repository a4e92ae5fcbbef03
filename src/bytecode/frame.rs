//! Frame table
//!
//! The dataflow analysis that runs before graph construction produces one
//! symbolic frame per reachable instruction offset. An absent frame means
//! the offset is unreachable or the analysis failed for it; graph
//! construction treats such offsets as dead code.

use serde::{Deserialize, Serialize};

/// Symbolic execution state at one instruction offset
///
/// The contents are owned by the external analysis; this crate only cares
/// about presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Number of live local variable slots
    pub locals: u16,
    /// Operand stack depth at this offset
    pub stack_size: u16,
}

impl Frame {
    /// Create a frame with the given local and stack sizes
    pub fn new(locals: u16, stack_size: u16) -> Self {
        Self { locals, stack_size }
    }
}

/// Per-offset reachability table supplied by the dataflow analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameTable {
    frames: Vec<Option<Frame>>,
}

impl FrameTable {
    /// Create a table with `len` absent entries
    pub fn new(len: usize) -> Self {
        Self {
            frames: vec![None; len],
        }
    }

    /// Create a table where every one of `len` offsets is reachable
    pub fn all_reachable(len: usize) -> Self {
        Self {
            frames: vec![Some(Frame::default()); len],
        }
    }

    /// Record the frame for a reachable offset
    pub fn set(&mut self, offset: u32, frame: Frame) {
        let index = offset as usize;
        if index >= self.frames.len() {
            self.frames.resize(index + 1, None);
        }
        self.frames[index] = Some(frame);
    }

    /// Mark an offset as unreachable
    pub fn clear(&mut self, offset: u32) {
        if let Some(slot) = self.frames.get_mut(offset as usize) {
            *slot = None;
        }
    }

    /// Get the frame at an offset, if the offset is reachable
    pub fn get(&self, offset: u32) -> Option<&Frame> {
        self.frames.get(offset as usize).and_then(Option::as_ref)
    }

    /// Whether the offset has a frame
    pub fn is_reachable(&self, offset: u32) -> bool {
        self.get(offset).is_some()
    }

    /// Number of offsets covered by the table
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the table covers no offsets
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of reachable offsets
    pub fn reachable_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_entries_are_unreachable() {
        let table = FrameTable::new(4);
        assert_eq!(table.len(), 4);
        assert!(!table.is_reachable(0));
        assert!(!table.is_reachable(3));
        assert!(!table.is_reachable(100));
    }

    #[test]
    fn test_set_and_clear() {
        let mut table = FrameTable::new(2);
        table.set(1, Frame::new(2, 0));
        assert!(table.is_reachable(1));
        assert_eq!(table.get(1), Some(&Frame::new(2, 0)));

        table.clear(1);
        assert!(!table.is_reachable(1));
    }

    #[test]
    fn test_set_grows_table() {
        let mut table = FrameTable::new(1);
        table.set(5, Frame::default());
        assert_eq!(table.len(), 6);
        assert_eq!(table.reachable_count(), 1);
    }

    #[test]
    fn test_all_reachable() {
        let table = FrameTable::all_reachable(3);
        assert_eq!(table.reachable_count(), 3);
    }
}
