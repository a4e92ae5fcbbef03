//! Actual control flow graph
//!
//! Block-level reduction of a raw graph. Chains of single-predecessor,
//! single-successor instructions collapse into basic blocks; raw edges
//! between block boundary instructions survive as inter-block edges with
//! their kind and branch-outcome tags intact.

use crate::bytecode::BytecodeInstruction;
use crate::cfg::{BasicBlock, ControlFlowEdge, RawControlFlowGraph};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Block-level control flow graph of one method
#[derive(Debug)]
pub struct ActualControlFlowGraph {
    unit: Arc<str>,
    method: Arc<str>,
    graph: DiGraph<BasicBlock, ControlFlowEdge>,
    offset_to_block: HashMap<u32, NodeIndex>,
}

impl ActualControlFlowGraph {
    /// Reduce a raw graph into its basic-block form
    pub fn from_raw(raw: &RawControlFlowGraph) -> Self {
        let mut reduced = Self {
            unit: Arc::from(raw.unit()),
            method: Arc::from(raw.method()),
            graph: DiGraph::new(),
            offset_to_block: HashMap::new(),
        };

        let leaders = Self::find_leaders(raw);
        reduced.build_blocks(raw, &leaders);
        reduced.build_edges(raw, &leaders);
        reduced
    }

    /// Determine the offsets that start a basic block
    ///
    /// An instruction starts a block if it has no predecessors, more than
    /// one distinct predecessor, no successors, any incoming exception
    /// edge, a predecessor with more than one distinct non-exception
    /// target, or an exception-handler-entry flag.
    fn find_leaders(raw: &RawControlFlowGraph) -> HashSet<u32> {
        let mut leaders = HashSet::new();

        for offset in raw.offsets() {
            let incoming = raw.incoming_edges(offset);
            let distinct_preds = raw.distinct_predecessor_count(offset);

            let is_leader = distinct_preds == 0
                || distinct_preds > 1
                || raw.out_degree(offset) == 0
                || incoming.iter().any(|(_, edge)| edge.is_exception())
                || incoming
                    .iter()
                    .any(|(pred, _)| raw.distinct_successor_count(*pred) > 1)
                || raw
                    .instruction_at(offset)
                    .map(|i| i.is_handler_entry())
                    .unwrap_or(false);

            if is_leader {
                leaders.insert(offset);
            }
        }

        leaders
    }

    /// Grow one block per leader by following unique-successor chains
    fn build_blocks(&mut self, raw: &RawControlFlowGraph, leaders: &HashSet<u32>) {
        let mut assigned: HashSet<u32> = HashSet::new();

        let mut seeds: Vec<u32> = leaders.iter().copied().collect();
        seeds.sort_unstable();

        for seed in seeds {
            self.grow_block(raw, leaders, seed, &mut assigned);
        }

        // Vertices on leaderless cycles are swept into their own blocks.
        for offset in raw.offsets() {
            if !assigned.contains(&offset) {
                self.grow_block(raw, leaders, offset, &mut assigned);
            }
        }
    }

    fn grow_block(
        &mut self,
        raw: &RawControlFlowGraph,
        leaders: &HashSet<u32>,
        seed: u32,
        assigned: &mut HashSet<u32>,
    ) {
        if assigned.contains(&seed) {
            return;
        }

        let mut run: Vec<Arc<BytecodeInstruction>> = Vec::new();
        let mut cursor = seed;
        loop {
            let Some(instruction) = raw.instruction_at(cursor) else {
                break;
            };
            run.push(Arc::clone(instruction));
            assigned.insert(cursor);

            if raw.distinct_successor_count(cursor) != 1 {
                break;
            }
            let next = raw
                .outgoing_edges(cursor)
                .into_iter()
                .find(|(_, edge)| !edge.is_exception())
                .map(|(target, _)| target);
            match next {
                Some(target) if !leaders.contains(&target) && !assigned.contains(&target) => {
                    cursor = target;
                }
                _ => break,
            }
        }

        let id = self.graph.node_count();
        let mut block = BasicBlock::new(id, run);
        block.is_entry = block
            .first_offset()
            .map(|offset| raw.distinct_predecessor_count(offset) == 0)
            .unwrap_or(false);
        block.is_exit = block
            .last_offset()
            .map(|offset| raw.out_degree(offset) == 0)
            .unwrap_or(false);

        let node = self.graph.add_node(block);
        for instruction in self.graph[node].instructions.clone() {
            self.offset_to_block.insert(instruction.offset, node);
        }
    }

    /// Mirror raw edges whose target is a block leader as inter-block edges
    fn build_edges(&mut self, raw: &RawControlFlowGraph, leaders: &HashSet<u32>) {
        for edge in raw.graph().edge_references() {
            let src = raw.graph()[edge.source()].offset;
            let dst = raw.graph()[edge.target()].offset;
            if !leaders.contains(&dst) {
                // Interior edge, collapsed into block membership.
                continue;
            }
            let (Some(&src_block), Some(&dst_block)) =
                (self.offset_to_block.get(&src), self.offset_to_block.get(&dst))
            else {
                continue;
            };
            self.graph.add_edge(src_block, dst_block, *edge.weight());
        }
    }

    /// Compilation unit this graph belongs to
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Method this graph belongs to
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Number of basic blocks
    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of inter-block edges, parallel edges counted individually
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The block containing the instruction at `offset`
    pub fn block_of(&self, offset: u32) -> Option<&BasicBlock> {
        self.offset_to_block
            .get(&offset)
            .map(|node| &self.graph[*node])
    }

    /// Node index of the block containing `offset`
    pub fn block_node_of(&self, offset: u32) -> Option<NodeIndex> {
        self.offset_to_block.get(&offset).copied()
    }

    /// The entry block, if the method has one
    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.graph
            .node_indices()
            .map(|node| &self.graph[node])
            .find(|block| block.is_entry)
    }

    /// All exit blocks
    pub fn exit_blocks(&self) -> Vec<&BasicBlock> {
        self.graph
            .node_indices()
            .map(|node| &self.graph[node])
            .filter(|block| block.is_exit)
            .collect()
    }

    /// All blocks in construction order
    pub fn blocks(&self) -> Vec<&BasicBlock> {
        self.graph
            .node_indices()
            .map(|node| &self.graph[node])
            .collect()
    }

    /// Outgoing inter-block edges of the block containing `offset`, as
    /// (first offset of target block, edge weight) pairs
    pub fn outgoing_edges(&self, offset: u32) -> Vec<(Option<u32>, ControlFlowEdge)> {
        self.block_node_of(offset)
            .map(|node| {
                self.graph
                    .edges(node)
                    .map(|edge| (self.graph[edge.target()].first_offset(), *edge.weight()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The underlying petgraph graph
    pub fn graph(&self) -> &DiGraph<BasicBlock, ControlFlowEdge> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{InstructionKind, RawInstruction};
    use crate::cfg::{BranchOutcome, EdgeKind};

    fn handle(offset: u32, kind: InstructionKind) -> Arc<BytecodeInstruction> {
        Arc::new(BytecodeInstruction::from_raw(
            Arc::from("Example"),
            Arc::from("run"),
            &RawInstruction::new(offset, kind),
        ))
    }

    fn diamond() -> RawControlFlowGraph {
        // 0 -> 1 (branch) -> {2 taken, 3 not-taken}, 2 -> 3
        let mut raw = RawControlFlowGraph::new("Example", "run");
        raw.add_vertex(handle(0, InstructionKind::Plain));
        raw.add_vertex(handle(1, InstructionKind::Branch));
        raw.add_vertex(handle(2, InstructionKind::Plain));
        raw.add_vertex(handle(3, InstructionKind::Return));
        raw.add_edge(0, 1, ControlFlowEdge::plain()).unwrap();
        raw.add_edge(1, 2, ControlFlowEdge::plain().with_outcome(BranchOutcome::Taken))
            .unwrap();
        raw.add_edge(1, 3, ControlFlowEdge::plain().with_outcome(BranchOutcome::NotTaken))
            .unwrap();
        raw.add_edge(2, 3, ControlFlowEdge::plain()).unwrap();
        raw
    }

    #[test]
    fn test_diamond_reduces_to_three_blocks() {
        let actual = ActualControlFlowGraph::from_raw(&diamond());
        assert_eq!(actual.block_count(), 3);
        assert_eq!(actual.edge_count(), 3);

        let entry = actual.entry_block().unwrap();
        assert_eq!(entry.first_offset(), Some(0));
        assert_eq!(entry.last_offset(), Some(1));
        assert_eq!(entry.instruction_count(), 2);

        assert_eq!(actual.block_of(2).unwrap().instruction_count(), 1);
        let exit = actual.block_of(3).unwrap();
        assert!(exit.is_exit);
        assert_eq!(exit.instruction_count(), 1);
    }

    #[test]
    fn test_diamond_preserves_branch_tags() {
        let actual = ActualControlFlowGraph::from_raw(&diamond());
        let mut out = actual.outgoing_edges(1);
        out.sort_by_key(|(target, _)| *target);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], (Some(2), ControlFlowEdge::plain().with_outcome(BranchOutcome::Taken)));
        assert_eq!(
            out[1],
            (Some(3), ControlFlowEdge::plain().with_outcome(BranchOutcome::NotTaken))
        );
    }

    #[test]
    fn test_straight_line_is_one_block_per_exit_rule() {
        // 0 -> 1 -> 2 where 2 returns; 2 has no successors and starts its
        // own block per the boundary rule.
        let mut raw = RawControlFlowGraph::new("Example", "run");
        raw.add_vertex(handle(0, InstructionKind::Plain));
        raw.add_vertex(handle(1, InstructionKind::Plain));
        raw.add_vertex(handle(2, InstructionKind::Return));
        raw.add_edge(0, 1, ControlFlowEdge::plain()).unwrap();
        raw.add_edge(1, 2, ControlFlowEdge::plain()).unwrap();

        let actual = ActualControlFlowGraph::from_raw(&raw);
        assert_eq!(actual.block_count(), 2);
        let entry = actual.entry_block().unwrap();
        assert_eq!(entry.instruction_count(), 2);
        assert!(actual.block_of(2).unwrap().is_exit);
        assert_eq!(actual.edge_count(), 1);
    }

    #[test]
    fn test_exception_edge_target_starts_block() {
        // 0 -> 1 -> 2 with an exception edge 1 -> 3 (handler) and 3 -> 2.
        let mut raw = RawControlFlowGraph::new("Example", "run");
        raw.add_vertex(handle(0, InstructionKind::Plain));
        raw.add_vertex(handle(1, InstructionKind::Plain));
        raw.add_vertex(handle(2, InstructionKind::Return));
        raw.add_vertex(handle(3, InstructionKind::Plain));
        raw.add_edge(0, 1, ControlFlowEdge::plain()).unwrap();
        raw.add_edge(1, 2, ControlFlowEdge::plain()).unwrap();
        raw.add_edge(1, 3, ControlFlowEdge::exception()).unwrap();
        raw.add_edge(3, 2, ControlFlowEdge::plain()).unwrap();

        let actual = ActualControlFlowGraph::from_raw(&raw);
        // {0,1}, {2}, {3}: 2 is a join and an exit, 3 is a handler target.
        assert_eq!(actual.block_count(), 3);
        let handler = actual.block_of(3).unwrap();
        assert_eq!(handler.instruction_count(), 1);

        let out = actual.outgoing_edges(1);
        assert!(out
            .iter()
            .any(|(target, edge)| *target == Some(3) && edge.kind == EdgeKind::Exception));
    }

    #[test]
    fn test_empty_raw_graph_reduces_to_empty() {
        let raw = RawControlFlowGraph::new("Example", "native");
        let actual = ActualControlFlowGraph::from_raw(&raw);
        assert_eq!(actual.block_count(), 0);
        assert_eq!(actual.edge_count(), 0);
        assert!(actual.entry_block().is_none());
    }

    #[test]
    fn test_parallel_switch_edges_survive_reduction() {
        // Switch at 0 with two cases targeting 1.
        let mut raw = RawControlFlowGraph::new("Example", "run");
        raw.add_vertex(handle(0, InstructionKind::Switch));
        raw.add_vertex(handle(1, InstructionKind::Return));
        raw.add_edge(0, 1, ControlFlowEdge::plain()).unwrap();
        raw.add_edge(0, 1, ControlFlowEdge::plain()).unwrap();

        let actual = ActualControlFlowGraph::from_raw(&raw);
        assert_eq!(actual.block_count(), 2);
        assert_eq!(actual.edge_count(), 2);
    }
}
