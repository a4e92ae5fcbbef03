//! Raw control flow graph
//!
//! Instruction-level directed multigraph for one method. Vertices are
//! interned instruction handles, edges carry a [`ControlFlowEdge`] weight.
//! Parallel edges between the same ordered pair are permitted; two switch
//! cases may share a target, and a fallthrough may coincide with a branch
//! target.

use crate::bytecode::BytecodeInstruction;
use crate::cfg::ControlFlowEdge;
use crate::error::{Error, Result};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Instruction-level control flow graph of one method
#[derive(Debug)]
pub struct RawControlFlowGraph {
    unit: Arc<str>,
    method: Arc<str>,
    graph: DiGraph<Arc<BytecodeInstruction>, ControlFlowEdge>,
    offset_to_node: HashMap<u32, NodeIndex>,
}

impl RawControlFlowGraph {
    /// Create an empty raw graph for (unit, method)
    pub fn new(unit: &str, method: &str) -> Self {
        Self {
            unit: Arc::from(unit),
            method: Arc::from(method),
            graph: DiGraph::new(),
            offset_to_node: HashMap::new(),
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

    /// Insert a vertex for an instruction handle
    ///
    /// Idempotent: returns `false` and leaves the graph unchanged if the
    /// instruction is already a vertex.
    pub fn add_vertex(&mut self, instruction: Arc<BytecodeInstruction>) -> bool {
        if self.offset_to_node.contains_key(&instruction.offset) {
            return false;
        }
        let offset = instruction.offset;
        let node = self.graph.add_node(instruction);
        self.offset_to_node.insert(offset, node);
        true
    }

    /// Add a new edge between two present vertices
    ///
    /// Always creates a fresh edge (parallel edges accumulate). An absent
    /// endpoint is an internal invariant violation: the builder adds both
    /// vertices before every edge.
    pub fn add_edge(&mut self, src: u32, dst: u32, edge: ControlFlowEdge) -> Result<EdgeIndex> {
        let src_node = self.offset_to_node.get(&src).copied().ok_or_else(|| {
            Error::internal(format!("edge source {} is not a vertex of {}", src, self.method))
        })?;
        let dst_node = self.offset_to_node.get(&dst).copied().ok_or_else(|| {
            Error::internal(format!("edge target {} is not a vertex of {}", dst, self.method))
        })?;
        Ok(self.graph.add_edge(src_node, dst_node, edge))
    }

    /// Node index of the vertex at an offset
    pub fn node_of(&self, offset: u32) -> Option<NodeIndex> {
        self.offset_to_node.get(&offset).copied()
    }

    /// Instruction handle at an offset
    pub fn instruction_at(&self, offset: u32) -> Option<&Arc<BytecodeInstruction>> {
        self.node_of(offset).map(|node| &self.graph[node])
    }

    /// Whether an offset is a vertex
    pub fn contains_offset(&self, offset: u32) -> bool {
        self.offset_to_node.contains_key(&offset)
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges, parallel edges counted individually
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All vertex offsets, ascending
    pub fn offsets(&self) -> Vec<u32> {
        let mut offsets: Vec<u32> = self.offset_to_node.keys().copied().collect();
        offsets.sort_unstable();
        offsets
    }

    /// Incoming edge count of the vertex at an offset
    pub fn in_degree(&self, offset: u32) -> usize {
        self.node_of(offset)
            .map(|node| self.graph.edges_directed(node, Direction::Incoming).count())
            .unwrap_or(0)
    }

    /// Outgoing edge count of the vertex at an offset
    pub fn out_degree(&self, offset: u32) -> usize {
        self.node_of(offset)
            .map(|node| self.graph.edges_directed(node, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    /// Outgoing edges of an offset as (target offset, edge weight) pairs
    pub fn outgoing_edges(&self, offset: u32) -> Vec<(u32, ControlFlowEdge)> {
        self.node_of(offset)
            .map(|node| {
                self.graph
                    .edges_directed(node, Direction::Outgoing)
                    .map(|edge| (self.graph[edge.target()].offset, *edge.weight()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Incoming edges of an offset as (source offset, edge weight) pairs
    pub fn incoming_edges(&self, offset: u32) -> Vec<(u32, ControlFlowEdge)> {
        self.node_of(offset)
            .map(|node| {
                self.graph
                    .edges_directed(node, Direction::Incoming)
                    .map(|edge| (self.graph[edge.source()].offset, *edge.weight()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of outgoing non-exception edges of an offset
    pub fn non_exception_out_degree(&self, offset: u32) -> usize {
        self.outgoing_edges(offset)
            .iter()
            .filter(|(_, edge)| !edge.is_exception())
            .count()
    }

    /// Number of distinct non-exception successor offsets
    ///
    /// Parallel edges to the same target count once; more than one distinct
    /// target marks the vertex as a decision point for block reduction.
    pub fn distinct_successor_count(&self, offset: u32) -> usize {
        self.outgoing_edges(offset)
            .iter()
            .filter(|(_, edge)| !edge.is_exception())
            .map(|(target, _)| *target)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Number of distinct predecessor offsets, exception edges included
    pub fn distinct_predecessor_count(&self, offset: u32) -> usize {
        self.incoming_edges(offset)
            .iter()
            .map(|(source, _)| *source)
            .collect::<HashSet<_>>()
            .len()
    }

    /// The underlying petgraph graph
    pub fn graph(&self) -> &DiGraph<Arc<BytecodeInstruction>, ControlFlowEdge> {
        &self.graph
    }
}
