//! CFG generator
//!
//! One generator instance builds the raw control flow graph for exactly one
//! method and hands the finished graphs to the registry. The external
//! driver calls it in a fixed sequence:
//!
//! - `register_method` interns the method's instructions in the pool and
//!   opens the raw graph,
//! - `register_control_flow_edge` is called once per possible transition
//!   between two instructions of the method,
//! - `finalize` registers the raw graph and, for non-native methods, the
//!   reduced block-level graph.
//!
//! Illegal call sequences are rejected through an explicit state machine
//! rather than silently ignored.

use crate::bytecode::{FrameTable, InstructionPool, MethodBody};
use crate::cfg::{
    ActualControlFlowGraph, BranchOutcome, CfgRegistry, ControlFlowEdge, EdgeKind,
    RawControlFlowGraph,
};
use crate::diagnostics::{default_sink, DiagnosticSink};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Lifecycle state of a [`CfgGenerator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// No method registered yet
    Uninitialized,
    /// Method registered, accepting edges
    MethodRegistered,
    /// Graphs computed and registered, read-only from here on
    Finalized,
}

/// Builder for one method's raw and actual control flow graphs
pub struct CfgGenerator {
    pool: Arc<InstructionPool>,
    sink: Arc<dyn DiagnosticSink>,
    state: GeneratorState,
    unit: String,
    method: String,
    is_native: bool,
    raw: Option<RawControlFlowGraph>,
}

impl CfgGenerator {
    /// Create a generator backed by the given instruction pool
    pub fn new(pool: Arc<InstructionPool>) -> Self {
        Self::with_sink(pool, default_sink())
    }

    /// Create a generator with an explicit diagnostic sink
    pub fn with_sink(pool: Arc<InstructionPool>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            pool,
            sink,
            state: GeneratorState::Uninitialized,
            unit: String::new(),
            method: String::new(),
            is_native: false,
            raw: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Compilation unit of the registered method
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Name of the registered method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The raw graph accumulated so far
    ///
    /// Present from method registration until `finalize` hands ownership to
    /// the registry; read it from the registry afterwards.
    pub fn raw_graph(&self) -> Option<&RawControlFlowGraph> {
        self.raw.as_ref()
    }

    /// Register the method this generator builds graphs for
    ///
    /// Interns every instruction of `body` in the pool and opens an empty
    /// raw graph. Must be called exactly once per generator, before any
    /// edge registration.
    pub fn register_method(&mut self, unit: &str, method: &str, body: &MethodBody) -> Result<()> {
        if self.state != GeneratorState::Uninitialized {
            return Err(Error::invalid_state(
                "register_method must not be called more than once per generator",
            ));
        }
        if unit.is_empty() || method.is_empty() {
            return Err(Error::invalid_argument(
                "unit and method identifiers must be non-empty",
            ));
        }

        self.pool.register(unit, method, body)?;

        self.unit = unit.to_string();
        self.method = method.to_string();
        self.is_native = body.is_native;
        self.raw = Some(RawControlFlowGraph::new(unit, method));
        self.state = GeneratorState::MethodRegistered;
        Ok(())
    }

    /// Record one possible control transfer between two instruction offsets
    ///
    /// The source must be reachable per the frame table; an unreachable
    /// source is a driver bug. An unreachable destination means the edge
    /// leads into code the dataflow pass eliminated: the edge is skipped
    /// with a diagnostic and the graph stays as it was.
    ///
    /// For a conditional-branch source, the first registered non-exception
    /// edge is tagged `Taken` and every later one `NotTaken`; registration
    /// order is the single source of truth for those tags.
    pub fn register_control_flow_edge(
        &mut self,
        src: u32,
        dst: u32,
        frames: &FrameTable,
        is_exception_edge: bool,
    ) -> Result<()> {
        if self.state != GeneratorState::MethodRegistered {
            return Err(Error::invalid_state(
                "register_control_flow_edge requires a registered, unfinalized method",
            ));
        }
        if !frames.is_reachable(src) {
            return Err(Error::invalid_argument(format!(
                "expected a frame for edge source {} of {}.{}",
                src, self.unit, self.method
            )));
        }
        if !frames.is_reachable(dst) {
            // Unreachable per the dataflow pass: suppress the edge and move on.
            self.sink.warn(&format!(
                "skipping edge {} -> {} of {}.{}: destination has no frame",
                src, dst, self.unit, self.method
            ));
            return Ok(());
        }

        let src_instruction = self.pool.lookup(&self.unit, &self.method, src)?;
        let dst_instruction = self.pool.lookup(&self.unit, &self.method, dst)?;

        let raw = self
            .raw
            .as_mut()
            .ok_or_else(|| Error::internal("raw graph missing in MethodRegistered state"))?;

        let outcome = if !is_exception_edge && src_instruction.is_branch() {
            if raw.non_exception_out_degree(src) == 0 {
                BranchOutcome::Taken
            } else {
                BranchOutcome::NotTaken
            }
        } else {
            BranchOutcome::Unset
        };

        let edge = ControlFlowEdge {
            kind: if is_exception_edge {
                EdgeKind::Exception
            } else {
                EdgeKind::Plain
            },
            outcome,
        };

        raw.add_vertex(src_instruction);
        raw.add_vertex(dst_instruction);

        if let Err(err) = raw.add_edge(src, dst, edge) {
            // Both endpoints were just added; a failure here means the
            // graph subsystem is corrupted, not that the input was bad.
            self.sink.error(&format!(
                "edge {} -> {} of {}.{} rejected on validated endpoints: {}",
                src, dst, self.unit, self.method, err
            ));
            return Err(err);
        }
        Ok(())
    }

    /// Compute the block-level graph and publish both graphs
    ///
    /// The raw graph is registered for every method, including native ones;
    /// the actual graph is computed and registered only when the method has
    /// an executable body. After this call the generator is finalized and
    /// rejects further mutation.
    pub fn finalize(&mut self, registry: &CfgRegistry) -> Result<()> {
        if self.state != GeneratorState::MethodRegistered {
            return Err(Error::invalid_state(
                "finalize requires a registered, unfinalized method",
            ));
        }

        let raw = self
            .raw
            .take()
            .ok_or_else(|| Error::internal("raw graph missing in MethodRegistered state"))?;

        self.pool
            .log_instructions_in(&self.unit, &self.method, self.sink.as_ref());

        let actual = if self.is_native {
            None
        } else {
            Some(ActualControlFlowGraph::from_raw(&raw))
        };

        let raw = Arc::new(raw);
        registry.register_raw(Arc::clone(&raw))?;
        if let Some(actual) = actual {
            registry.register_actual(Arc::new(actual))?;
        }

        self.state = GeneratorState::Finalized;
        Ok(())
    }
}
