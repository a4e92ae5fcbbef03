//! Graph registry
//!
//! Process-wide keyed store of finished raw and actual graphs, shared by
//! downstream consumers (coverage instrumentation, def-use analysis,
//! control dependence). Registration is insert-if-absent per (unit, method)
//! key; readers get cheap `Arc` clones.

use crate::bytecode::MethodKey;
use crate::cfg::{ActualControlFlowGraph, RawControlFlowGraph};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Keyed store of finished control flow graphs
#[derive(Debug, Default)]
pub struct CfgRegistry {
    raw: RwLock<HashMap<MethodKey, Arc<RawControlFlowGraph>>>,
    actual: RwLock<HashMap<MethodKey, Arc<ActualControlFlowGraph>>>,
}

impl CfgRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a finished raw graph
    pub fn register_raw(&self, graph: Arc<RawControlFlowGraph>) -> Result<()> {
        let key = MethodKey::new(graph.unit(), graph.method());
        let mut raw = self
            .raw
            .write()
            .map_err(|_| Error::internal("registry lock poisoned"))?;
        if raw.contains_key(&key) {
            return Err(Error::already_registered(graph.unit(), graph.method()));
        }
        raw.insert(key, graph);
        Ok(())
    }

    /// Register a finished actual graph
    pub fn register_actual(&self, graph: Arc<ActualControlFlowGraph>) -> Result<()> {
        let key = MethodKey::new(graph.unit(), graph.method());
        let mut actual = self
            .actual
            .write()
            .map_err(|_| Error::internal("registry lock poisoned"))?;
        if actual.contains_key(&key) {
            return Err(Error::already_registered(graph.unit(), graph.method()));
        }
        actual.insert(key, graph);
        Ok(())
    }

    /// The raw graph of (unit, method), if registered
    pub fn raw_graph(&self, unit: &str, method: &str) -> Option<Arc<RawControlFlowGraph>> {
        self.raw
            .read()
            .ok()
            .and_then(|raw| raw.get(&MethodKey::new(unit, method)).cloned())
    }

    /// The actual graph of (unit, method), if registered
    ///
    /// Absent for native methods, which never get a block-level graph.
    pub fn actual_graph(&self, unit: &str, method: &str) -> Option<Arc<ActualControlFlowGraph>> {
        self.actual
            .read()
            .ok()
            .and_then(|actual| actual.get(&MethodKey::new(unit, method)).cloned())
    }

    /// Whether a raw graph is registered for (unit, method)
    pub fn contains_raw(&self, unit: &str, method: &str) -> bool {
        self.raw_graph(unit, method).is_some()
    }

    /// Whether an actual graph is registered for (unit, method)
    pub fn contains_actual(&self, unit: &str, method: &str) -> bool {
        self.actual_graph(unit, method).is_some()
    }

    /// Number of registered raw graphs
    pub fn raw_count(&self) -> usize {
        self.raw.read().map(|raw| raw.len()).unwrap_or(0)
    }

    /// Number of registered actual graphs
    pub fn actual_count(&self) -> usize {
        self.actual.read().map(|actual| actual.len()).unwrap_or(0)
    }

    /// Drop all registered graphs
    pub fn clear(&self) {
        if let Ok(mut raw) = self.raw.write() {
            raw.clear();
        }
        if let Ok(mut actual) = self.actual.write() {
            actual.clear();
        }
    }
}
