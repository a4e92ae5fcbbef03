//! Instruction pool
//!
//! Process-wide interning store for instruction handles. For every
//! registered method the pool holds exactly one `Arc<BytecodeInstruction>`
//! per offset; repeated lookups with the same (unit, method, offset) return
//! clones of the same handle, so handle equality doubles as identity.

use crate::bytecode::instruction::{BytecodeInstruction, MethodBody};
use crate::diagnostics::DiagnosticSink;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Key identifying one method within one compilation unit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    /// Compilation unit (e.g. class) name
    pub unit: Arc<str>,
    /// Method name
    pub method: Arc<str>,
}

impl MethodKey {
    /// Create a key from unit and method names
    pub fn new(unit: &str, method: &str) -> Self {
        Self {
            unit: Arc::from(unit),
            method: Arc::from(method),
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.unit, self.method)
    }
}

/// Process-wide store of interned instruction handles, keyed by method
///
/// Shared via `Arc` across per-method builders. Registration is serialized
/// per key by a single insert-if-absent under the write lock, so two
/// concurrent attempts to register the same method cannot both succeed.
#[derive(Debug, Default)]
pub struct InstructionPool {
    methods: RwLock<HashMap<MethodKey, HashMap<u32, Arc<BytecodeInstruction>>>>,
}

impl InstructionPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern one handle per instruction of a method body
    ///
    /// Fails with [`Error::MethodAlreadyRegistered`] if the method was
    /// registered before, including by a concurrent caller.
    pub fn register(&self, unit: &str, method: &str, body: &MethodBody) -> Result<()> {
        let key = MethodKey::new(unit, method);
        let mut methods = self
            .methods
            .write()
            .map_err(|_| Error::internal("instruction pool lock poisoned"))?;

        if methods.contains_key(&key) {
            return Err(Error::already_registered(unit, method));
        }

        let mut interned = HashMap::with_capacity(body.instructions.len());
        for raw in &body.instructions {
            let instruction = BytecodeInstruction::from_raw(
                Arc::clone(&key.unit),
                Arc::clone(&key.method),
                raw,
            );
            interned.insert(raw.offset, Arc::new(instruction));
        }
        methods.insert(key, interned);
        Ok(())
    }

    /// Look up the interned handle for (unit, method, offset)
    ///
    /// An unregistered method is a caller sequencing bug
    /// ([`Error::UnknownMethod`]); a registered method without the offset
    /// indicates pool corruption ([`Error::Internal`]), since registration
    /// interns every decoded instruction.
    pub fn lookup(&self, unit: &str, method: &str, offset: u32) -> Result<Arc<BytecodeInstruction>> {
        let key = MethodKey::new(unit, method);
        let methods = self
            .methods
            .read()
            .map_err(|_| Error::internal("instruction pool lock poisoned"))?;

        let interned = methods
            .get(&key)
            .ok_or_else(|| Error::unknown_method(unit, method))?;

        interned.get(&offset).cloned().ok_or_else(|| {
            Error::internal(format!(
                "no interned instruction at offset {} of {}",
                offset, key
            ))
        })
    }

    /// Whether a method has been registered
    pub fn contains_method(&self, unit: &str, method: &str) -> bool {
        self.methods
            .read()
            .map(|methods| methods.contains_key(&MethodKey::new(unit, method)))
            .unwrap_or(false)
    }

    /// Number of interned instructions for a method, if registered
    pub fn instruction_count(&self, unit: &str, method: &str) -> Option<usize> {
        self.methods
            .read()
            .ok()
            .and_then(|methods| methods.get(&MethodKey::new(unit, method)).map(HashMap::len))
    }

    /// Dump a method's interned instructions to the diagnostic sink
    pub fn log_instructions_in(&self, unit: &str, method: &str, sink: &dyn DiagnosticSink) {
        let key = MethodKey::new(unit, method);
        let Ok(methods) = self.methods.read() else {
            return;
        };
        let Some(interned) = methods.get(&key) else {
            sink.info(&format!("no instructions interned for {}", key));
            return;
        };
        let mut offsets: Vec<u32> = interned.keys().copied().collect();
        offsets.sort_unstable();
        for offset in offsets {
            if let Some(instruction) = interned.get(&offset) {
                sink.info(&format!("  {}", instruction));
            }
        }
    }
}
