//! Interning behavior of the shared instruction pool

use bytecode_cfg_rs::{
    CfgGenerator, CfgRegistry, FrameTable, InstructionKind, InstructionPool, MethodBody,
    RawInstruction,
};
use std::sync::Arc;

fn two_instruction_body() -> MethodBody {
    MethodBody::new(vec![
        RawInstruction::new(0, InstructionKind::Plain).with_operands(vec![0x2a]),
        RawInstruction::new(1, InstructionKind::Return),
    ])
}

#[test]
fn test_graph_vertices_are_pool_handles() {
    let pool = Arc::new(InstructionPool::new());
    let registry = CfgRegistry::new();
    let frames = FrameTable::all_reachable(2);

    let mut generator = CfgGenerator::new(Arc::clone(&pool));
    generator.register_method("Example", "run", &two_instruction_body()).unwrap();
    generator.register_control_flow_edge(0, 1, &frames, false).unwrap();
    generator.finalize(&registry).unwrap();

    let raw = registry.raw_graph("Example", "run").unwrap();
    let vertex = raw.instruction_at(0).unwrap();
    let interned = pool.lookup("Example", "run", 0).unwrap();
    assert!(Arc::ptr_eq(vertex, &interned));
    assert_eq!(interned.operands, vec![0x2a]);
}

#[test]
fn test_pool_keys_units_independently() {
    let pool = InstructionPool::new();
    pool.register("Alpha", "run", &two_instruction_body()).unwrap();
    pool.register("Beta", "run", &two_instruction_body()).unwrap();

    let a = pool.lookup("Alpha", "run", 0).unwrap();
    let b = pool.lookup("Beta", "run", 0).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(a, b);
    assert_eq!(a.offset, b.offset);
}

#[test]
fn test_handle_equality_is_identity() {
    let pool = InstructionPool::new();
    pool.register("Example", "run", &two_instruction_body()).unwrap();

    let first = pool.lookup("Example", "run", 1).unwrap();
    let second = pool.lookup("Example", "run", 1).unwrap();
    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first, &second));
}
