use lola_ir::{Instruction, StringId};

use super::CodeBuilder;

#[test]
fn forward_jump_is_patched_to_current_offset() {
    let mut b = CodeBuilder::new();
    let patch = b.emit_forward(Instruction::JumpIfFalse(0));
    b.emit(Instruction::PushVoid);
    b.emit(Instruction::Pop);
    b.patch_here(patch).unwrap();
    b.emit(Instruction::ReturnVoid);

    let (code, _) = b.finish();
    assert_eq!(code[0], Instruction::JumpIfFalse(3));
}

#[test]
fn iter_next_exit_is_patched() {
    let mut b = CodeBuilder::new();
    let patch = b.emit_forward(Instruction::IterNext {
        array: 0,
        cursor: 1,
        exit: 0,
    });
    b.emit(Instruction::Pop);
    b.patch_here(patch).unwrap();

    let (code, _) = b.finish();
    assert_eq!(
        code[0],
        Instruction::IterNext {
            array: 0,
            cursor: 1,
            exit: 2
        }
    );
}

#[test]
fn interning_deduplicates() {
    let mut b = CodeBuilder::new();
    let a = b.intern("Print").unwrap();
    let c = b.intern("x").unwrap();
    let a2 = b.intern("Print").unwrap();
    assert_eq!(a, a2);
    assert_ne!(a, c);
    assert_eq!(a, StringId::new(0));

    let (_, strings) = b.finish();
    assert_eq!(strings.len(), 2);
}
