//! Human-readable bytecode listing.
//!
//! One line per instruction (`offset  MNEMONIC operands`), preceded by a
//! header line wherever a function begins. Output is deterministic for a
//! given unit; the layout is for diagnostics only.

use std::fmt::Write;

use super::{CompiledUnit, FunctionEntry, Instruction, StringId};

/// Render the whole unit as text.
pub fn disassemble(unit: &CompiledUnit) -> String {
    let mut out = String::new();
    let mut headers: Vec<&FunctionEntry> = unit.functions().iter().collect();
    headers.push(unit.top_level());
    headers.sort_by_key(|f| f.entry);

    let mut next_header = headers.iter().peekable();
    for (pc, instr) in unit.code().iter().enumerate() {
        while let Some(header) = next_header.next_if(|h| h.entry as usize <= pc) {
            // Writing into a String cannot fail.
            let _ = writeln!(
                out,
                "{}({}) locals={}",
                header.name, header.arity, header.locals
            );
        }
        let _ = writeln!(out, "{pc:04}  {}", render(unit, instr));
    }
    out
}

fn render(unit: &CompiledUnit, instr: &Instruction) -> String {
    let op = instr.mnemonic();
    match *instr {
        Instruction::PushNumber(n) => format!("{op} {n}"),
        Instruction::PushString(id) => format!("{op} {:?}", lookup(unit, id)),
        Instruction::PushBool(b) => format!("{op} {b}"),
        Instruction::LoadLocal(slot) | Instruction::StoreLocal(slot) => format!("{op} {slot}"),
        Instruction::LoadGlobal(id) | Instruction::StoreGlobal(id) => {
            let name = unit.globals().get(id.index()).map_or("?", String::as_str);
            format!("{op} {} ({name})", id.raw())
        }
        Instruction::LoadHost(id) | Instruction::StoreHost(id) => {
            format!("{op} {}", lookup(unit, id))
        }
        Instruction::MakeArray(count) => format!("{op} {count}"),
        Instruction::Unary(un) => format!("{op} {}", un.as_symbol()),
        Instruction::Binary(bin) => format!("{op} {}", bin.as_symbol()),
        Instruction::Jump(target)
        | Instruction::JumpIfFalse(target)
        | Instruction::JumpIfTrue(target) => format!("{op} {target:04}"),
        Instruction::IterNext {
            array,
            cursor,
            exit,
        } => format!("{op} array={array} cursor={cursor} exit={exit:04}"),
        Instruction::CallScript { function, argc } => {
            let name = unit.function(function).map_or("?", |f| f.name.as_str());
            format!("{op} {name} argc={argc}")
        }
        Instruction::CallNative { name, argc } | Instruction::CallMethod { name, argc } => {
            format!("{op} {} argc={argc}", lookup(unit, name))
        }
        Instruction::PushVoid
        | Instruction::Pop
        | Instruction::LoadIndex
        | Instruction::StoreIndex
        | Instruction::Return
        | Instruction::ReturnVoid => op.to_string(),
    }
}

fn lookup(unit: &CompiledUnit, id: StringId) -> &str {
    unit.string(id).unwrap_or("?")
}
