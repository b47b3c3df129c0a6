//! Memory instructions: LOAD_*, LOAD_IND_*, STORE_*, STORE_IND_*, STORE_IMM_*, STORE_IMM_IND_*.
//! Addresses wrap modulo 2^32; faults follow [`crate::ram::fault_reason`].

use crate::instructions::base::{bytes_to_value_le, sign_extend, value_to_bytes_le};
use crate::instructions::{InstructionContext, Opcode};
use crate::types::ExitReason;

/// (width in bytes, sign-extend) of a load opcode.
const fn load_width(op: Opcode) -> (usize, bool) {
    match op {
        Opcode::LoadU8 | Opcode::LoadIndU8 => (1, false),
        Opcode::LoadI8 | Opcode::LoadIndI8 => (1, true),
        Opcode::LoadU16 | Opcode::LoadIndU16 => (2, false),
        Opcode::LoadI16 | Opcode::LoadIndI16 => (2, true),
        Opcode::LoadU32 | Opcode::LoadIndU32 => (4, false),
        Opcode::LoadI32 | Opcode::LoadIndI32 => (4, true),
        _ => (8, false),
    }
}

/// Width in bytes of a store opcode.
const fn store_width(op: Opcode) -> usize {
    match op {
        Opcode::StoreU8 | Opcode::StoreIndU8 | Opcode::StoreImmU8 | Opcode::StoreImmIndU8 => 1,
        Opcode::StoreU16 | Opcode::StoreIndU16 | Opcode::StoreImmU16 | Opcode::StoreImmIndU16 => 2,
        Opcode::StoreU32 | Opcode::StoreIndU32 | Opcode::StoreImmU32 | Opcode::StoreImmIndU32 => 4,
        _ => 8,
    }
}

/// ω'_A = μ[address .. address + width], optionally sign-extended.
pub fn load(context: &mut InstructionContext<'_>, op: Opcode, a: usize, address: u64) -> ExitReason {
    let (width, signed) = load_width(op);
    match context.memory.load(address as u32, width as u64) {
        Ok(bytes) => {
            let value = bytes_to_value_le(&bytes);
            context.registers[a] = if signed { sign_extend(value, width) } else { value };
            ExitReason::Continue
        }
        Err(reason) => reason,
    }
}

/// μ'[address .. address + width] = value mod 2^(8·width)
pub fn store(context: &mut InstructionContext<'_>, op: Opcode, address: u64, value: u64) -> ExitReason {
    let bytes = value_to_bytes_le(value, store_width(op));
    match context.memory.store(address as u32, &bytes) {
        Ok(()) => ExitReason::Continue,
        Err(reason) => reason,
    }
}

/// STORE_IMM_* (30–33): μ'[ν_X] = ν_Y
pub fn store_imm(context: &mut InstructionContext<'_>, op: Opcode, x: u64, y: u64) -> ExitReason {
    store(context, op, x, y)
}
