//! Control flow: TRAP, ECALLI, JUMP, JUMP_IND, LOAD_IMM_JUMP, LOAD_IMM_JUMP_IND and the
//! shared branch/djump rules (Gray Paper A.4).

use crate::config::{DYNAMIC_ADDRESS_ALIGNMENT, HALT_ADDRESS};
use crate::instructions::{InstructionContext, Opcode};
use crate::types::ExitReason;

/// TRAP (0)
#[must_use]
pub const fn trap() -> ExitReason {
    ExitReason::Panic
}

/// ECALLI (10): host call with the immediate as identifier.
#[must_use]
pub const fn ecalli(immediate: u64) -> ExitReason {
    ExitReason::HostCall(immediate as u32)
}

/// branch(b, C): not taken continues; a taken branch must land on a block start
/// holding a valid opcode, otherwise panic with the pc left in place.
pub fn branch(context: &mut InstructionContext<'_>, target: u32, taken: bool) -> ExitReason {
    if !taken {
        return ExitReason::Continue;
    }
    let valid_opcode = context
        .program
        .code
        .get(target as usize)
        .is_some_and(|&byte| Opcode::try_from(byte).is_ok());
    if !context.program.is_block_start(target) || !valid_opcode {
        return ExitReason::Panic;
    }
    context.next_pc = Some(target);
    ExitReason::Continue
}

/// djump(a): halt on the halt address, else resolve through the jump table.
pub fn djump(context: &mut InstructionContext<'_>, address: u64) -> ExitReason {
    let a = address & 0xffff_ffff;
    if a == u64::from(HALT_ADDRESS) {
        return ExitReason::Halt;
    }
    let entries = u64::from(context.program.jump_table_entries);
    if a == 0 || a > entries * DYNAMIC_ADDRESS_ALIGNMENT || a % DYNAMIC_ADDRESS_ALIGNMENT != 0 {
        return ExitReason::Panic;
    }
    let Some(target) = context.program.jump_target(a / DYNAMIC_ADDRESS_ALIGNMENT - 1) else {
        return ExitReason::Panic;
    };
    if !context.program.is_block_start(target) {
        return ExitReason::Panic;
    }
    context.next_pc = Some(target);
    ExitReason::Continue
}

/// JUMP (40)
pub fn jump(context: &mut InstructionContext<'_>, target: u32) -> ExitReason {
    branch(context, target, true)
}

/// JUMP_IND (50): djump((ω_A + ν_X) mod 2^32)
pub fn jump_ind(context: &mut InstructionContext<'_>, a: usize, x: u64) -> ExitReason {
    let address = context.registers[a].wrapping_add(x);
    djump(context, address)
}

/// LOAD_IMM_JUMP (80): ω_A = ν_X, then branch(ν_Y, ⊤).
pub fn load_imm_jump(context: &mut InstructionContext<'_>, a: usize, x: u64, target: u32) -> ExitReason {
    context.registers[a] = x;
    branch(context, target, true)
}

/// LOAD_IMM_JUMP_IND (180): ω_B is read before ω_A = ν_X, then djump(ω_B + ν_Y).
pub fn load_imm_jump_ind(
    context: &mut InstructionContext<'_>,
    a: usize,
    b: usize,
    x: u64,
    y: u64,
) -> ExitReason {
    let address = context.registers[b].wrapping_add(y);
    context.registers[a] = x;
    djump(context, address)
}

#[cfg(test)]
mod tests {
    use crate::instructions::step;
    use crate::instructions::test_support::assemble;
    use crate::ram::Memory;
    use crate::types::ExitReason;

    #[test]
    fn djump_to_halt_address_halts_in_place() {
        // jump_ind r0 + 0 with r0 = 0xFFFF0000
        let program = assemble(&[&[50, 0x00], &[0]], &[]);
        let mut registers = [0; 13];
        registers[0] = 0xFFFF_0000;
        let mut memory = Memory::new();
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Halt, 0));
    }

    #[test]
    fn djump_through_table() {
        // 0: jump_ind r0 ; 2: trap ; 3: fallthrough
        let program = assemble(&[&[50, 0x00], &[0], &[1]], &[3, 2]);
        let mut memory = Memory::new();

        let mut registers = [0; 13];
        registers[0] = 2;
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Continue, 3));

        registers[0] = 4;
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Continue, 2));
    }

    #[test]
    fn djump_rejects_bad_addresses() {
        let program = assemble(&[&[50, 0x00], &[0], &[1]], &[3, 2]);
        let mut memory = Memory::new();
        for address in [0u64, 1, 3, 6] {
            let mut registers = [0; 13];
            registers[0] = address;
            assert_eq!(
                step(&program, &mut registers, &mut memory, 0),
                (ExitReason::Panic, 0),
                "address {address}"
            );
        }
    }

    #[test]
    fn djump_to_non_block_start_panics() {
        // 0: jump_ind r0 ; 2: load_imm r1, 1 ; 5: trap. Offset 5 follows a non-terminator.
        let program = assemble(&[&[50, 0x00], &[51, 0x01, 1], &[0]], &[5]);
        let mut registers = [0; 13];
        registers[0] = 2;
        let mut memory = Memory::new();
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Panic, 0));
    }

    #[test]
    fn jump_to_non_block_start_panics() {
        // 0: jump +4 (into load_imm operands) ; 2: load_imm r1, 1 ; 5: trap
        let program = assemble(&[&[40, 4], &[51, 0x01, 1], &[0]], &[]);
        let mut registers = [0; 13];
        let mut memory = Memory::new();
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Panic, 0));
    }

    #[test]
    fn jump_to_self_loops() {
        let program = assemble(&[&[40, 0]], &[]);
        let mut registers = [0; 13];
        let mut memory = Memory::new();
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Continue, 0));
    }

    #[test]
    fn load_imm_jump_ind_reads_base_first() {
        // load_imm_jump_ind rA = r0, rB = r0: x = 9, y = 0; table[0] = 4
        let program = assemble(&[&[180, 0x00, 0x01, 9], &[0]], &[4]);
        let mut registers = [0; 13];
        registers[0] = 2;
        let mut memory = Memory::new();
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Continue, 4));
        assert_eq!(registers[0], 9);
    }
}
