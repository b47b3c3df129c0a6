//! Conditional branch predicates: BRANCH_*_IMM (81–90) and register BRANCH_* (170–175).

use crate::instructions::Opcode;

/// Condition for the register-immediate branches. LOAD_IMM_JUMP is unconditional.
#[must_use]
pub fn immediate_condition(op: Opcode, a: u64, x: u64) -> bool {
    let (sa, sx) = (a as i64, x as i64);
    match op {
        Opcode::BranchEqImm => a == x,
        Opcode::BranchNeImm => a != x,
        Opcode::BranchLtUImm => a < x,
        Opcode::BranchLeUImm => a <= x,
        Opcode::BranchGeUImm => a >= x,
        Opcode::BranchGtUImm => a > x,
        Opcode::BranchLtSImm => sa < sx,
        Opcode::BranchLeSImm => sa <= sx,
        Opcode::BranchGeSImm => sa >= sx,
        Opcode::BranchGtSImm => sa > sx,
        _ => false,
    }
}

/// Condition for the two-register branches.
#[must_use]
pub fn register_condition(op: Opcode, a: u64, b: u64) -> bool {
    match op {
        Opcode::BranchEq => a == b,
        Opcode::BranchNe => a != b,
        Opcode::BranchLtU => a < b,
        Opcode::BranchLtS => (a as i64) < (b as i64),
        Opcode::BranchGeU => a >= b,
        Opcode::BranchGeS => (a as i64) >= (b as i64),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::step;
    use crate::instructions::test_support::assemble;
    use crate::ram::Memory;
    use crate::types::ExitReason;

    #[test]
    fn signed_and_unsigned_differ() {
        let minus_one = u64::MAX;
        assert!(immediate_condition(Opcode::BranchLtSImm, minus_one, 0));
        assert!(!immediate_condition(Opcode::BranchLtUImm, minus_one, 0));
        assert!(register_condition(Opcode::BranchGeU, minus_one, 0));
        assert!(!register_condition(Opcode::BranchGeS, minus_one, 0));
    }

    #[test]
    fn branch_taken_and_not_taken() {
        // 0: branch_eq_imm r0 == 5 -> +5 ; 4: trap ; 5: fallthrough
        let program = assemble(&[&[81, 0x10, 5, 5], &[0], &[1]], &[]);
        let mut memory = Memory::new();

        let mut registers = [0; 13];
        registers[0] = 5;
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Continue, 5));

        registers[0] = 6;
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Continue, 4));
    }

    #[test]
    fn taken_branch_to_non_block_start_panics() {
        // 0: branch_eq r0 == r1 -> +6 ; 3: load_imm r2, 1 ; 6: trap. Target 6 is not a block start.
        let program = assemble(&[&[170, 0x10, 6], &[51, 0x02, 1], &[0]], &[]);
        let mut registers = [0; 13];
        let mut memory = Memory::new();
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Panic, 0));
    }
}
