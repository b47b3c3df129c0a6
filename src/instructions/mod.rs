//! Instruction set (Gray Paper Appendix A.5). Closed opcode enum and single-step dispatch.

pub mod arithmetic;
pub mod base;
pub mod bitwise;
pub mod branching;
pub mod comparison;
pub mod control_flow;
pub mod memory;
pub mod multiplication_upper;
pub mod shifts;

use crate::parser::Program;
use crate::ram::Memory;
use crate::types::{ExitReason, Registers};
use base::{Args, Operands, Shape};

macro_rules! opcodes {
    ($($name:ident = $value:literal, $text:literal, $shape:ident;)*) => {
        /// PVM opcode.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $($name = $value,)*
        }

        impl TryFrom<u8> for Opcode {
            type Error = u8;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$name),)*
                    other => Err(other),
                }
            }
        }

        impl Opcode {
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => $text,)*
                }
            }

            #[must_use]
            pub const fn shape(self) -> Shape {
                match self {
                    $(Self::$name => Shape::$shape,)*
                }
            }
        }
    };
}

opcodes! {
    Trap = 0, "trap", NoArgs;
    Fallthrough = 1, "fallthrough", NoArgs;
    Ecalli = 10, "ecalli", OneImmediate;
    LoadImm64 = 20, "load_imm_64", RegisterExtendedImmediate;
    StoreImmU8 = 30, "store_imm_u8", TwoImmediates;
    StoreImmU16 = 31, "store_imm_u16", TwoImmediates;
    StoreImmU32 = 32, "store_imm_u32", TwoImmediates;
    StoreImmU64 = 33, "store_imm_u64", TwoImmediates;
    Jump = 40, "jump", OneOffset;
    JumpInd = 50, "jump_ind", RegisterImmediate;
    LoadImm = 51, "load_imm", RegisterImmediate;
    LoadU8 = 52, "load_u8", RegisterImmediate;
    LoadI8 = 53, "load_i8", RegisterImmediate;
    LoadU16 = 54, "load_u16", RegisterImmediate;
    LoadI16 = 55, "load_i16", RegisterImmediate;
    LoadU32 = 56, "load_u32", RegisterImmediate;
    LoadI32 = 57, "load_i32", RegisterImmediate;
    LoadU64 = 58, "load_u64", RegisterImmediate;
    StoreU8 = 59, "store_u8", RegisterImmediate;
    StoreU16 = 60, "store_u16", RegisterImmediate;
    StoreU32 = 61, "store_u32", RegisterImmediate;
    StoreU64 = 62, "store_u64", RegisterImmediate;
    StoreImmIndU8 = 70, "store_imm_ind_u8", RegisterTwoImmediates;
    StoreImmIndU16 = 71, "store_imm_ind_u16", RegisterTwoImmediates;
    StoreImmIndU32 = 72, "store_imm_ind_u32", RegisterTwoImmediates;
    StoreImmIndU64 = 73, "store_imm_ind_u64", RegisterTwoImmediates;
    LoadImmJump = 80, "load_imm_jump", RegisterImmediateOffset;
    BranchEqImm = 81, "branch_eq_imm", RegisterImmediateOffset;
    BranchNeImm = 82, "branch_ne_imm", RegisterImmediateOffset;
    BranchLtUImm = 83, "branch_lt_u_imm", RegisterImmediateOffset;
    BranchLeUImm = 84, "branch_le_u_imm", RegisterImmediateOffset;
    BranchGeUImm = 85, "branch_ge_u_imm", RegisterImmediateOffset;
    BranchGtUImm = 86, "branch_gt_u_imm", RegisterImmediateOffset;
    BranchLtSImm = 87, "branch_lt_s_imm", RegisterImmediateOffset;
    BranchLeSImm = 88, "branch_le_s_imm", RegisterImmediateOffset;
    BranchGeSImm = 89, "branch_ge_s_imm", RegisterImmediateOffset;
    BranchGtSImm = 90, "branch_gt_s_imm", RegisterImmediateOffset;
    MoveReg = 100, "move_reg", TwoRegisters;
    Sbrk = 101, "sbrk", TwoRegisters;
    CountSetBits64 = 102, "count_set_bits_64", TwoRegisters;
    CountSetBits32 = 103, "count_set_bits_32", TwoRegisters;
    LeadingZeroBits64 = 104, "leading_zero_bits_64", TwoRegisters;
    LeadingZeroBits32 = 105, "leading_zero_bits_32", TwoRegisters;
    TrailingZeroBits64 = 106, "trailing_zero_bits_64", TwoRegisters;
    TrailingZeroBits32 = 107, "trailing_zero_bits_32", TwoRegisters;
    SignExtend8 = 108, "sign_extend_8", TwoRegisters;
    SignExtend16 = 109, "sign_extend_16", TwoRegisters;
    ZeroExtend16 = 110, "zero_extend_16", TwoRegisters;
    ReverseBytes = 111, "reverse_bytes", TwoRegisters;
    StoreIndU8 = 120, "store_ind_u8", TwoRegistersImmediate;
    StoreIndU16 = 121, "store_ind_u16", TwoRegistersImmediate;
    StoreIndU32 = 122, "store_ind_u32", TwoRegistersImmediate;
    StoreIndU64 = 123, "store_ind_u64", TwoRegistersImmediate;
    LoadIndU8 = 124, "load_ind_u8", TwoRegistersImmediate;
    LoadIndI8 = 125, "load_ind_i8", TwoRegistersImmediate;
    LoadIndU16 = 126, "load_ind_u16", TwoRegistersImmediate;
    LoadIndI16 = 127, "load_ind_i16", TwoRegistersImmediate;
    LoadIndU32 = 128, "load_ind_u32", TwoRegistersImmediate;
    LoadIndI32 = 129, "load_ind_i32", TwoRegistersImmediate;
    LoadIndU64 = 130, "load_ind_u64", TwoRegistersImmediate;
    AddImm32 = 131, "add_imm_32", TwoRegistersImmediate;
    AndImm = 132, "and_imm", TwoRegistersImmediate;
    XorImm = 133, "xor_imm", TwoRegistersImmediate;
    OrImm = 134, "or_imm", TwoRegistersImmediate;
    MulImm32 = 135, "mul_imm_32", TwoRegistersImmediate;
    SetLtUImm = 136, "set_lt_u_imm", TwoRegistersImmediate;
    SetLtSImm = 137, "set_lt_s_imm", TwoRegistersImmediate;
    ShloLImm32 = 138, "shlo_l_imm_32", TwoRegistersImmediate;
    ShloRImm32 = 139, "shlo_r_imm_32", TwoRegistersImmediate;
    SharRImm32 = 140, "shar_r_imm_32", TwoRegistersImmediate;
    NegAddImm32 = 141, "neg_add_imm_32", TwoRegistersImmediate;
    SetGtUImm = 142, "set_gt_u_imm", TwoRegistersImmediate;
    SetGtSImm = 143, "set_gt_s_imm", TwoRegistersImmediate;
    ShloLImmAlt32 = 144, "shlo_l_imm_alt_32", TwoRegistersImmediate;
    ShloRImmAlt32 = 145, "shlo_r_imm_alt_32", TwoRegistersImmediate;
    SharRImmAlt32 = 146, "shar_r_imm_alt_32", TwoRegistersImmediate;
    CmovIzImm = 147, "cmov_iz_imm", TwoRegistersImmediate;
    CmovNzImm = 148, "cmov_nz_imm", TwoRegistersImmediate;
    AddImm64 = 149, "add_imm_64", TwoRegistersImmediate;
    MulImm64 = 150, "mul_imm_64", TwoRegistersImmediate;
    ShloLImm64 = 151, "shlo_l_imm_64", TwoRegistersImmediate;
    ShloRImm64 = 152, "shlo_r_imm_64", TwoRegistersImmediate;
    SharRImm64 = 153, "shar_r_imm_64", TwoRegistersImmediate;
    NegAddImm64 = 154, "neg_add_imm_64", TwoRegistersImmediate;
    ShloLImmAlt64 = 155, "shlo_l_imm_alt_64", TwoRegistersImmediate;
    ShloRImmAlt64 = 156, "shlo_r_imm_alt_64", TwoRegistersImmediate;
    SharRImmAlt64 = 157, "shar_r_imm_alt_64", TwoRegistersImmediate;
    RotR64Imm = 158, "rot_r_64_imm", TwoRegistersImmediate;
    RotR64ImmAlt = 159, "rot_r_64_imm_alt", TwoRegistersImmediate;
    RotR32Imm = 160, "rot_r_32_imm", TwoRegistersImmediate;
    RotR32ImmAlt = 161, "rot_r_32_imm_alt", TwoRegistersImmediate;
    BranchEq = 170, "branch_eq", TwoRegistersOffset;
    BranchNe = 171, "branch_ne", TwoRegistersOffset;
    BranchLtU = 172, "branch_lt_u", TwoRegistersOffset;
    BranchLtS = 173, "branch_lt_s", TwoRegistersOffset;
    BranchGeU = 174, "branch_ge_u", TwoRegistersOffset;
    BranchGeS = 175, "branch_ge_s", TwoRegistersOffset;
    LoadImmJumpInd = 180, "load_imm_jump_ind", TwoRegistersTwoImmediates;
    Add32 = 190, "add_32", ThreeRegisters;
    Sub32 = 191, "sub_32", ThreeRegisters;
    Mul32 = 192, "mul_32", ThreeRegisters;
    DivU32 = 193, "div_u_32", ThreeRegisters;
    DivS32 = 194, "div_s_32", ThreeRegisters;
    RemU32 = 195, "rem_u_32", ThreeRegisters;
    RemS32 = 196, "rem_s_32", ThreeRegisters;
    ShloL32 = 197, "shlo_l_32", ThreeRegisters;
    ShloR32 = 198, "shlo_r_32", ThreeRegisters;
    SharR32 = 199, "shar_r_32", ThreeRegisters;
    Add64 = 200, "add_64", ThreeRegisters;
    Sub64 = 201, "sub_64", ThreeRegisters;
    Mul64 = 202, "mul_64", ThreeRegisters;
    DivU64 = 203, "div_u_64", ThreeRegisters;
    DivS64 = 204, "div_s_64", ThreeRegisters;
    RemU64 = 205, "rem_u_64", ThreeRegisters;
    RemS64 = 206, "rem_s_64", ThreeRegisters;
    ShloL64 = 207, "shlo_l_64", ThreeRegisters;
    ShloR64 = 208, "shlo_r_64", ThreeRegisters;
    SharR64 = 209, "shar_r_64", ThreeRegisters;
    And = 210, "and", ThreeRegisters;
    Xor = 211, "xor", ThreeRegisters;
    Or = 212, "or", ThreeRegisters;
    MulUpperSS = 213, "mul_upper_s_s", ThreeRegisters;
    MulUpperUU = 214, "mul_upper_u_u", ThreeRegisters;
    MulUpperSU = 215, "mul_upper_s_u", ThreeRegisters;
    SetLtU = 216, "set_lt_u", ThreeRegisters;
    SetLtS = 217, "set_lt_s", ThreeRegisters;
    CmovIz = 218, "cmov_iz", ThreeRegisters;
    CmovNz = 219, "cmov_nz", ThreeRegisters;
    RotL64 = 220, "rot_l_64", ThreeRegisters;
    RotL32 = 221, "rot_l_32", ThreeRegisters;
    RotR64 = 222, "rot_r_64", ThreeRegisters;
    RotR32 = 223, "rot_r_32", ThreeRegisters;
    AndInv = 224, "and_inv", ThreeRegisters;
    OrInv = 225, "or_inv", ThreeRegisters;
    Xnor = 226, "xnor", ThreeRegisters;
    Max = 227, "max", ThreeRegisters;
    MaxU = 228, "max_u", ThreeRegisters;
    Min = 229, "min", ThreeRegisters;
    MinU = 230, "min_u", ThreeRegisters;
}

impl Opcode {
    /// Ends a basic block (Gray Paper T).
    #[must_use]
    pub const fn is_terminator(self) -> bool {
        matches!(
            self,
            Self::Trap
                | Self::Fallthrough
                | Self::Jump
                | Self::JumpInd
                | Self::LoadImmJump
                | Self::BranchEqImm
                | Self::BranchNeImm
                | Self::BranchLtUImm
                | Self::BranchLeUImm
                | Self::BranchGeUImm
                | Self::BranchGtUImm
                | Self::BranchLtSImm
                | Self::BranchLeSImm
                | Self::BranchGeSImm
                | Self::BranchGtSImm
                | Self::BranchEq
                | Self::BranchNe
                | Self::BranchLtU
                | Self::BranchLtS
                | Self::BranchGeU
                | Self::BranchGeS
                | Self::LoadImmJumpInd
        )
    }
}

/// Whether `byte` is a terminator opcode. Unknown bytes are not.
#[must_use]
pub fn is_terminator(byte: u8) -> bool {
    Opcode::try_from(byte).is_ok_and(Opcode::is_terminator)
}

/// Decoded instruction at a program counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub args: Args,
    /// Fskip at this pc; the instruction occupies `skip + 1` bytes.
    pub skip: u32,
}

/// Decode the instruction at `pc`. None when pc is outside the code, not an instruction
/// start, or the byte is not an opcode.
#[must_use]
pub fn decode(program: &Program, pc: u32) -> Option<Instruction> {
    if !program.is_instruction_start(pc) {
        return None;
    }
    let opcode = Opcode::try_from(*program.code.get(pc as usize)?).ok()?;
    let skip = program.skip(pc);
    let args = Operands::new(&program.code, pc, skip).decode(opcode.shape(), pc);
    Some(Instruction { opcode, args, skip })
}

/// Machine state an instruction reads and mutates.
pub struct InstructionContext<'a> {
    pub program: &'a Program,
    pub registers: &'a mut Registers,
    pub memory: &'a mut Memory,
    /// Pc of the executing instruction.
    pub pc: u32,
    /// Set by taken branches and jumps; otherwise execution falls through.
    pub next_pc: Option<u32>,
}

/// Execute one instruction at `pc`, returning the exit reason and the pc to resume at.
/// Panics, faults and halts leave the pc on the faulting instruction.
pub fn step(
    program: &Program,
    registers: &mut Registers,
    memory: &mut Memory,
    pc: u32,
) -> (ExitReason, u32) {
    let Some(instruction) = decode(program, pc) else {
        return (ExitReason::Panic, pc);
    };
    let mut context = InstructionContext {
        program,
        registers,
        memory,
        pc,
        next_pc: None,
    };
    let reason = execute(&mut context, &instruction);
    match reason {
        ExitReason::Continue | ExitReason::HostCall(_) => {
            let next = context
                .next_pc
                .unwrap_or_else(|| pc.wrapping_add(instruction.skip + 1));
            (reason, next)
        }
        _ => (reason, pc),
    }
}

/// Dispatch on opcode.
pub fn execute(context: &mut InstructionContext<'_>, instruction: &Instruction) -> ExitReason {
    use Opcode as O;

    let op = instruction.opcode;
    match (op, instruction.args) {
        (O::Trap, _) => control_flow::trap(),
        (O::Fallthrough, _) => ExitReason::Continue,
        (O::Ecalli, Args::Immediate { x }) => control_flow::ecalli(x),
        (O::Jump, Args::Offset { target }) => control_flow::jump(context, target),
        (O::JumpInd, Args::RegisterImmediate { a, x }) => control_flow::jump_ind(context, a, x),
        (O::LoadImmJump, Args::RegisterImmediateOffset { a, x, target }) => {
            control_flow::load_imm_jump(context, a, x, target)
        }
        (O::LoadImmJumpInd, Args::TwoRegistersTwoImmediates { a, b, x, y }) => {
            control_flow::load_imm_jump_ind(context, a, b, x, y)
        }

        (O::LoadImm64, Args::RegisterExtendedImmediate { a, x }) => {
            context.registers[a] = x;
            ExitReason::Continue
        }
        (O::LoadImm, Args::RegisterImmediate { a, x }) => {
            context.registers[a] = x;
            ExitReason::Continue
        }
        (
            O::StoreImmU8 | O::StoreImmU16 | O::StoreImmU32 | O::StoreImmU64,
            Args::TwoImmediates { x, y },
        ) => memory::store_imm(context, op, x, y),
        (
            O::LoadU8 | O::LoadI8 | O::LoadU16 | O::LoadI16 | O::LoadU32 | O::LoadI32 | O::LoadU64,
            Args::RegisterImmediate { a, x },
        ) => memory::load(context, op, a, x),
        (
            O::StoreU8 | O::StoreU16 | O::StoreU32 | O::StoreU64,
            Args::RegisterImmediate { a, x },
        ) => {
            let value = context.registers[a];
            memory::store(context, op, x, value)
        }
        (
            O::StoreImmIndU8 | O::StoreImmIndU16 | O::StoreImmIndU32 | O::StoreImmIndU64,
            Args::RegisterTwoImmediates { a, x, y },
        ) => {
            let address = context.registers[a].wrapping_add(x);
            memory::store(context, op, address, y)
        }
        (
            O::StoreIndU8 | O::StoreIndU16 | O::StoreIndU32 | O::StoreIndU64,
            Args::TwoRegistersImmediate { a, b, x },
        ) => {
            let address = context.registers[b].wrapping_add(x);
            let value = context.registers[a];
            memory::store(context, op, address, value)
        }
        (
            O::LoadIndU8
            | O::LoadIndI8
            | O::LoadIndU16
            | O::LoadIndI16
            | O::LoadIndU32
            | O::LoadIndI32
            | O::LoadIndU64,
            Args::TwoRegistersImmediate { a, b, x },
        ) => {
            let address = context.registers[b].wrapping_add(x);
            memory::load(context, op, a, address)
        }

        (_, Args::RegisterImmediateOffset { a, x, target }) => {
            let taken = branching::immediate_condition(op, context.registers[a], x);
            control_flow::branch(context, target, taken)
        }
        (_, Args::TwoRegistersOffset { a, b, target }) => {
            let taken = branching::register_condition(op, context.registers[a], context.registers[b]);
            control_flow::branch(context, target, taken)
        }

        (O::Sbrk, Args::TwoRegisters { d, a }) => {
            context.registers[d] = context.memory.sbrk(context.registers[a]);
            ExitReason::Continue
        }
        (_, Args::TwoRegisters { d, a }) => {
            context.registers[d] = bitwise::unary(op, context.registers[a]);
            ExitReason::Continue
        }
        (_, Args::TwoRegistersImmediate { a, b, x }) => {
            let value = register_immediate_op(op, context.registers[b], x, context.registers[a]);
            context.registers[a] = value;
            ExitReason::Continue
        }
        (_, Args::ThreeRegisters { a, b, d }) => {
            let value =
                three_register_op(op, context.registers[a], context.registers[b], context.registers[d]);
            context.registers[d] = value;
            ExitReason::Continue
        }
        (op, args) => {
            // Operands are decoded from the opcode's own shape.
            if cfg!(debug_assertions) {
                unreachable!("{} decoded with mismatched operands {args:?}", op.name());
            }
            ExitReason::Panic
        }
    }
}

/// ω'_A for the two-register-plus-immediate ALU group: `b` is ω_B, `x` the immediate,
/// `current` the old ω_A (for conditional moves).
fn register_immediate_op(op: Opcode, b: u64, x: u64, current: u64) -> u64 {
    use Opcode as O;
    match op {
        O::AddImm32 => arithmetic::add_32(b, x),
        O::AddImm64 => b.wrapping_add(x),
        O::MulImm32 => arithmetic::mul_32(b, x),
        O::MulImm64 => b.wrapping_mul(x),
        O::NegAddImm32 => arithmetic::sub_32(x, b),
        O::NegAddImm64 => x.wrapping_sub(b),
        O::AndImm => b & x,
        O::XorImm => b ^ x,
        O::OrImm => b | x,
        O::SetLtUImm => comparison::set_lt_u(b, x),
        O::SetLtSImm => comparison::set_lt_s(b, x),
        O::SetGtUImm => comparison::set_lt_u(x, b),
        O::SetGtSImm => comparison::set_lt_s(x, b),
        O::ShloLImm32 => shifts::shlo_l_32(b, x),
        O::ShloRImm32 => shifts::shlo_r_32(b, x),
        O::SharRImm32 => shifts::shar_r_32(b, x),
        O::ShloLImmAlt32 => shifts::shlo_l_32(x, b),
        O::ShloRImmAlt32 => shifts::shlo_r_32(x, b),
        O::SharRImmAlt32 => shifts::shar_r_32(x, b),
        O::ShloLImm64 => shifts::shlo_l_64(b, x),
        O::ShloRImm64 => shifts::shlo_r_64(b, x),
        O::SharRImm64 => shifts::shar_r_64(b, x),
        O::ShloLImmAlt64 => shifts::shlo_l_64(x, b),
        O::ShloRImmAlt64 => shifts::shlo_r_64(x, b),
        O::SharRImmAlt64 => shifts::shar_r_64(x, b),
        O::RotR64Imm => shifts::rot_r_64(b, x),
        O::RotR64ImmAlt => shifts::rot_r_64(x, b),
        O::RotR32Imm => shifts::rot_r_32(b, x),
        O::RotR32ImmAlt => shifts::rot_r_32(x, b),
        O::CmovIzImm => bitwise::cmov(b == 0, x, current),
        O::CmovNzImm => bitwise::cmov(b != 0, x, current),
        _ => current,
    }
}

/// ω'_D for the three-register group; `current` is the old ω_D.
fn three_register_op(op: Opcode, a: u64, b: u64, current: u64) -> u64 {
    use Opcode as O;
    match op {
        O::Add32 => arithmetic::add_32(a, b),
        O::Sub32 => arithmetic::sub_32(a, b),
        O::Mul32 => arithmetic::mul_32(a, b),
        O::DivU32 => arithmetic::div_u_32(a, b),
        O::DivS32 => arithmetic::div_s_32(a, b),
        O::RemU32 => arithmetic::rem_u_32(a, b),
        O::RemS32 => arithmetic::rem_s_32(a, b),
        O::Add64 => a.wrapping_add(b),
        O::Sub64 => a.wrapping_sub(b),
        O::Mul64 => a.wrapping_mul(b),
        O::DivU64 => arithmetic::div_u_64(a, b),
        O::DivS64 => arithmetic::div_s_64(a, b),
        O::RemU64 => arithmetic::rem_u_64(a, b),
        O::RemS64 => arithmetic::rem_s_64(a, b),
        O::ShloL32 => shifts::shlo_l_32(a, b),
        O::ShloR32 => shifts::shlo_r_32(a, b),
        O::SharR32 => shifts::shar_r_32(a, b),
        O::ShloL64 => shifts::shlo_l_64(a, b),
        O::ShloR64 => shifts::shlo_r_64(a, b),
        O::SharR64 => shifts::shar_r_64(a, b),
        O::RotL64 => shifts::rot_l_64(a, b),
        O::RotL32 => shifts::rot_l_32(a, b),
        O::RotR64 => shifts::rot_r_64(a, b),
        O::RotR32 => shifts::rot_r_32(a, b),
        O::And => a & b,
        O::Xor => a ^ b,
        O::Or => a | b,
        O::AndInv => a & !b,
        O::OrInv => a | !b,
        O::Xnor => !(a ^ b),
        O::MulUpperSS => multiplication_upper::mul_upper_s_s(a, b),
        O::MulUpperUU => multiplication_upper::mul_upper_u_u(a, b),
        O::MulUpperSU => multiplication_upper::mul_upper_s_u(a, b),
        O::SetLtU => comparison::set_lt_u(a, b),
        O::SetLtS => comparison::set_lt_s(a, b),
        O::Max => comparison::max(a, b),
        O::MaxU => a.max(b),
        O::Min => comparison::min(a, b),
        O::MinU => a.min(b),
        O::CmovIz => bitwise::cmov(b == 0, a, current),
        O::CmovNz => bitwise::cmov(b != 0, a, current),
        _ => current,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{assemble, run, scratch_memory};
    use super::*;

    #[test]
    fn opcode_round_trip() {
        for byte in 0..=u8::MAX {
            if let Ok(opcode) = Opcode::try_from(byte) {
                assert_eq!(opcode as u8, byte, "{}", opcode.name());
            }
        }
        assert_eq!(Opcode::try_from(2), Err(2));
        assert_eq!(Opcode::try_from(231), Err(231));
    }

    #[test]
    fn every_opcode_executes_with_its_decoded_operands() {
        for byte in 0..=u8::MAX {
            let Ok(opcode) = Opcode::try_from(byte) else {
                continue;
            };
            let program = assemble(&[&[byte, 0x10, 0x01, 0x00], &[0]], &[]);
            let instruction = decode(&program, 0).expect("known opcode decodes");
            assert_eq!(instruction.opcode, opcode);
            let mut registers = [0; 13];
            let mut memory = scratch_memory();
            let mut context = InstructionContext {
                program: &program,
                registers: &mut registers,
                memory: &mut memory,
                pc: 0,
                next_pc: None,
            };
            // Reaching the mismatch arm panics in debug builds.
            execute(&mut context, &instruction);
        }
    }

    #[test]
    fn terminators() {
        assert!(is_terminator(0));
        assert!(is_terminator(40));
        assert!(is_terminator(180));
        assert!(!is_terminator(51));
        assert!(!is_terminator(2));
    }

    #[test]
    fn invalid_opcode_traps() {
        let program = assemble(&[&[2]], &[]);
        let mut registers = [0; 13];
        let mut memory = Memory::new();
        assert_eq!(step(&program, &mut registers, &mut memory, 0), (ExitReason::Panic, 0));
    }

    #[test]
    fn pc_outside_code_traps() {
        let program = assemble(&[&[1]], &[]);
        let mut registers = [0; 13];
        let mut memory = Memory::new();
        assert_eq!(step(&program, &mut registers, &mut memory, 7), (ExitReason::Panic, 7));
    }

    #[test]
    fn ecalli_advances_pc() {
        let program = assemble(&[&[10, 3], &[0]], &[]);
        let mut registers = [0; 13];
        let mut memory = Memory::new();
        assert_eq!(
            step(&program, &mut registers, &mut memory, 0),
            (ExitReason::HostCall(3), 2)
        );
    }

    #[test]
    fn arithmetic_program() {
        // r0 = 7; r1 = 5; r2 = r0 * r1; r3 = r2 - r1 (64-bit); trap
        let program = assemble(
            &[
                &[51, 0x00, 7],
                &[51, 0x01, 5],
                &[202, 0x10, 2],
                &[201, 0x12, 3],
                &[0],
            ],
            &[],
        );
        let mut registers = [0; 13];
        let mut memory = scratch_memory();
        let (reason, pc) = run(&program, &mut registers, &mut memory);
        assert_eq!(reason, ExitReason::Panic);
        assert_eq!(pc, 12);
        assert_eq!(registers[2], 35);
        assert_eq!(registers[3], 30);
    }

    #[test]
    fn two_register_immediate_writes_a() {
        // r1 = 10; add_imm_64 r2 = r1 + (-3)
        let program = assemble(&[&[51, 0x01, 10], &[149, 0x12, 0xfd], &[0]], &[]);
        let mut registers = [0; 13];
        let mut memory = Memory::new();
        run(&program, &mut registers, &mut memory);
        assert_eq!(registers[2], 7);
    }

    #[test]
    fn cmov_keeps_destination_when_false() {
        let program = assemble(&[&[218, 0x10, 2], &[0]], &[]);
        let mut registers = [0; 13];
        registers[0] = 9;
        registers[1] = 1;
        registers[2] = 4;
        let mut memory = Memory::new();
        run(&program, &mut registers, &mut memory);
        assert_eq!(registers[2], 4);
    }
}
