//! Two-register bit manipulation (100–111) and conditional moves.

use crate::instructions::base::sign_extend;
use crate::instructions::Opcode;

/// ω'_D = f(ω_A) for the two-register group. SBRK is handled by the dispatcher.
#[must_use]
pub fn unary(op: Opcode, value: u64) -> u64 {
    let low = value as u32;
    match op {
        Opcode::MoveReg => value,
        Opcode::CountSetBits64 => u64::from(value.count_ones()),
        Opcode::CountSetBits32 => u64::from(low.count_ones()),
        Opcode::LeadingZeroBits64 => u64::from(value.leading_zeros()),
        Opcode::LeadingZeroBits32 => u64::from(low.leading_zeros()),
        Opcode::TrailingZeroBits64 => u64::from(value.trailing_zeros()),
        Opcode::TrailingZeroBits32 => u64::from(low.trailing_zeros()),
        Opcode::SignExtend8 => sign_extend(value & 0xff, 1),
        Opcode::SignExtend16 => sign_extend(value & 0xffff, 2),
        Opcode::ZeroExtend16 => value & 0xffff,
        Opcode::ReverseBytes => value.swap_bytes(),
        _ => value,
    }
}

/// `new` when `condition` holds, else the destination keeps `current`.
#[must_use]
pub const fn cmov(condition: bool, new: u64, current: u64) -> u64 {
    if condition {
        new
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_respect_width() {
        let value = 0xffff_0000_0000_0001;
        assert_eq!(unary(Opcode::CountSetBits64, value), 17);
        assert_eq!(unary(Opcode::CountSetBits32, value), 1);
        assert_eq!(unary(Opcode::LeadingZeroBits64, 1), 63);
        assert_eq!(unary(Opcode::LeadingZeroBits32, 0x1_0000_0000), 32);
        assert_eq!(unary(Opcode::TrailingZeroBits64, 0), 64);
        assert_eq!(unary(Opcode::TrailingZeroBits32, 0x1_0000_0000), 32);
    }

    #[test]
    fn extensions() {
        assert_eq!(unary(Opcode::SignExtend8, 0x1_80), 0xffff_ffff_ffff_ff80);
        assert_eq!(unary(Opcode::SignExtend16, 0x7fff), 0x7fff);
        assert_eq!(unary(Opcode::ZeroExtend16, u64::MAX), 0xffff);
        assert_eq!(unary(Opcode::ReverseBytes, 0x0102_0304_0506_0708), 0x0807_0605_0403_0201);
    }
}
