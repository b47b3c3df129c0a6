//! Logical/arithmetic shifts and rotations. Shift amounts are taken modulo the word width.

use crate::instructions::base::sext32;

#[must_use]
pub const fn shlo_l_32(value: u64, amount: u64) -> u64 {
    sext32(((value as u32) << (amount % 32)) as u64)
}

#[must_use]
pub const fn shlo_r_32(value: u64, amount: u64) -> u64 {
    sext32(((value as u32) >> (amount % 32)) as u64)
}

#[must_use]
pub const fn shar_r_32(value: u64, amount: u64) -> u64 {
    ((value as u32 as i32) >> (amount % 32)) as i64 as u64
}

#[must_use]
pub const fn shlo_l_64(value: u64, amount: u64) -> u64 {
    value << (amount % 64)
}

#[must_use]
pub const fn shlo_r_64(value: u64, amount: u64) -> u64 {
    value >> (amount % 64)
}

#[must_use]
pub const fn shar_r_64(value: u64, amount: u64) -> u64 {
    ((value as i64) >> (amount % 64)) as u64
}

#[must_use]
pub const fn rot_l_64(value: u64, amount: u64) -> u64 {
    value.rotate_left((amount % 64) as u32)
}

#[must_use]
pub const fn rot_r_64(value: u64, amount: u64) -> u64 {
    value.rotate_right((amount % 64) as u32)
}

/// Rotates the low word; the result is sign-extended.
#[must_use]
pub const fn rot_l_32(value: u64, amount: u64) -> u64 {
    sext32((value as u32).rotate_left((amount % 32) as u32) as u64)
}

#[must_use]
pub const fn rot_r_32(value: u64, amount: u64) -> u64 {
    sext32((value as u32).rotate_right((amount % 32) as u32) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_wrap() {
        assert_eq!(shlo_l_32(1, 33), 2);
        assert_eq!(shlo_l_64(1, 65), 2);
        assert_eq!(shlo_r_64(4, 64), 4);
    }

    #[test]
    fn thirty_two_bit_shifts_sign_extend() {
        assert_eq!(shlo_l_32(1, 31), 0xffff_ffff_8000_0000);
        assert_eq!(shlo_r_32(0xffff_ffff_8000_0000, 31), 1);
        assert_eq!(shar_r_32(0x8000_0000, 4), 0xffff_ffff_f800_0000);
        assert_eq!(shar_r_64(u64::MAX, 63), u64::MAX);
    }

    #[test]
    fn rotations() {
        assert_eq!(rot_l_64(0x8000_0000_0000_0001, 1), 3);
        assert_eq!(rot_r_64(1, 1), 0x8000_0000_0000_0000);
        assert_eq!(rot_r_32(1, 1), 0xffff_ffff_8000_0000);
        assert_eq!(rot_l_32(0x1_4000_0000, 1), 0xffff_ffff_8000_0000);
    }
}
