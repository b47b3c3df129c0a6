//! 32- and 64-bit arithmetic (ADD/SUB/MUL/DIV/REM and their immediate forms).
//! 32-bit results are sign-extended from the low word; division by zero never traps.

use crate::instructions::base::sext32;

/// sext4((a + b) mod 2^32)
#[must_use]
pub const fn add_32(a: u64, b: u64) -> u64 {
    sext32((a as u32).wrapping_add(b as u32) as u64)
}

/// sext4((a + 2^32 - (b mod 2^32)) mod 2^32)
#[must_use]
pub const fn sub_32(a: u64, b: u64) -> u64 {
    sext32((a as u32).wrapping_sub(b as u32) as u64)
}

/// sext4((a · b) mod 2^32)
#[must_use]
pub const fn mul_32(a: u64, b: u64) -> u64 {
    sext32((a as u32).wrapping_mul(b as u32) as u64)
}

/// 2^64 - 1 when the divisor word is zero.
#[must_use]
pub const fn div_u_32(a: u64, b: u64) -> u64 {
    let (a, b) = (a as u32, b as u32);
    if b == 0 {
        u64::MAX
    } else {
        sext32((a / b) as u64)
    }
}

/// Signed, rounding toward zero. MIN / -1 yields MIN.
#[must_use]
pub const fn div_s_32(a: u64, b: u64) -> u64 {
    let (a, b) = (a as u32 as i32, b as u32 as i32);
    if b == 0 {
        u64::MAX
    } else {
        a.wrapping_div(b) as i64 as u64
    }
}

/// Divisor word zero yields the dividend word.
#[must_use]
pub const fn rem_u_32(a: u64, b: u64) -> u64 {
    let (a, b) = (a as u32, b as u32);
    if b == 0 {
        sext32(a as u64)
    } else {
        sext32((a % b) as u64)
    }
}

/// Sign follows the dividend. MIN rem -1 yields 0.
#[must_use]
pub const fn rem_s_32(a: u64, b: u64) -> u64 {
    let (a, b) = (a as u32 as i32, b as u32 as i32);
    if b == 0 {
        a as i64 as u64
    } else {
        a.wrapping_rem(b) as i64 as u64
    }
}

#[must_use]
pub const fn div_u_64(a: u64, b: u64) -> u64 {
    if b == 0 {
        u64::MAX
    } else {
        a / b
    }
}

#[must_use]
pub const fn div_s_64(a: u64, b: u64) -> u64 {
    if b == 0 {
        u64::MAX
    } else {
        (a as i64).wrapping_div(b as i64) as u64
    }
}

#[must_use]
pub const fn rem_u_64(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        a % b
    }
}

#[must_use]
pub const fn rem_s_64(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        (a as i64).wrapping_rem(b as i64) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUS_ONE: u64 = u64::MAX;

    #[test]
    fn thirty_two_bit_results_are_sign_extended() {
        assert_eq!(add_32(0x7fff_ffff, 1), 0xffff_ffff_8000_0000);
        assert_eq!(add_32(0x1_0000_0005, 3), 8);
        assert_eq!(sub_32(0, 1), MINUS_ONE);
        assert_eq!(mul_32(0x1_0000, 0x1_0000), 0);
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(div_u_32(7, 0x1_0000_0000), MINUS_ONE);
        assert_eq!(div_s_32(7, 0), MINUS_ONE);
        assert_eq!(rem_u_32(0x8000_0007, 0), 0xffff_ffff_8000_0007);
        assert_eq!(rem_s_32(u64::from(-7i32 as u32), 0), (-7i64) as u64);
        assert_eq!(div_u_64(7, 0), MINUS_ONE);
        assert_eq!(div_s_64(7, 0), MINUS_ONE);
        assert_eq!(rem_u_64(7, 0), 7);
        assert_eq!(rem_s_64(MINUS_ONE, 0), MINUS_ONE);
    }

    #[test]
    fn signed_overflow() {
        let min32 = u64::from(i32::MIN as u32);
        assert_eq!(div_s_32(min32, MINUS_ONE), i32::MIN as i64 as u64);
        assert_eq!(rem_s_32(min32, MINUS_ONE), 0);
        let min64 = i64::MIN as u64;
        assert_eq!(div_s_64(min64, MINUS_ONE), min64);
        assert_eq!(rem_s_64(min64, MINUS_ONE), 0);
    }

    #[test]
    fn signed_rounding_toward_zero() {
        assert_eq!(div_s_64((-7i64) as u64, 2), (-3i64) as u64);
        assert_eq!(rem_s_64((-7i64) as u64, 2), MINUS_ONE);
        assert_eq!(rem_s_32(7, (-2i64) as u64), 1);
    }
}
