//! MUL_UPPER_S_S, MUL_UPPER_U_U, MUL_UPPER_S_U: high 64 bits of the 128-bit product.

#[must_use]
pub const fn mul_upper_s_s(a: u64, b: u64) -> u64 {
    (((a as i64 as i128) * (b as i64 as i128)) >> 64) as u64
}

#[must_use]
pub const fn mul_upper_u_u(a: u64, b: u64) -> u64 {
    (((a as u128) * (b as u128)) >> 64) as u64
}

/// Signed `a` times unsigned `b`, floored.
#[must_use]
pub const fn mul_upper_s_u(a: u64, b: u64) -> u64 {
    (((a as i64 as i128) * (b as i128)) >> 64) as u64
}
