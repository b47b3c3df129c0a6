//! SET_LT_*, SET_GT_* and signed MIN/MAX.

#[must_use]
pub const fn set_lt_u(a: u64, b: u64) -> u64 {
    (a < b) as u64
}

#[must_use]
pub const fn set_lt_s(a: u64, b: u64) -> u64 {
    ((a as i64) < (b as i64)) as u64
}

/// Signed maximum.
#[must_use]
pub fn max(a: u64, b: u64) -> u64 {
    (a as i64).max(b as i64) as u64
}

/// Signed minimum.
#[must_use]
pub fn min(a: u64, b: u64) -> u64 {
    (a as i64).min(b as i64) as u64
}
