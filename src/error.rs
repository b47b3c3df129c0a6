//! Construction-time errors. Surfaced as PANIC at the invocation boundary.

use thiserror::Error;

/// Malformed program blob or standard program image.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    #[error("program blob truncated while reading {0}")]
    Truncated(&'static str),
    #[error("jump table of {entries} entries x {width} bytes exceeds the address space")]
    JumpTableTooLarge { entries: u64, width: u8 },
    #[error("bitmask has {actual} bytes, expected {expected}")]
    BitmaskLength { expected: usize, actual: usize },
    #[error("program image has {0} trailing bytes")]
    TrailingBytes(usize),
    #[error("standard layout exceeds the 32-bit address space")]
    AddressSpaceExceeded,
    #[error("argument of {0} bytes exceeds the input zone")]
    ArgumentTooLarge(usize),
    #[error("service code preimage has a malformed metadata prefix")]
    BadMetadata,
}
