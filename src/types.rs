//! PVM type definitions shared by the engine, host calls and invocations.

use crate::config::{
    REGISTER_COUNT, RESULT_CODE_FAULT, RESULT_CODE_HALT, RESULT_CODE_HOST, RESULT_CODE_OOG,
    RESULT_CODE_PANIC,
};

/// Register state: 13 × 64-bit registers (r0–r12).
pub type Registers = [u64; REGISTER_COUNT];

/// Gas counter. Never negative: a charge that does not fit leaves it untouched.
pub type Gas = u64;

/// Service identifier (Gray Paper N_S).
pub type ServiceId = u32;

/// Timeslot (Gray Paper N_T).
pub type TimeSlot = u32;

/// 32-byte hash.
pub type Hash = [u8; 32];

// ============================================================================
// Exit reason
// ============================================================================

/// Why the engine (or a host function) stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExitReason {
    Continue,
    Halt,
    Panic,
    OutOfGas,
    /// Page-aligned address of the first inaccessible page touched.
    PageFault(u32),
    /// Host function identifier from ECALLI.
    HostCall(u32),
}

impl ExitReason {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Continue | Self::HostCall(_))
    }

    /// Inner status code written by INVOKE into r7, with the r8 companion value.
    #[must_use]
    pub const fn status_code(&self) -> (u64, Option<u64>) {
        match self {
            Self::Continue | Self::Halt => (RESULT_CODE_HALT, None),
            Self::Panic => (RESULT_CODE_PANIC, None),
            Self::OutOfGas => (RESULT_CODE_OOG, None),
            Self::PageFault(address) => (RESULT_CODE_FAULT, Some(*address as u64)),
            Self::HostCall(id) => (RESULT_CODE_HOST, Some(*id as u64)),
        }
    }
}

// ============================================================================
// Invocation results
// ============================================================================

/// Outcome of an argument invocation (Ψ_M).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationResult {
    /// Halted; payload is [r7, r7+r8) when readable, else empty.
    Ok(Vec<u8>),
    OutOfGas,
    Panic,
}

impl InvocationResult {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// Work execution result (Gray Paper E: work result).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkExecResult {
    Ok(Vec<u8>),
    OutOfGas,
    Panic,
    BadExports,
    Oversize,
    BadCode,
    CodeOversize,
}

impl From<InvocationResult> for WorkExecResult {
    fn from(result: InvocationResult) -> Self {
        match result {
            InvocationResult::Ok(data) => Self::Ok(data),
            InvocationResult::OutOfGas => Self::OutOfGas,
            InvocationResult::Panic => Self::Panic,
        }
    }
}
