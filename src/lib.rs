//! JAM service VM: PVM interpreter, gas metering, host calls and the four invocation entry
//! points (is-authorized, refine, accumulate, on-transfer).
//!
//! Layout: `parser`/`program` build a [`parser::Program`] and its memory, `instructions` and
//! `pvm` execute it, `gas` prices it, `host_functions` services ECALLI and `invocation` ties
//! them to service state.

/// Compile-time removable logging for host calls other than LOG(100). No-op unless built with `--features host_calls_logging`.
#[macro_export]
macro_rules! host_log {
    ($($t:tt)*) => {
        #[cfg(feature = "host_calls_logging")]
        ::tracing::debug!(target: "jam_pvm::host", $($t)*);
    };
}

/// Log only on error paths (PANIC, HUH, FULL). Emits when `host_calls_errors_only` or `host_calls_logging` is enabled.
#[macro_export]
macro_rules! host_log_error {
    ($($t:tt)*) => {
        #[cfg(any(feature = "host_calls_logging", feature = "host_calls_errors_only"))]
        ::tracing::warn!(target: "jam_pvm::host", $($t)*);
    };
}

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gas;
pub mod host_functions;
pub mod instructions;
pub mod invocation;
pub mod parser;
pub mod program;
pub mod pvm;
pub mod ram;
pub mod state;
pub mod types;
pub mod work;

#[cfg(feature = "napi")]
mod bindings;

pub use config::PvmConfig;
pub use error::ProgramError;
pub use invocation::{
    accumulate, argument_invocation, is_authorized, on_transfer, refine, AccumulateInput,
    AccumulateOutcome, ArgumentOutcome, IsAuthorizedOutcome, IsAuthorizedResult, OnTransferOutcome,
    RefineOutcome,
};
pub use pvm::Pvm;
pub use types::{ExitReason, InvocationResult, WorkExecResult};
