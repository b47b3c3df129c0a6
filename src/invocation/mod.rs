//! Invocation entry points: Ψ_M plus the four protocol invocations built on it.
//!
//! Each entry point owns its [`HostCallArgs`] variant for the duration of the run and hands
//! the mutated payload back to the caller.

mod accumulate;
mod is_authorized;
mod on_transfer;
mod refine;

pub use accumulate::{accumulate, AccumulateInput, AccumulateOutcome};
pub use is_authorized::{is_authorized, IsAuthorizedOutcome, IsAuthorizedResult};
pub use on_transfer::{on_transfer, OnTransferOutcome};
pub use refine::{refine, RefineOutcome};

use crate::codec::decode_service_code_from_preimage;
use crate::config::PvmConfig;
use crate::host_functions::{host_call_loop, HostCallArgs};
use crate::program::standard_initialize;
use crate::pvm::Pvm;
use crate::types::{ExitReason, Gas, InvocationResult};

/// Result of Ψ_M: outcome and gas consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgumentOutcome {
    pub result: InvocationResult,
    pub gas_used: Gas,
}

/// Ψ_M: lay out `image` with `argument` and run it from `pc` with `gas`.
///
/// A malformed image panics without consuming gas. On halt the output is [r7, r7+r8) when
/// readable and empty otherwise. Host calls mutate `args` in place.
pub fn argument_invocation(
    config: &PvmConfig,
    image: &[u8],
    pc: u32,
    gas: Gas,
    argument: &[u8],
    args: &mut HostCallArgs,
) -> ArgumentOutcome {
    let standard = match standard_initialize(image, argument) {
        Ok(standard) => standard,
        Err(err) => {
            tracing::debug!(target: "jam_pvm::invocation", %err, "program image rejected");
            return ArgumentOutcome {
                result: InvocationResult::Panic,
                gas_used: 0,
            };
        }
    };
    let mut pvm = Pvm::new(standard.program, standard.registers, standard.memory, pc, gas);
    let exit = host_call_loop(&mut pvm, config, args);
    let result = match exit {
        ExitReason::Halt => InvocationResult::Ok(
            pvm.memory
                .read(pvm.registers[7], pvm.registers[8])
                .unwrap_or_default(),
        ),
        ExitReason::OutOfGas => InvocationResult::OutOfGas,
        _ => InvocationResult::Panic,
    };
    let gas_used = gas - pvm.gas;
    tracing::debug!(target: "jam_pvm::invocation", ?exit, gas_used, pc = pvm.pc, "argument invocation finished");
    ArgumentOutcome { result, gas_used }
}

/// Code blob of a service code preimage with its metadata prefix removed.
fn service_code(preimage: &[u8]) -> Option<&[u8]> {
    decode_service_code_from_preimage(preimage).map(|code| code.code)
}
