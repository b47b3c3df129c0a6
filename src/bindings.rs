//! Node bindings (napi). Built only with `--features napi`.

use napi::bindgen_prelude::{BigInt, Buffer};
use napi_derive::napi;

use crate::config::{PvmConfig, RESULT_CODE_HALT, RESULT_CODE_OOG, RESULT_CODE_PANIC};
use crate::host_functions::args::IsAuthorizedArgs;
use crate::host_functions::HostCallArgs;
use crate::invocation::argument_invocation;
use crate::types::InvocationResult;

/// Result of `runProgram` (status, gasUsed, output).
#[napi(object)]
pub struct RunProgramOutput {
    /// HALT 0, PANIC 1, OOG 4.
    pub status: u8,
    pub gas_used: BigInt,
    pub output: Buffer,
}

/// Gas budget from a JS BigInt. Negative values and values past u64 are rejected.
fn gas_budget(gas: &BigInt) -> napi::Result<u64> {
    let (signed, value, lossless) = gas.get_u64();
    if signed || !lossless {
        return Err(napi::Error::from_reason("gas must be a non-negative 64-bit integer"));
    }
    Ok(value)
}

/// Run a standard program image from pc 0. Only GAS, FETCH and LOG are serviced.
/// Gas is a BigInt so JS keeps full u64 precision.
#[napi]
pub fn run_program(
    code: Buffer,
    argument: Buffer,
    gas: BigInt,
    block_based: bool,
) -> napi::Result<RunProgramOutput> {
    let gas = gas_budget(&gas)?;
    let config = if block_based {
        PvmConfig::block_based()
    } else {
        PvmConfig::default()
    };
    let mut args = HostCallArgs::IsAuthorized(IsAuthorizedArgs::default());
    let outcome = argument_invocation(&config, code.as_ref(), 0, gas, argument.as_ref(), &mut args);
    let (status, output) = match outcome.result {
        InvocationResult::Ok(output) => (RESULT_CODE_HALT, output),
        InvocationResult::Panic => (RESULT_CODE_PANIC, Vec::new()),
        InvocationResult::OutOfGas => (RESULT_CODE_OOG, Vec::new()),
    };
    Ok(RunProgramOutput {
        status: status as u8,
        gas_used: BigInt::from(outcome.gas_used),
        output: output.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_budget_accepts_u64() {
        assert_eq!(gas_budget(&BigInt::from(u64::MAX)).ok(), Some(u64::MAX));
        assert_eq!(gas_budget(&BigInt::from(0u64)).ok(), Some(0));
    }

    #[test]
    fn gas_budget_rejects_negative_and_oversized() {
        let negative = BigInt {
            sign_bit: true,
            words: vec![5],
        };
        assert!(gas_budget(&negative).is_err());
        let oversized = BigInt {
            sign_bit: false,
            words: vec![0, 1],
        };
        assert!(gas_budget(&oversized).is_err());
    }
}
