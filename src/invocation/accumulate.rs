//! Ψ_A: accumulate one service's operands against the partial state.

use crate::codec::encode_natural;
use crate::config::{PvmConfig, MAX_SERVICE_CODE_SIZE};
use crate::host_functions::args::{AccumulateArgs, HostCallArgs};
use crate::invocation::{argument_invocation, service_code};
use crate::state::{DeferredTransfer, PartialState, ResultContext};
use crate::types::{Gas, Hash, InvocationResult, ServiceId, TimeSlot};
use crate::work::Operand;

/// Entry pc of the accumulate code.
const ACCUMULATE_PC: u32 = 5;

/// Inputs for one accumulation of `service_id`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccumulateInput {
    pub service_id: ServiceId,
    pub timeslot: TimeSlot,
    pub gas: Gas,
    pub entropy: Hash,
    pub operands: Vec<Operand>,
    /// Transfers addressed to the service; their amounts are credited before execution.
    pub transfers: Vec<DeferredTransfer>,
}

/// Committed context (X or Y) and the gas consumed. The output hash is `context.yield_hash`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccumulateOutcome {
    pub context: ResultContext,
    pub gas_used: Gas,
    pub result: InvocationResult,
}

/// Ψ_A(e, t, s, g, o). Panic and out-of-gas commit the checkpoint Y; otherwise X is
/// committed, with a 32-byte output taken as the yield hash.
pub fn accumulate(config: &PvmConfig, mut state: PartialState, input: AccumulateInput) -> AccumulateOutcome {
    let credit = input
        .transfers
        .iter()
        .filter(|transfer| transfer.destination == input.service_id)
        .fold(0u64, |sum, transfer| sum.saturating_add(transfer.amount));
    if let Some(account) = state.accounts.get_mut(&input.service_id) {
        account.balance = account.balance.saturating_add(credit);
    }

    let context = ResultContext::new(input.service_id, state, input.timeslot, &input.entropy);
    let code = context
        .self_account()
        .and_then(|account| account.code_preimage())
        .and_then(service_code)
        .filter(|code| !code.is_empty() && code.len() <= MAX_SERVICE_CODE_SIZE as usize)
        .map(<[u8]>::to_vec);
    let Some(code) = code else {
        tracing::debug!(target: "jam_pvm::invocation", service = input.service_id, "accumulate skipped: no code");
        return AccumulateOutcome {
            context,
            gas_used: 0,
            result: InvocationResult::Ok(Vec::new()),
        };
    };

    let mut argument = encode_natural(u64::from(input.timeslot));
    argument.extend_from_slice(&encode_natural(u64::from(input.service_id)));
    argument.extend_from_slice(&encode_natural(input.operands.len() as u64));

    let mut args = HostCallArgs::Accumulate(AccumulateArgs {
        y: context.clone(),
        x: context,
        timeslot: input.timeslot,
        entropy: input.entropy,
        operands: input.operands,
    });
    let outcome = argument_invocation(config, &code, ACCUMULATE_PC, input.gas, &argument, &mut args);
    let AccumulateArgs { mut x, y, .. } = args.accumulate_mut().map(std::mem::take).unwrap_or_default();
    let context = match &outcome.result {
        InvocationResult::Panic | InvocationResult::OutOfGas => y,
        InvocationResult::Ok(output) => {
            if let Ok(hash) = Hash::try_from(output.as_slice()) {
                x.yield_hash = Some(hash);
            }
            x
        }
    };
    tracing::debug!(
        target: "jam_pvm::invocation",
        service = input.service_id,
        gas_used = outcome.gas_used,
        result = ?outcome.result,
        "accumulate"
    );
    AccumulateOutcome {
        context,
        gas_used: outcome.gas_used,
        result: outcome.result,
    }
}
