//! HISTORICAL_LOOKUP host function (Ω_H). Gray Paper: function ID 6.
//! r7=service (NONE=self), r8=hash offset, r9=output offset, r10=from, r11=length.
//! Availability is judged at the lookup-anchor slot of the refine context.

use crate::config::{FUNC_HISTORICAL_LOOKUP, REG_NONE};
use crate::host_functions::base::{
    resolve_account, HostFunction, HostFunctionContext, HostFunctionResult,
};
use crate::types::Hash;

/// HISTORICAL_LOOKUP (6): Λ(a, t, h) written like FETCH.
pub struct HistoricalLookupHostFunction;

impl HostFunction for HistoricalLookupHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_HISTORICAL_LOOKUP
    }
    fn name(&self) -> &'static str {
        "historical_lookup"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let selector = context.registers[7];
        let hash_offset = context.registers[8];
        let output_offset = context.registers[9];
        let from_offset = context.registers[10];
        let length = context.registers[11];

        let Some(hash) = context
            .read_memory(hash_offset, 32)
            .and_then(|bytes| Hash::try_from(bytes.as_slice()).ok())
        else {
            crate::host_log_error!("[hostfn] historical_lookup PANIC: hash unreadable at {}", hash_offset);
            return context.oob_panic();
        };

        let Some(refine) = context.args.refine_mut() else {
            return context.reply(REG_NONE);
        };
        let Some(account) = resolve_account(&refine.accounts, selector, refine.service_id) else {
            return context.reply(REG_NONE);
        };
        match account.historical_lookup(refine.lookup_timeslot, &hash) {
            Some(preimage) => {
                let preimage = preimage.to_vec();
                context.write_slice(&preimage, output_offset, from_offset, length)
            }
            None => context.reply(REG_NONE),
        }
    }
}
