//! DESIGNATE host function (Ω_D). Gray Paper: function ID 16.
//! r7=offset of V validator keys (336 bytes each).

use crate::config::{FUNC_DESIGNATE, REG_HUH, REG_OK, REG_WHAT, VALIDATOR_KEY_SIZE};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::state::ValidatorKey;

/// DESIGNATE (16): set the staging validator set. Only the delegator may call it.
pub struct DesignateHostFunction;

impl HostFunction for DesignateHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_DESIGNATE
    }
    fn name(&self) -> &'static str {
        "designate"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let offset = context.registers[7];
        let validators = u64::from(context.config.params.num_validators);

        let Some(keys) = context.read_memory(offset, VALIDATOR_KEY_SIZE as u64 * validators) else {
            return context.oob_panic();
        };
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        if accumulate.x.service_id != accumulate.x.state.delegator {
            crate::host_log_error!("[hostfn] designate HUH: caller {} is not the delegator", accumulate.x.service_id);
            return context.reply(REG_HUH);
        }
        accumulate.x.state.staging_set = keys
            .chunks_exact(VALIDATOR_KEY_SIZE)
            .map(|chunk| {
                let mut key: ValidatorKey = [0; VALIDATOR_KEY_SIZE];
                key.copy_from_slice(chunk);
                key
            })
            .collect();
        context.reply(REG_OK)
    }
}
