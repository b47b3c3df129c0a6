//! BLESS host function (Ω_B). Gray Paper: function ID 14.
//! r7=manager, r8=assigners offset (4·C bytes), r9=delegator, r10=always-accumulate offset,
//! r11=always-accumulate count (12 bytes each: E4(service) ‖ E8(gas)).

use std::collections::BTreeMap;

use crate::config::{FUNC_BLESS, REG_HUH, REG_OK, REG_WHAT, REG_WHO};
use crate::host_functions::accumulate::decode_service_ids;
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::types::ServiceId;

/// BLESS (14): replace the privileged services. Only the current manager may call it.
pub struct BlessHostFunction;

impl HostFunction for BlessHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_BLESS
    }
    fn name(&self) -> &'static str {
        "bless"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let manager = context.registers[7];
        let assigners_offset = context.registers[8];
        let delegator = context.registers[9];
        let always_offset = context.registers[10];
        let always_count = context.registers[11];

        let cores = u64::from(context.config.params.num_cores);
        let Some(assigners) = context.read_memory(assigners_offset, 4 * cores) else {
            return context.oob_panic();
        };
        let Some(always) = always_count
            .checked_mul(12)
            .and_then(|length| context.read_memory(always_offset, length))
        else {
            return context.oob_panic();
        };

        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        let state = &mut accumulate.x.state;
        if accumulate.x.service_id != state.manager {
            crate::host_log_error!("[hostfn] bless HUH: caller {} is not the manager", accumulate.x.service_id);
            return context.reply(REG_HUH);
        }
        let (Ok(manager), Ok(delegator), true) = (
            ServiceId::try_from(manager),
            ServiceId::try_from(delegator),
            assigners_offset >> 32 == 0,
        ) else {
            return context.reply(REG_WHO);
        };

        let always_accumulate: BTreeMap<ServiceId, u64> = always
            .chunks_exact(12)
            .map(|entry| {
                let service = u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]);
                let mut gas = [0u8; 8];
                gas.copy_from_slice(&entry[4..12]);
                (service, u64::from_le_bytes(gas))
            })
            .collect();
        state.manager = manager;
        state.assigners = decode_service_ids(&assigners);
        state.delegator = delegator;
        state.always_accumulate = always_accumulate;
        context.reply(REG_OK)
    }
}
