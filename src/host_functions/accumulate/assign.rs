//! ASSIGN host function (Ω_A). Gray Paper: function ID 15.
//! r7=core, r8=queue offset (80 hashes), r9=new assigner for the core.

use crate::config::{C_AUTH_QUEUE_SIZE, FUNC_ASSIGN, REG_CORE, REG_HUH, REG_OK, REG_WHAT, REG_WHO};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::types::{Hash, ServiceId};

/// ASSIGN (15): replace a core's authorizer queue. Only that core's assigner may call it.
pub struct AssignHostFunction;

impl HostFunction for AssignHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_ASSIGN
    }
    fn name(&self) -> &'static str {
        "assign"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let core = context.registers[7];
        let queue_offset = context.registers[8];
        let assigner = context.registers[9];

        let Some(queue) = context.read_memory(queue_offset, 32 * u64::from(C_AUTH_QUEUE_SIZE)) else {
            return context.oob_panic();
        };
        let cores = u64::from(context.config.params.num_cores);
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        if core >= cores {
            return context.reply(REG_CORE);
        }
        let core = core as usize;
        let state = &mut accumulate.x.state;
        if state.assigners.get(core) != Some(&accumulate.x.service_id) {
            crate::host_log_error!("[hostfn] assign HUH: caller is not the assigner of core {}", core);
            return context.reply(REG_HUH);
        }
        let Ok(assigner) = ServiceId::try_from(assigner) else {
            return context.reply(REG_WHO);
        };

        let hashes: Vec<Hash> = queue
            .chunks_exact(32)
            .map(|chunk| {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(chunk);
                hash
            })
            .collect();
        if state.auth_queue.len() <= core {
            state.auth_queue.resize(core + 1, Vec::new());
        }
        state.auth_queue[core] = hashes;
        state.assigners[core] = assigner;
        context.reply(REG_OK)
    }
}
