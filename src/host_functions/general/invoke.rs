//! INVOKE host function (Ω_K). Gray Paper: function ID 12.
//! r7=machine, r8=offset of the 112-byte block E8(gas) ‖ E8(r0..r12).
//! Runs the machine until its first exit, writes gas and registers back into the block,
//! r7 = inner status and r8 = host id or fault address where one applies.

use crate::codec::decode_fixed_length;
use crate::config::{FUNC_INVOKE, REGISTER_COUNT, REG_WHAT, REG_WHO};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::types::Registers;

const BLOCK_SIZE: u64 = 8 + 8 * REGISTER_COUNT as u64;

/// INVOKE (12): run a nested machine.
pub struct InvokeHostFunction;

impl HostFunction for InvokeHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_INVOKE
    }
    fn name(&self) -> &'static str {
        "invoke"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let handle = context.registers[7];
        let offset = context.registers[8];

        if !context.memory.is_writeable(offset, BLOCK_SIZE) {
            crate::host_log_error!("[hostfn] invoke PANIC: block unwritable at {}", offset);
            return context.oob_panic();
        }
        let Ok(block) = context.memory.read(offset, BLOCK_SIZE) else {
            return context.oob_panic();
        };
        let word = |index: usize| decode_fixed_length(&block[index * 8..], 8).map_or(0, |r| r.value);
        let gas = word(0);
        let mut registers: Registers = [0; REGISTER_COUNT];
        for (i, register) in registers.iter_mut().enumerate() {
            *register = word(i + 1);
        }

        let config = context.config;
        let Some(refine) = context.args.refine_mut() else {
            return context.reply(REG_WHAT);
        };
        let Some(machine) = refine.machines.get_mut(&handle) else {
            return context.reply(REG_WHO);
        };
        let outcome = machine.invoke(config, gas, registers);
        crate::host_log!("[hostfn] invoke {} -> {:?}", handle, outcome.exit);

        let mut out = Vec::with_capacity(BLOCK_SIZE as usize);
        out.extend_from_slice(&outcome.gas.to_le_bytes());
        for register in outcome.registers {
            out.extend_from_slice(&register.to_le_bytes());
        }
        context.memory.write(offset, &out);

        let (status, extra) = outcome.exit.status_code();
        if let Some(extra) = extra {
            context.registers[8] = extra;
        }
        context.reply(status)
    }
}
