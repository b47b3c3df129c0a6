//! POKE host function (Ω_O). Gray Paper: function ID 10.
//! r7=machine, r8=outer source, r9=inner destination, r10=length.

use crate::config::{FUNC_POKE, REG_OK, REG_OOB, REG_WHAT, REG_WHO};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};

/// POKE (10): copy from our memory into a nested machine's.
pub struct PokeHostFunction;

impl HostFunction for PokeHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_POKE
    }
    fn name(&self) -> &'static str {
        "poke"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let handle = context.registers[7];
        let source = context.registers[8];
        let destination = context.registers[9];
        let length = context.registers[10];

        let Some(data) = context.read_memory(source, length) else {
            return context.oob_panic();
        };
        let Some(refine) = context.args.refine_mut() else {
            return context.reply(REG_WHAT);
        };
        let Some(machine) = refine.machines.get_mut(&handle) else {
            return context.reply(REG_WHO);
        };
        if !machine.memory.is_writeable(destination, length) {
            return context.reply(REG_OOB);
        }
        machine.memory.write(destination, &data);
        context.reply(REG_OK)
    }
}
