//! PEEK host function (Ω_P). Gray Paper: function ID 9.
//! r7=machine, r8=outer destination, r9=inner source, r10=length.

use crate::config::{FUNC_PEEK, REG_OK, REG_OOB, REG_WHAT, REG_WHO};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};

/// PEEK (9): copy from a nested machine's memory into ours.
pub struct PeekHostFunction;

impl HostFunction for PeekHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_PEEK
    }
    fn name(&self) -> &'static str {
        "peek"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let handle = context.registers[7];
        let destination = context.registers[8];
        let source = context.registers[9];
        let length = context.registers[10];

        if !context.memory.is_writeable(destination, length) {
            return context.oob_panic();
        }
        let Some(refine) = context.args.refine_mut() else {
            return context.reply(REG_WHAT);
        };
        let Some(machine) = refine.machines.get(&handle) else {
            return context.reply(REG_WHO);
        };
        let data = if machine.memory.is_readable(source, length) {
            machine.memory.read(source, length).ok()
        } else {
            None
        };
        let Some(data) = data else {
            return context.reply(REG_OOB);
        };
        context.memory.write(destination, &data);
        context.reply(REG_OK)
    }
}
