//! EXPUNGE host function (Ω_X). Gray Paper: function ID 13.
//! r7=machine. r7 = its pc, and the machine is removed.

use crate::config::{FUNC_EXPUNGE, REG_WHAT, REG_WHO};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};

/// EXPUNGE (13): destroy a nested machine.
pub struct ExpungeHostFunction;

impl HostFunction for ExpungeHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_EXPUNGE
    }
    fn name(&self) -> &'static str {
        "expunge"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let handle = context.registers[7];
        let Some(refine) = context.args.refine_mut() else {
            return context.reply(REG_WHAT);
        };
        match refine.machines.remove(&handle) {
            Some(machine) => context.reply(u64::from(machine.pc)),
            None => context.reply(REG_WHO),
        }
    }
}
