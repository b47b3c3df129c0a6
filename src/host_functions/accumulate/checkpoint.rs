//! CHECKPOINT host function (Ω_C). Gray Paper: function ID 17.
//! Y = X; r7 = remaining gas.

use crate::config::{FUNC_CHECKPOINT, REG_WHAT};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};

/// CHECKPOINT (17): snapshot the working context as the fallback committed on failure.
pub struct CheckpointHostFunction;

impl HostFunction for CheckpointHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_CHECKPOINT
    }
    fn name(&self) -> &'static str {
        "checkpoint"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let gas = *context.gas;
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        accumulate.y = accumulate.x.clone();
        context.reply(gas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_functions::accumulate::test_support::{args, harness, caller};

    #[test]
    fn copies_x_into_y() {
        let mut harness = harness(10);
        caller(&mut harness).balance = 99;
        let before = args(&mut harness);
        assert_ne!(before.x, before.y);
        assert!(harness.call(&CheckpointHostFunction).should_continue());
        assert_eq!(harness.registers[7], harness.gas);
        let after = args(&mut harness);
        assert_eq!(after.x, after.y);
    }
}
