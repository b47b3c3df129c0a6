//! GAS host function (Ω_G). Gray Paper: function ID 0, gas cost 10.
//! Sets r7 = remaining gas.

use crate::config::FUNC_GAS;
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};

/// GAS (0): r7 = remaining gas after the fee.
pub struct GasHostFunction;

impl HostFunction for GasHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_GAS
    }
    fn name(&self) -> &'static str {
        "gas"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let gas = *context.gas;
        context.reply(gas)
    }
}
