//! YIELD host function. Gray Paper: function ID 25.
//! r7=hash offset. The last yielded hash becomes the accumulation output.

use crate::config::{FUNC_YIELD, REG_OK, REG_WHAT};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::types::Hash;

/// YIELD (25): set the accumulation output hash.
pub struct YieldHostFunction;

impl HostFunction for YieldHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_YIELD
    }
    fn name(&self) -> &'static str {
        "yield"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let hash_offset = context.registers[7];
        let Some(hash) = context
            .read_memory(hash_offset, 32)
            .and_then(|bytes| Hash::try_from(bytes.as_slice()).ok())
        else {
            return context.oob_panic();
        };
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        accumulate.x.yield_hash = Some(hash);
        context.reply(REG_OK)
    }
}
