//! EXPORT host function (Ω_E). Gray Paper: function ID 7.
//! r7=segment offset, r8=length (capped at one segment). Appends a zero-padded segment.

use crate::config::{FUNC_EXPORT, MAX_PACKAGE_EXPORTS, REG_FULL, REG_WHAT, SEGMENT_SIZE};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};

/// EXPORT (7): r7 = index of the new segment within the package, FULL past the export limit.
pub struct ExportHostFunction;

impl HostFunction for ExportHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_EXPORT
    }
    fn name(&self) -> &'static str {
        "export"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let offset = context.registers[7];
        let length = context.registers[8].min(u64::from(SEGMENT_SIZE));

        let Some(mut segment) = context.read_memory(offset, length) else {
            crate::host_log_error!("[hostfn] export PANIC: segment unreadable at {}", offset);
            return context.oob_panic();
        };
        let Some(refine) = context.args.refine_mut() else {
            return context.reply(REG_WHAT);
        };
        let index = refine.export_offset + refine.exports.len() as u64;
        if index >= u64::from(MAX_PACKAGE_EXPORTS) {
            crate::host_log_error!("[hostfn] export FULL at {}", index);
            return context.reply(REG_FULL);
        }
        segment.resize(SEGMENT_SIZE as usize, 0);
        refine.exports.push(segment);
        context.reply(index)
    }
}
