//! QUERY host function (Ω_Q). Gray Paper: function ID 22.
//! r7=hash offset, r8=preimage length. The request history is packed into r7 and r8.

use crate::config::{FUNC_QUERY, REG_NONE, REG_WHAT};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::types::{Hash, TimeSlot};

/// QUERY (22): report the state of one of the caller's preimage requests.
pub struct QueryHostFunction;

/// (r7, r8) for a request history of up to three timeslots.
fn pack(slots: &[TimeSlot]) -> Option<(u64, u64)> {
    let wide = |slot: TimeSlot| u64::from(slot) << 32;
    match *slots {
        [] => Some((0, 0)),
        [x] => Some((1 + wide(x), 0)),
        [x, y] => Some((2 + wide(x), u64::from(y))),
        [x, y, w] => Some((3 + wide(x), u64::from(y) + wide(w))),
        _ => None,
    }
}

impl HostFunction for QueryHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_QUERY
    }
    fn name(&self) -> &'static str {
        "query"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let hash_offset = context.registers[7];
        let length = context.registers[8];

        let Some(hash) = context
            .read_memory(hash_offset, 32)
            .and_then(|bytes| Hash::try_from(bytes.as_slice()).ok())
        else {
            return context.oob_panic();
        };
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        let packed = u32::try_from(length).ok().and_then(|length| {
            let account = accumulate.x.self_account()?;
            pack(account.lookups.get(&(hash, length))?)
        });
        let (first, second) = packed.unwrap_or((REG_NONE, 0));
        context.registers[8] = second;
        context.reply(first)
    }
}
