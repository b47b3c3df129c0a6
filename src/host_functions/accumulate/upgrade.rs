//! UPGRADE host function (Ω_U). Gray Paper: function ID 19.
//! r7=code hash offset, r8=min item gas, r9=min memo gas.

use crate::config::{FUNC_UPGRADE, REG_OK, REG_WHAT, REG_WHO};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::types::Hash;

/// UPGRADE (19): replace the caller's code hash and gas minima.
pub struct UpgradeHostFunction;

impl HostFunction for UpgradeHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_UPGRADE
    }
    fn name(&self) -> &'static str {
        "upgrade"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let code_hash_offset = context.registers[7];
        let min_item_gas = context.registers[8];
        let min_memo_gas = context.registers[9];

        let Some(code_hash) = context
            .read_memory(code_hash_offset, 32)
            .and_then(|bytes| Hash::try_from(bytes.as_slice()).ok())
        else {
            return context.oob_panic();
        };
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        let Some(account) = accumulate.x.self_account_mut() else {
            return context.reply(REG_WHO);
        };
        account.code_hash = code_hash;
        account.min_item_gas = min_item_gas;
        account.min_memo_gas = min_memo_gas;
        context.reply(REG_OK)
    }
}
