//! NEW host function (Ω_N). Gray Paper: function ID 18.
//! r7=code hash offset, r8=code length, r9=min item gas, r10=min memo gas, r11=gratis.
//! The new account is endowed with exactly its threshold, paid by the caller.

use std::collections::BTreeMap;

use crate::config::{FUNC_NEW, REG_CASH, REG_HUH, REG_WHAT, REG_WHO};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::state::{next_service_id, ServiceAccount};
use crate::types::Hash;

/// NEW (18): create a service account and return its id.
pub struct NewHostFunction;

impl HostFunction for NewHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_NEW
    }
    fn name(&self) -> &'static str {
        "new"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let code_hash_offset = context.registers[7];
        let code_length = context.registers[8];
        let min_item_gas = context.registers[9];
        let min_memo_gas = context.registers[10];
        let gratis = context.registers[11];

        let code_hash = context
            .read_memory(code_hash_offset, 32)
            .and_then(|bytes| Hash::try_from(bytes.as_slice()).ok());
        let (Some(code_hash), Ok(code_length)) = (code_hash, u32::try_from(code_length)) else {
            crate::host_log_error!("[hostfn] new PANIC: code hash unreadable at {}", code_hash_offset);
            return context.oob_panic();
        };

        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        let x = &mut accumulate.x;
        if gratis != 0 && x.service_id != x.state.manager {
            return context.reply(REG_HUH);
        }

        let mut account = ServiceAccount {
            code_hash,
            min_item_gas,
            min_memo_gas,
            gratis,
            created: accumulate.timeslot,
            parent: x.service_id,
            lookups: BTreeMap::from([((code_hash, code_length), Vec::new())]),
            ..ServiceAccount::default()
        };
        account.balance = account.threshold();

        let Some(caller) = x.self_account_mut() else {
            return context.reply(REG_WHO);
        };
        let remaining = caller.balance.checked_sub(account.balance);
        let Some(remaining) = remaining.filter(|&b| b >= caller.threshold()) else {
            crate::host_log_error!("[hostfn] new CASH: balance {}", caller.balance);
            return context.reply(REG_CASH);
        };
        caller.balance = remaining;

        let id = x.next_free_id;
        x.state.accounts.insert(id, account);
        x.next_free_id = next_service_id(id, &x.state.accounts);
        crate::host_log!("[hostfn] new service {}", id);
        context.reply(u64::from(id))
    }
}
