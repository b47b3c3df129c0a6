//! WRITE host function (Ω_W). Gray Paper: function ID 4.
//! r7=key offset, r8=key length, r9=value offset, r10=value length (0 deletes).
//! r7 = previous value length or NONE; FULL when the new threshold exceeds the balance.

use crate::config::{FUNC_WRITE, REG_FULL, REG_NONE, REG_WHO};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};

/// WRITE (4): set or delete a key in the caller's own storage.
pub struct WriteHostFunction;

impl HostFunction for WriteHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_WRITE
    }
    fn name(&self) -> &'static str {
        "write"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let key_offset = context.registers[7];
        let key_length = context.registers[8];
        let value_offset = context.registers[9];
        let value_length = context.registers[10];

        let Some(key) = context.read_memory(key_offset, key_length) else {
            crate::host_log_error!("[hostfn] write PANIC: key unreadable at {}", key_offset);
            return context.oob_panic();
        };
        let value = if value_length == 0 {
            None
        } else {
            match context.read_memory(value_offset, value_length) {
                Some(value) => Some(value),
                None => {
                    crate::host_log_error!("[hostfn] write PANIC: value unreadable at {}", value_offset);
                    return context.oob_panic();
                }
            }
        };

        let Some(service_id) = context.args.service_id() else {
            return context.reply(REG_WHO);
        };
        let Some(account) = context
            .args
            .accounts_mut()
            .and_then(|accounts| accounts.get_mut(&service_id))
        else {
            return context.reply(REG_WHO);
        };

        if account.threshold_after_write(&key, value.as_deref()) > account.balance {
            crate::host_log_error!("[hostfn] write FULL: service {} balance {}", service_id, account.balance);
            context.registers[7] = REG_FULL;
            return HostFunctionResult::continue_execution();
        }
        let previous = match value {
            Some(value) => account.storage.insert(key, value),
            None => account.storage.remove(&key),
        };
        let result = previous.map_or(REG_NONE, |previous| previous.len() as u64);
        context.reply(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REG_OOB;
    use crate::host_functions::args::{HostCallArgs, OnTransferArgs};
    use crate::host_functions::general::test_support::Harness;
    use crate::state::ServiceAccount;

    fn harness(balance: u64) -> Harness {
        let mut args = OnTransferArgs {
            service_id: 3,
            ..OnTransferArgs::default()
        };
        args.accounts.insert(
            3,
            ServiceAccount {
                balance,
                ..ServiceAccount::default()
            },
        );
        let mut harness = Harness::new(HostCallArgs::OnTransfer(args));
        harness.memory.write(0x2_0000, b"k");
        harness.memory.write(0x2_0010, b"abcd");
        harness.registers[7] = 0x2_0000;
        harness.registers[8] = 1;
        harness.registers[9] = 0x2_0010;
        harness.registers[10] = 4;
        harness
    }

    fn storage(harness: &Harness) -> Option<Vec<u8>> {
        harness.args.accounts()?.get(&3)?.storage.get(b"k".as_slice()).cloned()
    }

    #[test]
    fn insert_then_replace_then_delete() {
        let mut harness = harness(1_000);
        assert!(harness.call(&WriteHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_NONE);
        assert_eq!(storage(&harness), Some(b"abcd".to_vec()));

        harness.registers[7] = 0x2_0000;
        harness.registers[10] = 2;
        assert!(harness.call(&WriteHostFunction).should_continue());
        assert_eq!(harness.registers[7], 4);
        assert_eq!(storage(&harness), Some(b"ab".to_vec()));

        harness.registers[7] = 0x2_0000;
        harness.registers[10] = 0;
        assert!(harness.call(&WriteHostFunction).should_continue());
        assert_eq!(harness.registers[7], 2);
        assert_eq!(storage(&harness), None);
    }

    #[test]
    fn insufficient_balance_is_full() {
        let mut harness = harness(100);
        assert!(harness.call(&WriteHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_FULL);
        assert_eq!(storage(&harness), None);
    }

    #[test]
    fn unreadable_value_panics_without_change() {
        let mut harness = harness(1_000);
        harness.registers[9] = 0x8_0000;
        assert!(!harness.call(&WriteHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_OOB);
        assert_eq!(storage(&harness), None);
    }
}
