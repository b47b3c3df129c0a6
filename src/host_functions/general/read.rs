//! READ host function (Ω_R). Gray Paper: function ID 3.
//! r7=service (NONE=self), r8=key offset, r9=key length, r10=output offset, r11=from, r12=length.

use crate::config::{FUNC_READ, REG_NONE};
use crate::host_functions::base::{
    resolve_account, HostFunction, HostFunctionContext, HostFunctionResult,
};

/// READ (3): storage value under the key at r8 of the selected account.
pub struct ReadHostFunction;

impl HostFunction for ReadHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_READ
    }
    fn name(&self) -> &'static str {
        "read"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let selector = context.registers[7];
        let key_offset = context.registers[8];
        let key_length = context.registers[9];
        let output_offset = context.registers[10];
        let from_offset = context.registers[11];
        let length = context.registers[12];

        let Some(key) = context.read_memory(key_offset, key_length) else {
            crate::host_log_error!(
                "[hostfn] read PANIC: key unreadable (offset={}, len={})",
                key_offset,
                key_length
            );
            return context.oob_panic();
        };

        let caller = context.args.service_id().unwrap_or_default();
        let value = context
            .args
            .accounts()
            .and_then(|accounts| resolve_account(accounts, selector, caller))
            .and_then(|account| account.storage.get(&key).cloned());
        match value {
            Some(value) => context.write_slice(&value, output_offset, from_offset, length),
            None => {
                crate::host_log!("[hostfn] read: key of length {} not found", key.len());
                context.reply(REG_NONE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_functions::args::{AccumulateArgs, HostCallArgs};
    use crate::host_functions::general::test_support::Harness;
    use crate::state::ServiceAccount;

    fn harness() -> Harness {
        let mut args = AccumulateArgs::default();
        args.x.service_id = 1;
        let mut account = ServiceAccount::default();
        account.storage.insert(b"key".to_vec(), b"value".to_vec());
        args.x.state.accounts.insert(1, account);
        let mut harness = Harness::new(HostCallArgs::Accumulate(args));
        harness.memory.write(0x2_0000, b"key");
        harness.registers[7] = REG_NONE;
        harness.registers[8] = 0x2_0000;
        harness.registers[9] = 3;
        harness
    }

    #[test]
    fn reads_own_storage() {
        let mut harness = harness();
        harness.registers[10] = 0x2_0100;
        harness.registers[12] = 5;
        assert!(harness.call(&ReadHostFunction).should_continue());
        assert_eq!(harness.registers[7], 5);
        assert_eq!(harness.memory.read(0x2_0100, 5), Ok(b"value".to_vec()));
    }

    #[test]
    fn zero_length_on_unmapped_output_only_reports_size() {
        let mut harness = harness();
        let before = harness.memory.clone();
        harness.registers[10] = 0x7_0000;
        harness.registers[12] = 0;
        assert!(harness.call(&ReadHostFunction).should_continue());
        assert_eq!(harness.registers[7], 5);
        assert_eq!(harness.memory, before);
    }

    #[test]
    fn empty_key_and_output_in_unmapped_memory() {
        let mut harness = harness();
        if let HostCallArgs::Accumulate(args) = &mut harness.args {
            if let Some(account) = args.x.self_account_mut() {
                account.storage.insert(Vec::new(), Vec::new());
            }
        }
        let before = harness.memory.clone();
        harness.registers[8] = 0x9_0000;
        harness.registers[9] = 0;
        harness.registers[10] = 0x9_0000;
        harness.registers[12] = 0;
        assert!(harness.call(&ReadHostFunction).should_continue());
        assert_eq!(harness.registers[7], 0);
        assert_eq!(harness.memory, before);
    }

    #[test]
    fn missing_key_is_none() {
        let mut harness = harness();
        harness.registers[9] = 2;
        assert!(harness.call(&ReadHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_NONE);
    }
}
