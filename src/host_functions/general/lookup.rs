//! LOOKUP host function (Ω_L). Gray Paper: function ID 2.
//! r7=service (NONE=self), r8=hash offset, r9=output offset, r10=from, r11=length.

use crate::config::{FUNC_LOOKUP, REG_NONE};
use crate::host_functions::base::{
    resolve_account, HostFunction, HostFunctionContext, HostFunctionResult,
};

/// LOOKUP (2): preimage of the 32-byte hash at r8 held by the selected account.
pub struct LookupHostFunction;

impl HostFunction for LookupHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_LOOKUP
    }
    fn name(&self) -> &'static str {
        "lookup"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let selector = context.registers[7];
        let hash_offset = context.registers[8];
        let output_offset = context.registers[9];
        let from_offset = context.registers[10];
        let length = context.registers[11];

        let caller = context.args.service_id().unwrap_or_default();
        let found = context
            .args
            .accounts()
            .and_then(|accounts| resolve_account(accounts, selector, caller))
            .is_some();
        if !found {
            crate::host_log_error!("[hostfn] lookup: service {} not found", selector);
            return context.reply(REG_NONE);
        }

        let Some(hash) = context.read_memory(hash_offset, 32) else {
            crate::host_log_error!("[hostfn] lookup PANIC: hash unreadable at {}", hash_offset);
            return context.oob_panic();
        };
        let preimage = context
            .args
            .accounts()
            .and_then(|accounts| resolve_account(accounts, selector, caller))
            .and_then(|account| {
                let hash: [u8; 32] = hash.as_slice().try_into().ok()?;
                account.preimages.get(&hash).cloned()
            });
        match preimage {
            Some(preimage) => context.write_slice(&preimage, output_offset, from_offset, length),
            None => context.reply(REG_NONE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REG_OOB;
    use crate::crypto::blake2b256;
    use crate::host_functions::args::{HostCallArgs, OnTransferArgs};
    use crate::host_functions::general::test_support::Harness;
    use crate::state::ServiceAccount;

    fn harness_with_preimage(preimage: &[u8]) -> Harness {
        let mut account = ServiceAccount::default();
        account.preimages.insert(blake2b256(preimage), preimage.to_vec());
        let mut args = OnTransferArgs {
            service_id: 5,
            ..OnTransferArgs::default()
        };
        args.accounts.insert(5, account);
        let mut harness = Harness::new(HostCallArgs::OnTransfer(args));
        harness.memory.write(0x2_0000, &blake2b256(preimage));
        harness
    }

    #[test]
    fn copies_requested_slice() {
        let mut harness = harness_with_preimage(b"hello world");
        harness.registers[7] = REG_NONE;
        harness.registers[8] = 0x2_0000;
        harness.registers[9] = 0x2_0100;
        harness.registers[10] = 6;
        harness.registers[11] = 100;
        assert!(harness.call(&LookupHostFunction).should_continue());
        assert_eq!(harness.registers[7], 11);
        assert_eq!(harness.memory.read(0x2_0100, 5), Ok(b"world".to_vec()));
    }

    #[test]
    fn unknown_service_is_none() {
        let mut harness = harness_with_preimage(b"x");
        harness.registers[7] = 99;
        assert!(harness.call(&LookupHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_NONE);
    }

    #[test]
    fn unreadable_hash_panics() {
        let mut harness = harness_with_preimage(b"x");
        harness.registers[7] = 5;
        harness.registers[8] = 0x5_0000;
        assert!(!harness.call(&LookupHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_OOB);
    }
}
