//! SOLICIT host function (Ω_S). Gray Paper: function ID 23.
//! r7=hash offset, r8=preimage length.
//! Opens a new request, or re-requests a preimage that was provided and then forgotten.

use crate::config::{FUNC_SOLICIT, REG_FULL, REG_HUH, REG_OK, REG_WHAT};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::types::Hash;

/// SOLICIT (23): request a preimage for the caller.
pub struct SolicitHostFunction;

impl HostFunction for SolicitHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_SOLICIT
    }
    fn name(&self) -> &'static str {
        "solicit"
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
        let Ok(length) = u32::try_from(length) else {
            return context.reply(REG_HUH);
        };
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        let timeslot = accumulate.timeslot;
        let Some(account) = accumulate.x.self_account_mut() else {
            return context.reply(REG_HUH);
        };

        let key = (hash, length);
        match account.lookups.get(&key).map(Vec::len) {
            None => {
                if account.threshold_after_request(length) > account.balance {
                    crate::host_log_error!("[hostfn] solicit FULL: balance {}", account.balance);
                    return context.reply(REG_FULL);
                }
                account.lookups.insert(key, Vec::new());
            }
            Some(2) => {
                if account.threshold() > account.balance {
                    return context.reply(REG_FULL);
                }
                if let Some(slots) = account.lookups.get_mut(&key) {
                    slots.push(timeslot);
                }
            }
            Some(_) => return context.reply(REG_HUH),
        }
        context.reply(REG_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_functions::accumulate::test_support::{caller, harness};
    use crate::host_functions::general::test_support::Harness;

    fn setup(balance: u64) -> Harness {
        let mut harness = harness(balance);
        harness.memory.write(0x2_0000, &[3u8; 32]);
        harness.registers[7] = 0x2_0000;
        harness.registers[8] = 50;
        harness
    }

    #[test]
    fn opens_request() {
        // 100 + 10·2 + 81 + 50
        let mut harness = setup(251);
        assert!(harness.call(&SolicitHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_OK);
        assert_eq!(caller(&mut harness).lookups.get(&([3u8; 32], 50)), Some(&vec![]));
    }

    #[test]
    fn insufficient_balance_is_full() {
        let mut harness = setup(250);
        assert!(harness.call(&SolicitHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_FULL);
        assert!(caller(&mut harness).lookups.is_empty());
    }

    #[test]
    fn forgotten_preimage_is_re_requested() {
        let mut harness = setup(1_000);
        caller(&mut harness).lookups.insert(([3u8; 32], 50), vec![1, 2]);
        assert!(harness.call(&SolicitHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_OK);
        assert_eq!(
            caller(&mut harness).lookups.get(&([3u8; 32], 50)),
            Some(&vec![1, 2, 50_000])
        );
    }

    #[test]
    fn pending_request_is_huh() {
        let mut harness = setup(1_000);
        caller(&mut harness).lookups.insert(([3u8; 32], 50), vec![]);
        assert!(harness.call(&SolicitHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_HUH);
    }
}
