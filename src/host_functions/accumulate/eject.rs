//! EJECT host function (Ω_J). Gray Paper: function ID 21.
//! r7=service to eject, r8=hash offset of its last remaining request.
//! The target must name the caller as code hash (E32 of the caller id) and hold nothing
//! but one expired request; its balance moves to the caller.

use crate::codec::encode_fixed_length;
use crate::config::{FUNC_EJECT, LOOKUP_OCTETS_BASE, REG_HUH, REG_OK, REG_WHAT, REG_WHO};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::types::{Hash, ServiceId};

/// EJECT (21): remove a service that has handed itself over to the caller.
pub struct EjectHostFunction;

impl HostFunction for EjectHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_EJECT
    }
    fn name(&self) -> &'static str {
        "eject"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let target = context.registers[7];
        let hash_offset = context.registers[8];

        let Some(hash) = context
            .read_memory(hash_offset, 32)
            .and_then(|bytes| Hash::try_from(bytes.as_slice()).ok())
        else {
            return context.oob_panic();
        };
        let expunge_period = context.config.params.preimage_expunge_period;
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        let x = &mut accumulate.x;
        let caller = x.service_id;
        let Some(target) = ServiceId::try_from(target).ok().filter(|&id| id != caller) else {
            return context.reply(REG_WHO);
        };
        let Some(account) = x.state.accounts.get(&target) else {
            return context.reply(REG_WHO);
        };
        if account.code_hash.as_slice() != encode_fixed_length(u64::from(caller), 32) {
            return context.reply(REG_WHO);
        }

        let length = account.octets().max(LOOKUP_OCTETS_BASE) - LOOKUP_OCTETS_BASE;
        let slots = u32::try_from(length)
            .ok()
            .and_then(|length| account.lookups.get(&(hash, length)));
        let Some(slots) = slots.filter(|_| account.items() == 2) else {
            return context.reply(REG_HUH);
        };
        let expired = matches!(
            slots.as_slice(),
            [_, y] if *y < accumulate.timeslot.saturating_sub(expunge_period)
        );
        if !expired {
            return context.reply(REG_HUH);
        }

        let balance = account.balance;
        x.state.accounts.remove(&target);
        if let Some(account) = x.self_account_mut() {
            account.balance = account.balance.saturating_add(balance);
        }
        context.reply(REG_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_functions::accumulate::test_support::{args, caller, harness, CALLER};
    use crate::host_functions::general::test_support::Harness;
    use crate::state::ServiceAccount;

    fn setup(forgotten_at: u32) -> Harness {
        let mut harness = harness(10);
        let mut code_hash = [0u8; 32];
        code_hash[..4].copy_from_slice(&CALLER.to_le_bytes());
        let mut target = ServiceAccount {
            code_hash,
            balance: 500,
            ..ServiceAccount::default()
        };
        target.lookups.insert(([9u8; 32], 20), vec![1, forgotten_at]);
        args(&mut harness).x.state.accounts.insert(3, target);
        harness.memory.write(0x2_0000, &[9u8; 32]);
        harness.registers[7] = 3;
        harness.registers[8] = 0x2_0000;
        harness
    }

    #[test]
    fn expired_target_is_absorbed() {
        let mut harness = setup(10);
        assert!(harness.call(&EjectHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_OK);
        assert_eq!(caller(&mut harness).balance, 510);
        assert!(!args(&mut harness).x.state.accounts.contains_key(&3));
    }

    #[test]
    fn recent_request_is_huh() {
        // Timeslot 50_000 minus the 19_200 expunge period.
        let mut harness = setup(40_000);
        assert!(harness.call(&EjectHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_HUH);
        assert!(args(&mut harness).x.state.accounts.contains_key(&3));
    }

    #[test]
    fn self_or_foreign_code_is_who() {
        let mut harness = setup(10);
        harness.registers[7] = u64::from(CALLER);
        assert!(harness.call(&EjectHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_WHO);

        let mut harness = setup(10);
        if let Some(target) = args(&mut harness).x.state.accounts.get_mut(&3) {
            target.code_hash = [1; 32];
        }
        assert!(harness.call(&EjectHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_WHO);
    }
}
