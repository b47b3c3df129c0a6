//! FORGET host function (Ω_F). Gray Paper: function ID 24.
//! r7=hash offset, r8=preimage length.

use crate::config::{FUNC_FORGET, REG_HUH, REG_OK, REG_WHAT};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::types::{Hash, TimeSlot};

/// FORGET (24): drop or retire one of the caller's preimage requests.
pub struct ForgetHostFunction;

enum Forget {
    Remove,
    Replace(Vec<TimeSlot>),
}

/// New request history after forgetting at `t`. None when the request cannot be forgotten yet.
fn forget(slots: &[TimeSlot], t: TimeSlot, expunge_period: TimeSlot) -> Option<Forget> {
    let cutoff = t.saturating_sub(expunge_period);
    match *slots {
        [] => Some(Forget::Remove),
        [_, y] if y < cutoff => Some(Forget::Remove),
        [x] => Some(Forget::Replace(vec![x, t])),
        [_, y, w] if y < cutoff => Some(Forget::Replace(vec![w, t])),
        _ => None,
    }
}

impl HostFunction for ForgetHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_FORGET
    }
    fn name(&self) -> &'static str {
        "forget"
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
        let expunge_period = context.config.params.preimage_expunge_period;
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        let timeslot = accumulate.timeslot;
        let Some(account) = accumulate.x.self_account_mut() else {
            return context.reply(REG_HUH);
        };
        let Some(key) = u32::try_from(length).ok().map(|length| (hash, length)) else {
            return context.reply(REG_HUH);
        };
        let outcome = account
            .lookups
            .get(&key)
            .and_then(|slots| forget(slots, timeslot, expunge_period));
        match outcome {
            Some(Forget::Remove) => {
                account.lookups.remove(&key);
                account.preimages.remove(&hash);
            }
            Some(Forget::Replace(slots)) => {
                account.lookups.insert(key, slots);
            }
            None => return context.reply(REG_HUH),
        }
        context.reply(REG_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_functions::accumulate::test_support::{caller, harness};
    use crate::host_functions::general::test_support::Harness;

    const KEY: (Hash, u32) = ([6u8; 32], 4);

    fn setup(slots: Vec<TimeSlot>) -> Harness {
        let mut harness = harness(1_000);
        let account = caller(&mut harness);
        account.lookups.insert(KEY, slots);
        account.preimages.insert(KEY.0, vec![1, 2, 3, 4]);
        harness.memory.write(0x2_0000, &KEY.0);
        harness.registers[7] = 0x2_0000;
        harness.registers[8] = 4;
        harness
    }

    #[test]
    fn unprovided_request_is_dropped() {
        let mut harness = setup(vec![]);
        assert!(harness.call(&ForgetHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_OK);
        assert!(caller(&mut harness).lookups.is_empty());
        assert!(caller(&mut harness).preimages.is_empty());
    }

    #[test]
    fn available_preimage_is_marked_forgotten() {
        let mut harness = setup(vec![7]);
        assert!(harness.call(&ForgetHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_OK);
        assert_eq!(caller(&mut harness).lookups.get(&KEY), Some(&vec![7, 50_000]));
        assert!(caller(&mut harness).preimages.contains_key(&KEY.0));
    }

    #[test]
    fn expiry_window() {
        let mut harness = setup(vec![1, 2, 3]);
        assert!(harness.call(&ForgetHostFunction).should_continue());
        assert_eq!(caller(&mut harness).lookups.get(&KEY), Some(&vec![3, 50_000]));

        let mut harness = setup(vec![1, 40_000]);
        assert!(harness.call(&ForgetHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_HUH);
        assert_eq!(caller(&mut harness).lookups.get(&KEY), Some(&vec![1, 40_000]));

        let mut harness = setup(vec![1, 2]);
        assert!(harness.call(&ForgetHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_OK);
        assert!(caller(&mut harness).lookups.is_empty());
    }

    #[test]
    fn missing_request_is_huh() {
        let mut harness = setup(vec![]);
        harness.registers[8] = 5;
        assert!(harness.call(&ForgetHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_HUH);
    }
}
