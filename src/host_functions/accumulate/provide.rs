//! PROVIDE host function. Gray Paper: function ID 26.
//! r7=service (NONE = caller), r8=preimage offset, r9=preimage length.
//! Provisions are applied after accumulation; here they are only recorded in X.

use crate::config::{FUNC_PROVIDE, REG_HUH, REG_OK, REG_WHAT, REG_WHO};
use crate::crypto::blake2b256;
use crate::host_functions::base::{
    resolve_service, HostFunction, HostFunctionContext, HostFunctionResult,
};

/// PROVIDE (26): supply a preimage some service has requested.
pub struct ProvideHostFunction;

impl HostFunction for ProvideHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_PROVIDE
    }
    fn name(&self) -> &'static str {
        "provide"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let selector = context.registers[7];
        let offset = context.registers[8];
        let length = context.registers[9];

        let Some(preimage) = context.read_memory(offset, length) else {
            return context.oob_panic();
        };
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        let x = &mut accumulate.x;
        let Some((service, account)) = resolve_service(selector, x.service_id)
            .and_then(|id| Some((id, x.state.accounts.get(&id)?)))
        else {
            return context.reply(REG_WHO);
        };
        let requested = u32::try_from(preimage.len())
            .ok()
            .and_then(|length| account.lookups.get(&(blake2b256(&preimage), length)))
            .is_some_and(Vec::is_empty);
        if !requested {
            return context.reply(REG_HUH);
        }
        if !x.provisions.insert((service, preimage)) {
            return context.reply(REG_HUH);
        }
        context.reply(REG_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REG_NONE;
    use crate::host_functions::accumulate::test_support::{args, caller, harness, CALLER};
    use crate::host_functions::general::test_support::Harness;

    fn setup() -> Harness {
        let mut harness = harness(1_000);
        caller(&mut harness)
            .lookups
            .insert((blake2b256(b"blob"), 4), vec![]);
        harness.memory.write(0x2_0000, b"blob");
        harness.registers[7] = REG_NONE;
        harness.registers[8] = 0x2_0000;
        harness.registers[9] = 4;
        harness
    }

    #[test]
    fn records_provision_once() {
        let mut harness = setup();
        assert!(harness.call(&ProvideHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_OK);
        assert!(args(&mut harness)
            .x
            .provisions
            .contains(&(CALLER, b"blob".to_vec())));

        harness.registers[7] = u64::from(CALLER);
        assert!(harness.call(&ProvideHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_HUH);
    }

    #[test]
    fn unrequested_or_unknown() {
        let mut harness = setup();
        harness.registers[9] = 3;
        assert!(harness.call(&ProvideHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_HUH);

        let mut harness = setup();
        harness.registers[7] = 5;
        assert!(harness.call(&ProvideHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_WHO);
    }
}
