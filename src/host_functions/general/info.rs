//! INFO host function (Ω_I). Gray Paper: function ID 5.
//! r7=service (NONE=self), r8=output offset, r9=from, r10=length.

use crate::codec::encode_service_info;
use crate::config::{FUNC_INFO, REG_NONE};
use crate::host_functions::base::{
    resolve_account, HostFunction, HostFunctionContext, HostFunctionResult,
};

/// INFO (5): encoded service summary of the selected account.
pub struct InfoHostFunction;

impl HostFunction for InfoHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_INFO
    }
    fn name(&self) -> &'static str {
        "info"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let selector = context.registers[7];
        let output_offset = context.registers[8];
        let from_offset = context.registers[9];
        let length = context.registers[10];

        let caller = context.args.service_id().unwrap_or_default();
        let info = context
            .args
            .accounts()
            .and_then(|accounts| resolve_account(accounts, selector, caller))
            .map(encode_service_info);
        match info {
            Some(info) => context.write_slice(&info, output_offset, from_offset, length),
            None => context.reply(REG_NONE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_functions::args::{HostCallArgs, OnTransferArgs};
    use crate::host_functions::general::test_support::Harness;
    use crate::state::ServiceAccount;

    #[test]
    fn writes_balance_after_code_hash() {
        let mut args = OnTransferArgs::default();
        args.accounts.insert(
            8,
            ServiceAccount {
                code_hash: [1; 32],
                balance: 777,
                ..ServiceAccount::default()
            },
        );
        let mut harness = Harness::new(HostCallArgs::OnTransfer(args));
        harness.registers[7] = 8;
        harness.registers[8] = 0x2_0000;
        harness.registers[10] = 40;
        assert!(harness.call(&InfoHostFunction).should_continue());
        assert_eq!(harness.registers[7], 96);
        assert_eq!(harness.memory.read(0x2_0000, 32), Ok(vec![1; 32]));
        assert_eq!(harness.memory.read(0x2_0020, 8), Ok(777u64.to_le_bytes().to_vec()));

        harness.registers[7] = 9;
        assert!(harness.call(&InfoHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_NONE);
    }
}
