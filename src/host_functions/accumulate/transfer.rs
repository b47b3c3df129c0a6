//! TRANSFER host function (Ω_T). Gray Paper: function ID 20.
//! r7=destination, r8=amount, r9=gas limit, r10=memo offset (128 bytes).
//! The fee is 10 plus the gas limit, charged whether or not the transfer succeeds.

use crate::config::{
    C_MEMO_SIZE, FUNC_TRANSFER, HOST_CALL_BASE_GAS, REG_CASH, REG_LOW, REG_OK, REG_WHAT, REG_WHO,
};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::state::DeferredTransfer;
use crate::types::{Gas, Registers, ServiceId};

/// TRANSFER (20): queue a deferred transfer and debit the caller.
pub struct TransferHostFunction;

impl HostFunction for TransferHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_TRANSFER
    }
    fn name(&self) -> &'static str {
        "transfer"
    }
    fn gas_cost(&self, registers: &Registers) -> Gas {
        HOST_CALL_BASE_GAS.saturating_add(registers[9])
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let destination = context.registers[7];
        let amount = context.registers[8];
        let gas_limit = context.registers[9];
        let memo_offset = context.registers[10];

        let Some(memo) = context.read_memory(memo_offset, C_MEMO_SIZE as u64) else {
            return context.oob_panic();
        };
        let Some(accumulate) = context.args.accumulate_mut() else {
            return context.reply(REG_WHAT);
        };
        let x = &mut accumulate.x;
        let Some(receiver) = ServiceId::try_from(destination)
            .ok()
            .and_then(|id| x.state.accounts.get(&id))
        else {
            return context.reply(REG_WHO);
        };
        if gas_limit < receiver.min_memo_gas {
            return context.reply(REG_LOW);
        }
        let source = x.service_id;
        let Some(sender) = x.self_account_mut() else {
            return context.reply(REG_WHO);
        };
        let Some(remaining) = sender
            .balance
            .checked_sub(amount)
            .filter(|&b| b >= sender.threshold())
        else {
            crate::host_log_error!("[hostfn] transfer CASH: balance {} amount {}", sender.balance, amount);
            return context.reply(REG_CASH);
        };
        sender.balance = remaining;
        x.transfers.push(DeferredTransfer {
            source,
            destination: destination as ServiceId,
            amount,
            memo,
            gas_limit,
        });
        context.reply(REG_OK)
    }
}
