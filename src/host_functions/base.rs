//! Host function trait, call context and the memory helpers shared by every handler.

use std::collections::BTreeMap;

use crate::config::{PvmConfig, HOST_CALL_BASE_GAS, REG_NONE, REG_OOB};
use crate::host_functions::args::HostCallArgs;
use crate::ram::Memory;
use crate::state::ServiceAccount;
use crate::types::{ExitReason, Gas, Registers, ServiceId};

/// Outcome of a host function: continue the guest, or stop with a terminal exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostFunctionResult {
    pub exit: ExitReason,
}

impl HostFunctionResult {
    #[must_use]
    pub const fn continue_execution() -> Self {
        Self {
            exit: ExitReason::Continue,
        }
    }

    #[must_use]
    pub const fn panic() -> Self {
        Self {
            exit: ExitReason::Panic,
        }
    }

    #[must_use]
    pub const fn should_continue(&self) -> bool {
        matches!(self.exit, ExitReason::Continue)
    }
}

/// State a host function may read and mutate. The fee has already been charged.
pub struct HostFunctionContext<'a> {
    pub registers: &'a mut Registers,
    pub memory: &'a mut Memory,
    pub gas: &'a mut Gas,
    pub config: &'a PvmConfig,
    pub args: &'a mut HostCallArgs,
}

impl HostFunctionContext<'_> {
    /// Bytes at [offset, offset+len) if the range is readable.
    #[must_use]
    pub fn read_memory(&self, offset: u64, len: u64) -> Option<Vec<u8>> {
        if !self.memory.is_readable(offset, len) {
            return None;
        }
        self.memory.read(offset, len).ok()
    }

    /// Set r7 = OOB and stop the guest.
    pub fn oob_panic(&mut self) -> HostFunctionResult {
        self.registers[7] = REG_OOB;
        HostFunctionResult::panic()
    }

    /// Set r7 and keep running.
    pub fn reply(&mut self, value: u64) -> HostFunctionResult {
        self.registers[7] = value;
        HostFunctionResult::continue_execution()
    }

    /// Write `value[f..f+l]` at `output` with f = min(from, |v|), l = min(length, |v| - f),
    /// then r7 = |v|. Nothing is checked when l is 0.
    pub fn write_slice(&mut self, value: &[u8], output: u64, from: u64, length: u64) -> HostFunctionResult {
        let size = value.len() as u64;
        let f = from.min(size);
        let l = length.min(size - f);
        if l == 0 {
            return self.reply(size);
        }
        if !self.memory.is_writeable(output, l) {
            return self.oob_panic();
        }
        self.memory.write(output, &value[f as usize..(f + l) as usize]);
        self.reply(size)
    }
}

/// Target service of a general call: r = NONE means the caller itself.
#[must_use]
pub fn resolve_service(selector: u64, caller: ServiceId) -> Option<ServiceId> {
    if selector == REG_NONE {
        return Some(caller);
    }
    ServiceId::try_from(selector).ok()
}

/// Account named by `selector` in `accounts`.
#[must_use]
pub fn resolve_account(
    accounts: &BTreeMap<ServiceId, ServiceAccount>,
    selector: u64,
    caller: ServiceId,
) -> Option<&ServiceAccount> {
    accounts.get(&resolve_service(selector, caller)?)
}

/// Trait for host function implementations (general, refine and accumulate).
pub trait HostFunction: Send + Sync {
    /// Function ID (FUNC_* constant).
    fn function_id(&self) -> u32;
    /// Human-readable name.
    fn name(&self) -> &'static str;
    /// Fee charged before `execute`.
    fn gas_cost(&self, _registers: &Registers) -> Gas {
        HOST_CALL_BASE_GAS
    }
    /// Execute the host function. May mutate registers, memory, gas and the context payload.
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult;
}
