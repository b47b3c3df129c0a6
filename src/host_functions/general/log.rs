//! LOG host function (JIP-1). Function ID 100, no fee.
//! level=r7 (0 FATAL, 1 ERROR, 2 WARN, 3 INFO, 4 DEBUG), target=μ[r8..+r9] (absent when both
//! are 0), message=μ[r10..+r11]. Unreadable memory is ignored and the guest continues.

use crate::config::FUNC_LOG;
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::types::{Gas, Registers};

/// LOG (100): forward a guest message to `tracing` under `log_host_call_logging`.
pub struct LogHostFunction;

/// Level name for r7; anything above 4 is treated as DEBUG.
#[must_use]
pub const fn level_name(level: u64) -> &'static str {
    match level {
        0 => "FATAL",
        1 => "ERROR",
        2 => "WARN",
        3 => "INFO",
        _ => "DEBUG",
    }
}

impl HostFunction for LogHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_LOG
    }
    fn name(&self) -> &'static str {
        "log"
    }
    fn gas_cost(&self, _registers: &Registers) -> Gas {
        0
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let level = context.registers[7];
        let target_offset = context.registers[8];
        let target_length = context.registers[9];
        let message_offset = context.registers[10];
        let message_length = context.registers[11];

        let target = if target_offset == 0 && target_length == 0 {
            None
        } else {
            context
                .read_memory(target_offset, target_length)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        };
        let Some(message) = context
            .read_memory(message_offset, message_length)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        else {
            return HostFunctionResult::continue_execution();
        };
        let _service = context.args.service_id();
        let _target = target.as_deref().unwrap_or("");

        #[cfg(feature = "log_host_call_logging")]
        match level {
            0 | 1 => tracing::error!(target: "jam_pvm::guest", service = ?_service, guest_target = _target, level = level_name(level), "{}", message),
            2 => tracing::warn!(target: "jam_pvm::guest", service = ?_service, guest_target = _target, "{}", message),
            3 => tracing::info!(target: "jam_pvm::guest", service = ?_service, guest_target = _target, "{}", message),
            _ => tracing::debug!(target: "jam_pvm::guest", service = ?_service, guest_target = _target, "{}", message),
        }
        #[cfg(not(feature = "log_host_call_logging"))]
        let _ = (level, message);

        HostFunctionResult::continue_execution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_functions::args::{HostCallArgs, IsAuthorizedArgs};
    use crate::host_functions::general::test_support::Harness;

    #[test]
    fn levels() {
        assert_eq!(level_name(0), "FATAL");
        assert_eq!(level_name(4), "DEBUG");
        assert_eq!(level_name(9), "DEBUG");
    }

    #[test]
    fn never_touches_registers_or_memory() {
        let mut harness = Harness::new(HostCallArgs::IsAuthorized(IsAuthorizedArgs::default()));
        harness.memory.write(0x2_0000, b"hello");
        harness.registers[7] = 3;
        harness.registers[10] = 0x2_0000;
        harness.registers[11] = 5;
        let registers = harness.registers;
        let memory = harness.memory.clone();
        assert!(harness.call(&LogHostFunction).should_continue());
        assert_eq!(harness.registers, registers);
        assert_eq!(harness.memory, memory);
        assert_eq!(LogHostFunction.gas_cost(&registers), 0);

        harness.registers[10] = 0x9_0000;
        assert!(harness.call(&LogHostFunction).should_continue());
    }
}
