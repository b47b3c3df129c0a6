//! MACHINE host function (Ω_M). Gray Paper: function ID 8.
//! r7=program offset, r8=program length, r9=initial pc. r7 = handle of the new machine.

use crate::config::{FUNC_MACHINE, REG_HUH, REG_WHAT};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::host_functions::refine::{next_machine_handle, NestedVm};
use crate::parser::Program;

/// MACHINE (8): deblob a program into a fresh nested VM with empty memory.
pub struct MachineHostFunction;

impl HostFunction for MachineHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_MACHINE
    }
    fn name(&self) -> &'static str {
        "machine"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let program_offset = context.registers[7];
        let program_length = context.registers[8];
        let pc = context.registers[9];

        let Some(blob) = context.read_memory(program_offset, program_length) else {
            crate::host_log_error!("[hostfn] machine PANIC: program unreadable at {}", program_offset);
            return context.oob_panic();
        };
        let program = match Program::deblob(&blob) {
            Ok(program) => program,
            Err(_error) => {
                crate::host_log_error!("[hostfn] machine HUH: {}", _error);
                return context.reply(REG_HUH);
            }
        };
        let Some(refine) = context.args.refine_mut() else {
            return context.reply(REG_WHAT);
        };
        let handle = next_machine_handle(&refine.machines);
        // A pc past 2^32 can never be an instruction start; the first step traps.
        let pc = u32::try_from(pc).unwrap_or(u32::MAX);
        refine.machines.insert(handle, NestedVm::new(program, pc));
        context.reply(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_functions::args::{HostCallArgs, RefineArgs};
    use crate::host_functions::general::test_support::Harness;
    use crate::instructions::test_support::assemble;

    #[test]
    fn allocates_increasing_handles() {
        let blob = assemble(&[&[0]], &[]).to_blob();
        let mut harness = Harness::new(HostCallArgs::Refine(RefineArgs::default()));
        harness.memory.write(0x2_0000, &blob);
        for expected in 0..2 {
            harness.registers[7] = 0x2_0000;
            harness.registers[8] = blob.len() as u64;
            harness.registers[9] = 0;
            assert!(harness.call(&MachineHostFunction).should_continue());
            assert_eq!(harness.registers[7], expected);
        }
    }

    #[test]
    fn bad_blob_is_huh() {
        let mut harness = Harness::new(HostCallArgs::Refine(RefineArgs::default()));
        harness.memory.write(0x2_0000, &[0xff]);
        harness.registers[7] = 0x2_0000;
        harness.registers[8] = 1;
        assert!(harness.call(&MachineHostFunction).should_continue());
        assert_eq!(harness.registers[7], REG_HUH);
    }
}
