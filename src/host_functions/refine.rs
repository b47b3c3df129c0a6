//! Nested machines created by MACHINE and driven by PEEK, POKE, PAGES, INVOKE and EXPUNGE.

use std::collections::BTreeMap;

use crate::config::PvmConfig;
use crate::parser::Program;
use crate::pvm::{BlockMeter, Pvm};
use crate::ram::Memory;
use crate::types::{ExitReason, Gas, Registers};

/// Child VM: program, memory, resume pc and block metering. Gas and registers live in the
/// parent's memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NestedVm {
    pub program: Program,
    pub memory: Memory,
    pub pc: u32,
    meter: BlockMeter,
}

/// Outcome of one INVOKE.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvokeOutcome {
    pub exit: ExitReason,
    pub gas: Gas,
    pub registers: Registers,
}

impl NestedVm {
    #[must_use]
    pub fn new(program: Program, pc: u32) -> Self {
        Self {
            program,
            memory: Memory::new(),
            pc,
            meter: BlockMeter::default(),
        }
    }

    /// Run the engine alone until its first exit that is not `Continue`. Host calls are not
    /// serviced: they surface to the parent with the pc already past the ECALLI.
    pub fn invoke(&mut self, config: &PvmConfig, gas: Gas, registers: Registers) -> InvokeOutcome {
        let mut pvm = Pvm::new(
            std::mem::take(&mut self.program),
            registers,
            std::mem::take(&mut self.memory),
            self.pc,
            gas,
        );
        pvm.meter = std::mem::take(&mut self.meter);
        let exit = pvm.run(config);
        self.program = pvm.program;
        self.memory = pvm.memory;
        self.pc = pvm.pc;
        self.meter = pvm.meter;
        InvokeOutcome {
            exit,
            gas: pvm.gas,
            registers: pvm.registers,
        }
    }
}

/// Smallest handle not in use.
#[must_use]
pub fn next_machine_handle(machines: &BTreeMap<u64, NestedVm>) -> u64 {
    let mut handle = 0;
    for &used in machines.keys() {
        if used != handle {
            break;
        }
        handle += 1;
    }
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::test_support::assemble;

    #[test]
    fn smallest_free_handle() {
        let mut machines = BTreeMap::new();
        assert_eq!(next_machine_handle(&machines), 0);
        machines.insert(0, NestedVm::default());
        machines.insert(2, NestedVm::default());
        assert_eq!(next_machine_handle(&machines), 1);
        machines.insert(1, NestedVm::default());
        assert_eq!(next_machine_handle(&machines), 3);
    }

    #[test]
    fn invoke_stops_at_host_call_past_ecalli() {
        // load_imm r0, 9 ; ecalli 3 ; trap
        let program = assemble(&[&[51, 0x00, 9], &[10, 3], &[0]], &[]);
        let mut vm = NestedVm::new(program, 0);
        let outcome = vm.invoke(&PvmConfig::default(), 100, [0; 13]);
        assert_eq!(outcome.exit, ExitReason::HostCall(3));
        assert_eq!(outcome.registers[0], 9);
        assert_eq!(outcome.gas, 98);
        assert_eq!(vm.pc, 5);

        let outcome = vm.invoke(&PvmConfig::default(), outcome.gas, outcome.registers);
        assert_eq!(outcome.exit, ExitReason::Panic);
        assert_eq!(vm.pc, 5);
    }

    #[test]
    fn resumed_block_is_not_charged_again() {
        // load_imm r0, 9 ; ecalli 3 ; trap
        let program = assemble(&[&[51, 0x00, 9], &[10, 3], &[0]], &[]);
        let config = PvmConfig::block_based();

        let mut top = Pvm::new(program.clone(), [0; 13], Memory::new(), 0, 1000);
        assert_eq!(top.run(&config), ExitReason::HostCall(3));
        let after_call = top.gas;
        assert_eq!(top.run(&config), ExitReason::Panic);
        assert_eq!(top.gas, after_call);

        let mut vm = NestedVm::new(program, 0);
        let outcome = vm.invoke(&config, 1000, [0; 13]);
        assert_eq!(outcome.exit, ExitReason::HostCall(3));
        assert_eq!(outcome.gas, after_call);
        let outcome = vm.invoke(&config, outcome.gas, outcome.registers);
        assert_eq!(outcome.exit, ExitReason::Panic);
        assert_eq!(outcome.gas, top.gas);
    }
}
