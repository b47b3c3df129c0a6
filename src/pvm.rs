//! PVM core: the gas-metered single-step loop (Gray Paper Ψ).
//!
//! [`Pvm::run`] executes until the first exit that is not `Continue`. Host calls surface as
//! `HostCall(id)` with the pc already past the ECALLI; the host-call loop in
//! [`crate::host_functions`] resumes by calling `run` again.

use std::collections::BTreeMap;

use crate::config::{GasMode, PvmConfig};
use crate::gas::{block_cost, charge};
use crate::instructions::step;
use crate::parser::Program;
use crate::ram::Memory;
use crate::types::{ExitReason, Gas, Registers};

/// Cost of one instruction in per-instruction mode.
const INSTRUCTION_GAS: Gas = 1;

/// Block-based metering state. Carried across resumptions of the same machine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockMeter {
    /// Block costs by start pc, filled lazily.
    costs: BTreeMap<u32, Gas>,
    /// Whether the block containing `pc` has been paid for.
    paid: bool,
}

/// Machine state: program, registers, memory, pc and remaining gas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pvm {
    pub program: Program,
    pub registers: Registers,
    pub memory: Memory,
    pub pc: u32,
    pub gas: Gas,
    pub meter: BlockMeter,
}

impl Pvm {
    #[must_use]
    pub fn new(program: Program, registers: Registers, memory: Memory, pc: u32, gas: Gas) -> Self {
        Self {
            program,
            registers,
            memory,
            pc,
            gas,
            meter: BlockMeter::default(),
        }
    }

    /// Charge for the instruction at `pc`. False means out of gas with nothing deducted.
    fn charge_next(&mut self, mode: GasMode, config: &PvmConfig) -> bool {
        match mode {
            GasMode::PerInstruction => charge(&mut self.gas, INSTRUCTION_GAS),
            GasMode::BlockBased => {
                if self.meter.paid && !self.program.is_block_start(self.pc) {
                    return true;
                }
                let pc = self.pc;
                let program = &self.program;
                let cost = *self
                    .meter
                    .costs
                    .entry(pc)
                    .or_insert_with(|| block_cost(program, config.cost_model.table(), pc));
                let paid = charge(&mut self.gas, cost);
                self.meter.paid = paid;
                paid
            }
        }
    }

    /// Execute one instruction, charging gas first.
    pub fn step(&mut self, config: &PvmConfig) -> ExitReason {
        if !self.charge_next(config.gas_mode, config) {
            return ExitReason::OutOfGas;
        }
        let (reason, next) = step(&self.program, &mut self.registers, &mut self.memory, self.pc);
        self.pc = next;
        reason
    }

    /// Run until halt, panic, fault, out-of-gas or a host call.
    pub fn run(&mut self, config: &PvmConfig) -> ExitReason {
        loop {
            let reason = self.step(config);
            if reason != ExitReason::Continue {
                return reason;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::test_support::{assemble, scratch_memory};

    #[test]
    fn trap_costs_one_gas() {
        let program = assemble(&[&[0]], &[]);
        let mut pvm = Pvm::new(program, [0; 13], Memory::new(), 0, 1000);
        assert_eq!(pvm.run(&PvmConfig::default()), ExitReason::Panic);
        assert_eq!(pvm.gas, 999);
        assert_eq!(pvm.pc, 0);
    }

    #[test]
    fn out_of_gas_leaves_gas_and_pc() {
        // load_imm r0, 1 ; load_imm r1, 2 ; trap
        let program = assemble(&[&[51, 0x00, 1], &[51, 0x01, 2], &[0]], &[]);
        let mut pvm = Pvm::new(program, [0; 13], scratch_memory(), 0, 1);
        assert_eq!(pvm.run(&PvmConfig::default()), ExitReason::OutOfGas);
        assert_eq!(pvm.gas, 0);
        assert_eq!(pvm.pc, 3);
        assert_eq!(pvm.registers[0], 1);
    }

    #[test]
    fn block_mode_charges_once_per_block() {
        let program = assemble(&[&[51, 0x00, 1], &[51, 0x01, 2], &[0]], &[]);
        let cost = block_cost(&program, PvmConfig::default().cost_model.table(), 0);
        let mut pvm = Pvm::new(program, [0; 13], Memory::new(), 0, 100);
        assert_eq!(pvm.run(&PvmConfig::block_based()), ExitReason::Panic);
        assert_eq!(pvm.gas, 100 - cost);
        assert!(cost >= 1);
    }

    #[test]
    fn block_mode_out_of_gas_is_up_front() {
        let program = assemble(&[&[51, 0x00, 1], &[0]], &[]);
        let mut pvm = Pvm::new(program, [0; 13], Memory::new(), 0, 0);
        assert_eq!(pvm.run(&PvmConfig::block_based()), ExitReason::OutOfGas);
        assert_eq!(pvm.registers[0], 0);
        assert_eq!(pvm.pc, 0);
    }

    #[test]
    fn host_call_resumes_without_recharging_block() {
        // ecalli 1 ; load_imm r0, 5 ; trap
        let program = assemble(&[&[10, 1], &[51, 0x00, 5], &[0]], &[]);
        let mut pvm = Pvm::new(program, [0; 13], Memory::new(), 0, 100);
        let config = PvmConfig::block_based();
        assert_eq!(pvm.run(&config), ExitReason::HostCall(1));
        let after_first = pvm.gas;
        assert_eq!(pvm.run(&config), ExitReason::Panic);
        assert_eq!(pvm.gas, after_first);
        assert_eq!(pvm.registers[0], 5);
    }
}
