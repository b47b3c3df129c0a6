//! Gas accounting: per-instruction billing and block-based billing from the pipeline simulator.

pub mod pipeline;

use crate::config::CostModel;
use crate::instructions::base::Args;
use crate::instructions::{Instruction, Opcode};
use crate::types::Gas;

pub use pipeline::{block_cost, BlockState};

/// Execution units an instruction occupies while it executes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Units {
    pub alu: u32,
    pub load: u32,
    pub store: u32,
    pub mul: u32,
    pub div: u32,
}

impl Units {
    /// Units available at the start of every cycle.
    pub const AVAILABLE: Self = Self {
        alu: 4,
        load: 4,
        store: 4,
        mul: 1,
        div: 1,
    };

    #[must_use]
    pub const fn fits_in(&self, available: &Self) -> bool {
        self.alu <= available.alu
            && self.load <= available.load
            && self.store <= available.store
            && self.mul <= available.mul
            && self.div <= available.div
    }

    /// Each count capped at the matching count in `limit`.
    #[must_use]
    pub fn capped(&self, limit: &Self) -> Self {
        Self {
            alu: self.alu.min(limit.alu),
            load: self.load.min(limit.load),
            store: self.store.min(limit.store),
            mul: self.mul.min(limit.mul),
            div: self.div.min(limit.div),
        }
    }

    pub fn take(&mut self, used: &Self) {
        self.alu -= used.alu;
        self.load -= used.load;
        self.store -= used.store;
        self.mul -= used.mul;
        self.div -= used.div;
    }

    pub fn release(&mut self, used: &Self) {
        self.alu += used.alu;
        self.load += used.load;
        self.store += used.store;
        self.mul += used.mul;
        self.div += used.div;
    }
}

/// Per-opcode pipeline cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resource {
    /// Cycles spent executing once dispatched.
    pub cycles: u32,
    /// Decode slots consumed (of 4 per cycle).
    pub decode_slots: u32,
    pub units: Units,
}

/// Source of per-opcode resources. Requests beyond one cycle's decode width or beyond
/// [`Units::AVAILABLE`] are capped by the simulator.
pub trait ResourceTable: std::fmt::Debug + Send + Sync {
    fn resource(&self, opcode: Opcode) -> Resource;
}

/// Baseline table: trap and fallthrough cost two cycles and two decode slots, everything
/// else one of each. All instructions occupy one ALU.
#[derive(Clone, Copy, Debug, Default)]
pub struct V1Table;

impl ResourceTable for V1Table {
    fn resource(&self, opcode: Opcode) -> Resource {
        let units = Units {
            alu: 1,
            ..Units::default()
        };
        match opcode {
            Opcode::Trap | Opcode::Fallthrough => Resource {
                cycles: 2,
                decode_slots: 2,
                units,
            },
            _ => Resource {
                cycles: 1,
                decode_slots: 1,
                units,
            },
        }
    }
}

static V1: V1Table = V1Table;

impl CostModel {
    #[must_use]
    pub fn table(self) -> &'static dyn ResourceTable {
        match self {
            Self::V1 => &V1,
        }
    }
}

/// Deduct `cost` if it fits. On failure the counter is left untouched.
#[must_use]
pub fn charge(gas: &mut Gas, cost: Gas) -> bool {
    match gas.checked_sub(cost) {
        Some(remaining) => {
            *gas = remaining;
            true
        }
        None => false,
    }
}

/// Registers an instruction reads and writes, for hazard tracking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterUsage {
    pub reads: Vec<usize>,
    pub writes: Vec<usize>,
}

impl RegisterUsage {
    fn new(reads: &[usize], writes: &[usize]) -> Self {
        Self {
            reads: reads.to_vec(),
            writes: writes.to_vec(),
        }
    }
}

/// Read/write sets of a decoded instruction.
#[must_use]
pub fn register_usage(instruction: &Instruction) -> RegisterUsage {
    use Opcode as O;

    let op = instruction.opcode;
    match instruction.args {
        Args::None | Args::Immediate { .. } | Args::TwoImmediates { .. } | Args::Offset { .. } => {
            RegisterUsage::default()
        }
        Args::RegisterExtendedImmediate { a, .. } => RegisterUsage::new(&[], &[a]),
        Args::RegisterImmediate { a, .. } => match op {
            O::JumpInd | O::StoreU8 | O::StoreU16 | O::StoreU32 | O::StoreU64 => {
                RegisterUsage::new(&[a], &[])
            }
            _ => RegisterUsage::new(&[], &[a]),
        },
        Args::RegisterTwoImmediates { a, .. } => RegisterUsage::new(&[a], &[]),
        Args::RegisterImmediateOffset { a, .. } => match op {
            O::LoadImmJump => RegisterUsage::new(&[], &[a]),
            _ => RegisterUsage::new(&[a], &[]),
        },
        Args::TwoRegisters { d, a } => RegisterUsage::new(&[a], &[d]),
        Args::TwoRegistersImmediate { a, b, .. } => match op {
            O::StoreIndU8 | O::StoreIndU16 | O::StoreIndU32 | O::StoreIndU64 => {
                RegisterUsage::new(&[a, b], &[])
            }
            O::CmovIzImm | O::CmovNzImm => RegisterUsage::new(&[a, b], &[a]),
            _ => RegisterUsage::new(&[b], &[a]),
        },
        Args::TwoRegistersOffset { a, b, .. } => RegisterUsage::new(&[a, b], &[]),
        Args::TwoRegistersTwoImmediates { a, b, .. } => RegisterUsage::new(&[b], &[a]),
        Args::ThreeRegisters { a, b, d } => match op {
            O::CmovIz | O::CmovNz => RegisterUsage::new(&[a, b, d], &[d]),
            _ => RegisterUsage::new(&[a, b], &[d]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::decode;
    use crate::instructions::test_support::assemble;

    #[test]
    fn charge_is_all_or_nothing() {
        let mut gas = 5;
        assert!(!charge(&mut gas, 6));
        assert_eq!(gas, 5);
        assert!(charge(&mut gas, 5));
        assert_eq!(gas, 0);
    }

    #[test]
    fn v1_table() {
        let table = CostModel::V1.table();
        assert_eq!(table.resource(Opcode::Trap).cycles, 2);
        assert_eq!(table.resource(Opcode::Add64).decode_slots, 1);
        assert!(table.resource(Opcode::DivU64).units.fits_in(&Units::AVAILABLE));
    }

    #[test]
    fn usage_of_stores_and_loads() {
        // store_ind_u8 [r1] = r0 ; load_ind_u8 r2 = [r1]
        let program = assemble(&[&[120, 0x10], &[124, 0x12]], &[]);
        let store = decode(&program, 0).map(|i| register_usage(&i));
        assert_eq!(store, Some(RegisterUsage::new(&[0, 1], &[])));
        let load = decode(&program, 2).map(|i| register_usage(&i));
        assert_eq!(load, Some(RegisterUsage::new(&[1], &[2])));
    }
}
