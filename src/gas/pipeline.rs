//! Basic-block cost from a simulated out-of-order pipeline (Gray Paper A.9).
//!
//! Each cycle decodes up to four slots worth of instructions into a reorder buffer of at
//! most 32 entries, dispatches up to five ready entries whose producers have finished and
//! whose units are free, advances executing entries, then retires finished entries from the
//! head. The block costs `max(cycles - 3, 1)`.

use std::collections::VecDeque;

use crate::config::REGISTER_COUNT;
use crate::gas::{register_usage, Resource, ResourceTable, Units};
use crate::instructions::{decode, Opcode};
use crate::parser::Program;
use crate::types::Gas;

const DECODE_WIDTH: u32 = 4;
const EXECUTION_WIDTH: u32 = 5;
const MAX_ROB: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    /// Decoded this cycle; eligible for dispatch from the next one.
    Decoded,
    Pending,
    Executing,
    Finished,
}

#[derive(Clone, Debug)]
struct Entry {
    id: usize,
    stage: Stage,
    remaining: u32,
    units: Units,
    /// Ids of the entries producing this entry's operands.
    producers: Vec<usize>,
}

/// Simulation state for one basic block.
#[derive(Debug)]
pub struct BlockState<'a> {
    program: &'a Program,
    table: &'a dyn ResourceTable,
    /// Next pc to decode.
    pc: u32,
    cycles: u64,
    decode_slots: u32,
    execution_slots: u32,
    units: Units,
    rob: VecDeque<Entry>,
    /// Id of the next ROB entry; ids are never reused.
    next_id: usize,
    /// Latest in-flight producer of each register.
    producers: [Option<usize>; REGISTER_COUNT],
    ended: bool,
}

impl<'a> BlockState<'a> {
    #[must_use]
    pub fn new(program: &'a Program, table: &'a dyn ResourceTable, start: u32) -> Self {
        Self {
            program,
            table,
            pc: start,
            cycles: 0,
            decode_slots: DECODE_WIDTH,
            execution_slots: EXECUTION_WIDTH,
            units: Units::AVAILABLE,
            rob: VecDeque::with_capacity(MAX_ROB),
            next_id: 0,
            producers: [None; REGISTER_COUNT],
            ended: false,
        }
    }

    /// Run the simulation to completion and return the block cost.
    pub fn simulate(mut self) -> Gas {
        loop {
            self.decode_cycle();
            self.dispatch();
            self.advance();
            self.retire();
            if self.ended && self.rob.is_empty() {
                return self.cycles.saturating_sub(3).max(1);
            }
        }
    }

    fn decode_cycle(&mut self) {
        while !self.ended && self.rob.len() < MAX_ROB {
            let instruction = decode(self.program, self.pc);
            let opcode = instruction.map_or(Opcode::Trap, |i| i.opcode);
            let resource = capped(self.table.resource(opcode));
            if resource.decode_slots > self.decode_slots {
                break;
            }
            self.decode_slots -= resource.decode_slots;

            let skip = instruction.map_or_else(|| self.program.skip(self.pc), |i| i.skip);
            let next = self.pc.wrapping_add(skip + 1);
            if instruction.map_or(true, |i| i.opcode.is_terminator())
                || next as usize >= self.program.code.len()
            {
                self.ended = true;
            }
            self.pc = next;

            let usage = instruction.map(|i| register_usage(&i)).unwrap_or_default();
            if opcode == Opcode::MoveReg {
                // Renamed, never enters the ROB.
                if let (Some(&d), Some(&a)) = (usage.writes.first(), usage.reads.first()) {
                    self.producers[d] = self.producers[a];
                }
                continue;
            }

            let id = self.next_id;
            self.next_id += 1;
            let producers = usage
                .reads
                .iter()
                .filter_map(|&r| self.producers[r])
                .collect();
            for &w in &usage.writes {
                self.producers[w] = Some(id);
            }
            self.rob.push_back(Entry {
                id,
                stage: Stage::Decoded,
                remaining: resource.cycles.max(1),
                units: resource.units,
                producers,
            });
        }
    }

    fn is_finished(&self, id: usize) -> bool {
        match self.rob.front() {
            Some(head) if id >= head.id => self
                .rob
                .get(id - head.id)
                .map_or(true, |entry| entry.stage == Stage::Finished),
            // Already retired.
            _ => true,
        }
    }

    fn dispatch(&mut self) {
        for index in 0..self.rob.len() {
            if self.execution_slots == 0 {
                break;
            }
            let entry = &self.rob[index];
            if entry.stage != Stage::Pending || !entry.units.fits_in(&self.units) {
                continue;
            }
            if !entry.producers.iter().all(|&p| self.is_finished(p)) {
                continue;
            }
            let units = entry.units;
            self.units.take(&units);
            self.execution_slots -= 1;
            self.rob[index].stage = Stage::Executing;
        }
    }

    fn advance(&mut self) {
        for entry in &mut self.rob {
            match entry.stage {
                Stage::Decoded => entry.stage = Stage::Pending,
                Stage::Executing => {
                    entry.remaining -= 1;
                    if entry.remaining == 0 {
                        entry.stage = Stage::Finished;
                        self.units.release(&entry.units);
                    }
                }
                Stage::Pending | Stage::Finished => {}
            }
        }
        self.cycles += 1;
        self.decode_slots = DECODE_WIDTH;
        self.execution_slots = EXECUTION_WIDTH;
    }

    fn retire(&mut self) {
        while self
            .rob
            .front()
            .is_some_and(|entry| entry.stage == Stage::Finished)
        {
            self.rob.pop_front();
        }
    }
}

/// Clamp a table entry so it can always be decoded and dispatched within one cycle.
fn capped(resource: Resource) -> Resource {
    Resource {
        cycles: resource.cycles,
        decode_slots: resource.decode_slots.min(DECODE_WIDTH),
        units: resource.units.capped(&Units::AVAILABLE),
    }
}

/// Cost of the basic block starting at `start`.
#[must_use]
pub fn block_cost(program: &Program, table: &dyn ResourceTable, start: u32) -> Gas {
    BlockState::new(program, table, start).simulate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::V1Table;
    use crate::instructions::test_support::assemble;

    #[test]
    fn single_trap_costs_at_least_one() {
        let program = assemble(&[&[0]], &[]);
        assert_eq!(block_cost(&program, &V1Table, 0), 1);
    }

    #[test]
    fn independent_instructions_overlap() {
        // Eight independent load_imm then trap.
        let mut instructions: Vec<Vec<u8>> = (0..8u8).map(|r| vec![51, r, 1]).collect();
        instructions.push(vec![0]);
        let slices: Vec<&[u8]> = instructions.iter().map(Vec::as_slice).collect();
        let program = assemble(&slices, &[]);
        let cost = block_cost(&program, &V1Table, 0);
        // Serial execution would take more than one cycle per instruction.
        assert!(cost >= 1 && cost < 9, "cost {cost}");
    }

    #[test]
    fn dependency_chain_is_not_cheaper_than_independent_work() {
        // r0 = r0 + r0 repeated (chain) vs r0..r7 = r8 + r8 (independent).
        let chain: Vec<Vec<u8>> = (0..8).map(|_| vec![200, 0x00, 0]).collect();
        let spread: Vec<Vec<u8>> = (0..8u8).map(|d| vec![200, 0x88, d]).collect();
        let cost = |instructions: &[Vec<u8>]| {
            let mut all = instructions.to_vec();
            all.push(vec![0]);
            let slices: Vec<&[u8]> = all.iter().map(Vec::as_slice).collect();
            block_cost(&assemble(&slices, &[]), &V1Table, 0)
        };
        assert!(cost(&chain) > cost(&spread));
    }

    #[test]
    fn block_ends_at_code_end() {
        // No terminator: the simulation still stops at the end of the code.
        let program = assemble(&[&[51, 0, 1]], &[]);
        assert!(block_cost(&program, &V1Table, 0) >= 1);
    }

    #[derive(Debug)]
    struct Oversized;

    impl ResourceTable for Oversized {
        fn resource(&self, _opcode: Opcode) -> Resource {
            Resource {
                cycles: 3,
                decode_slots: 9,
                units: Units {
                    alu: 7,
                    mul: 2,
                    ..Units::default()
                },
            }
        }
    }

    #[test]
    fn oversized_table_entries_still_finish() {
        let program = assemble(&[&[51, 0, 1], &[51, 1, 2], &[0]], &[]);
        let cost = block_cost(&program, &Oversized, 0);
        // Three serialized entries of three cycles each.
        assert!(cost >= 3, "cost {cost}");
    }

    #[test]
    fn move_reg_block_terminates() {
        let program = assemble(&[&[100, 0x10], &[100, 0x21], &[1]], &[]);
        assert!(block_cost(&program, &V1Table, 0) >= 1);
    }
}
