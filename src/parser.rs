//! Program blob parser (Gray Paper A.2, deblob). Code, instruction bitmask, basic blocks and jump table.

use crate::codec::{decode_natural, encode_natural};
use crate::config::MAX_SKIP;
use crate::error::ProgramError;
use crate::instructions::is_terminator;

/// Bitmask tag: instruction starts here.
pub const INSTRUCTION_START: u8 = 1;
/// Bitmask tag: basic block starts here.
pub const BLOCK_START: u8 = 2;

/// Deblobbed program. `bitmask[i]` holds the tags for `code[i]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub code: Vec<u8>,
    pub bitmask: Vec<u8>,
    /// Raw jump table bytes, `jump_table_entries * jump_table_width` long.
    pub jump_table: Vec<u8>,
    pub jump_table_entries: u32,
    pub jump_table_width: u8,
}

impl Program {
    /// Build from code, instruction-start flags and jump targets. Block starts are derived.
    #[must_use]
    pub fn new(code: Vec<u8>, instruction_starts: &[bool], jump_targets: &[u32], width: u8) -> Self {
        let mut bitmask: Vec<u8> = (0..code.len())
            .map(|i| {
                if instruction_starts.get(i).copied().unwrap_or(false) {
                    INSTRUCTION_START
                } else {
                    0
                }
            })
            .collect();
        mark_block_starts(&code, &mut bitmask);
        let mut jump_table = Vec::with_capacity(jump_targets.len() * usize::from(width));
        for target in jump_targets {
            jump_table.extend_from_slice(&target.to_le_bytes()[..usize::from(width).min(4)]);
            jump_table.resize(jump_table.len() + usize::from(width).saturating_sub(4), 0);
        }
        Self {
            code,
            bitmask,
            jump_table,
            jump_table_entries: jump_targets.len() as u32,
            jump_table_width: width,
        }
    }

    /// deblob: natural(|j|) ‖ E1(z) ‖ natural(|c|) ‖ j ‖ c ‖ k, with k exactly ceil(|c|/8) bytes.
    pub fn deblob(blob: &[u8]) -> Result<Self, ProgramError> {
        let entries = decode_natural(blob).ok_or(ProgramError::Truncated("jump table length"))?;
        let mut offset = entries.consumed;
        let width = *blob.get(offset).ok_or(ProgramError::Truncated("jump table width"))?;
        offset += 1;
        let code_length = decode_natural(&blob[offset..])
            .ok_or(ProgramError::Truncated("code length"))?;
        offset += code_length.consumed;

        let table_bytes = entries
            .value
            .checked_mul(u64::from(width))
            .filter(|&n| n < 1 << 32)
            .ok_or(ProgramError::JumpTableTooLarge {
                entries: entries.value,
                width,
            })?;
        let table_end = offset
            .checked_add(table_bytes as usize)
            .filter(|&end| end <= blob.len())
            .ok_or(ProgramError::Truncated("jump table"))?;
        let jump_table = blob[offset..table_end].to_vec();
        offset = table_end;

        let code_len = usize::try_from(code_length.value)
            .map_err(|_| ProgramError::Truncated("code"))?;
        let code_end = offset
            .checked_add(code_len)
            .filter(|&end| end <= blob.len())
            .ok_or(ProgramError::Truncated("code"))?;
        let code = blob[offset..code_end].to_vec();
        offset = code_end;

        let expected = code_len.div_ceil(8);
        let actual = blob.len() - offset;
        if actual != expected {
            return Err(ProgramError::BitmaskLength { expected, actual });
        }
        let packed = &blob[offset..];
        let mut bitmask: Vec<u8> = (0..code_len)
            .map(|i| (packed[i / 8] >> (i % 8)) & 1)
            .collect();
        mark_block_starts(&code, &mut bitmask);

        Ok(Self {
            code,
            bitmask,
            jump_table,
            jump_table_entries: entries.value as u32,
            jump_table_width: width,
        })
    }

    /// Inverse of [`Program::deblob`].
    #[must_use]
    pub fn to_blob(&self) -> Vec<u8> {
        let mut blob = encode_natural(u64::from(self.jump_table_entries));
        blob.push(self.jump_table_width);
        blob.extend_from_slice(&encode_natural(self.code.len() as u64));
        blob.extend_from_slice(&self.jump_table);
        blob.extend_from_slice(&self.code);
        let mut packed = vec![0u8; self.code.len().div_ceil(8)];
        for (i, tags) in self.bitmask.iter().enumerate() {
            if tags & INSTRUCTION_START != 0 {
                packed[i / 8] |= 1 << (i % 8);
            }
        }
        blob.extend_from_slice(&packed);
        blob
    }

    #[must_use]
    pub fn is_instruction_start(&self, pc: u32) -> bool {
        self.bitmask
            .get(pc as usize)
            .is_some_and(|tags| tags & INSTRUCTION_START != 0)
    }

    #[must_use]
    pub fn is_block_start(&self, pc: u32) -> bool {
        self.bitmask
            .get(pc as usize)
            .is_some_and(|tags| tags & BLOCK_START != 0)
    }

    /// Fskip(i): octets to the next instruction start minus one, capped at 24.
    /// Positions past the end of the code count as instruction starts.
    #[must_use]
    pub fn skip(&self, pc: u32) -> u32 {
        let pc = pc as usize;
        (1..=MAX_SKIP)
            .find(|j| {
                self.bitmask
                    .get(pc + j)
                    .map_or(true, |tags| tags & INSTRUCTION_START != 0)
            })
            .map_or(MAX_SKIP as u32, |j| (j - 1) as u32)
    }

    /// Entry `index` of the jump table, little-endian over `width` bytes.
    #[must_use]
    pub fn jump_target(&self, index: u64) -> Option<u32> {
        if index >= u64::from(self.jump_table_entries) {
            return None;
        }
        let width = usize::from(self.jump_table_width);
        let start = usize::try_from(index).ok()?.checked_mul(width)?;
        let bytes = self.jump_table.get(start..start + width)?;
        let value = bytes
            .iter()
            .take(8)
            .enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (i * 8)));
        u32::try_from(value).ok()
    }

    /// Instruction starts in code order.
    pub fn instruction_starts(&self) -> impl Iterator<Item = u32> + '_ {
        self.bitmask
            .iter()
            .enumerate()
            .filter(|(_, tags)| *tags & INSTRUCTION_START != 0)
            .map(|(i, _)| i as u32)
    }
}

/// Block starts: index 0, and every instruction start whose predecessor is a terminator.
fn mark_block_starts(code: &[u8], bitmask: &mut [u8]) {
    if let Some(first) = bitmask.first_mut() {
        *first |= BLOCK_START;
    }
    let mut previous_terminates = false;
    for i in 0..bitmask.len() {
        if bitmask[i] & INSTRUCTION_START == 0 {
            continue;
        }
        if previous_terminates {
            bitmask[i] |= BLOCK_START;
        }
        previous_terminates = code.get(i).copied().is_some_and(is_terminator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // load_imm r0, 5 ; jump +3 ; trap ; fallthrough
    const CODE: [u8; 7] = [51, 0x00, 5, 40, 3, 0, 1];
    const STARTS: [bool; 7] = [true, false, false, true, false, true, true];

    fn sample(width: u8) -> Program {
        Program::new(CODE.to_vec(), &STARTS, &[3, 5, 1000], width)
    }

    #[test]
    fn deblob_round_trip_width_one_and_two() {
        for width in [1u8, 2] {
            let program = Program::new(CODE.to_vec(), &STARTS, &[3, 5, 6], width);
            let blob = program.to_blob();
            assert_eq!(Program::deblob(&blob), Ok(program));
        }
    }

    #[test]
    fn block_starts_follow_terminators() {
        let program = sample(2);
        assert!(program.is_block_start(0));
        assert!(!program.is_block_start(3));
        assert!(program.is_block_start(5));
        assert!(program.is_block_start(6));
        assert!(!program.is_block_start(1));
    }

    #[test]
    fn skip_counts_to_next_start() {
        let program = sample(2);
        assert_eq!(program.skip(0), 2);
        assert_eq!(program.skip(3), 1);
        assert_eq!(program.skip(6), 0);
    }

    #[test]
    fn skip_is_capped() {
        let mut starts = vec![false; 40];
        starts[0] = true;
        let program = Program::new(vec![0; 40], &starts, &[], 0);
        assert_eq!(program.skip(0), 24);
    }

    #[test]
    fn jump_targets_read_little_endian() {
        let program = sample(2);
        assert_eq!(program.jump_target(0), Some(3));
        assert_eq!(program.jump_target(2), Some(1000));
        assert_eq!(program.jump_target(3), None);
    }

    #[test]
    fn deblob_rejects_bad_bitmask_length() {
        let mut blob = sample(1).to_blob();
        blob.push(0);
        assert_eq!(
            Program::deblob(&blob),
            Err(ProgramError::BitmaskLength { expected: 1, actual: 2 })
        );
    }

    #[test]
    fn deblob_rejects_truncation() {
        let blob = sample(2).to_blob();
        assert!(Program::deblob(&blob[..blob.len() - 2]).is_err());
        assert_eq!(Program::deblob(&[]), Err(ProgramError::Truncated("jump table length")));
    }

    #[test]
    fn deblob_rejects_oversized_jump_table() {
        let mut blob = encode_natural(1 << 31);
        blob.push(2);
        blob.push(0);
        assert_eq!(
            Program::deblob(&blob),
            Err(ProgramError::JumpTableTooLarge { entries: 1 << 31, width: 2 })
        );
    }
}
