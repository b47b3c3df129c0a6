//! Standard program initialization (Gray Paper A.7, function Y).
//!
//! Image: E3(|o|) ‖ E3(|w|) ‖ E2(z) ‖ E3(s) ‖ o ‖ w ‖ E4(|c|) ‖ c.

use crate::codec::decode_fixed_length;
use crate::config::{
    align_to_page, align_to_zone, ARGS_SEGMENT_START, HALT_ADDRESS, INIT_INPUT_SIZE, PAGE_SIZE,
    STACK_SEGMENT_END, ZONE_SIZE,
};
use crate::error::ProgramError;
use crate::parser::Program;
use crate::ram::{Memory, PageAccess};
use crate::types::Registers;

/// Program, memory and registers ready to run from pc 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandardProgram {
    pub program: Program,
    pub memory: Memory,
    pub registers: Registers,
}

/// Cursor over the image; each read reports what was truncated.
struct ImageReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ImageReader<'a> {
    fn number(&mut self, length: usize, what: &'static str) -> Result<u64, ProgramError> {
        let rest = self.data.get(self.offset..).unwrap_or_default();
        let decoded = decode_fixed_length(rest, length).ok_or(ProgramError::Truncated(what))?;
        self.offset += decoded.consumed;
        Ok(decoded.value)
    }

    fn bytes(&mut self, length: u64, what: &'static str) -> Result<&'a [u8], ProgramError> {
        let end = usize::try_from(length)
            .ok()
            .and_then(|len| self.offset.checked_add(len))
            .filter(|&end| end <= self.data.len())
            .ok_or(ProgramError::Truncated(what))?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }
}

/// Y(p, a): lay out memory and registers for `image` with `argument`.
pub fn standard_initialize(image: &[u8], argument: &[u8]) -> Result<StandardProgram, ProgramError> {
    let mut reader = ImageReader { data: image, offset: 0 };
    let ro_length = reader.number(3, "read-only length")?;
    let rw_length = reader.number(3, "read-write length")?;
    let heap_pages = reader.number(2, "heap pages")?;
    let stack_size = reader.number(3, "stack size")?;
    let ro_data = reader.bytes(ro_length, "read-only data")?;
    let rw_data = reader.bytes(rw_length, "read-write data")?;
    let code_length = reader.number(4, "code length")?;
    let code = reader.bytes(code_length, "code")?;
    if reader.offset != image.len() {
        return Err(ProgramError::TrailingBytes(image.len() - reader.offset));
    }

    let zone = u64::from(ZONE_SIZE);
    let page = u64::from(PAGE_SIZE);
    let input = u64::from(INIT_INPUT_SIZE);
    let rw_extent = rw_length + heap_pages * page;
    let total = 5 * zone
        + align_to_zone(ro_length)
        + align_to_zone(rw_extent)
        + align_to_zone(stack_size)
        + input;
    if total > 1 << 32 {
        return Err(ProgramError::AddressSpaceExceeded);
    }
    if argument.len() as u64 > input {
        return Err(ProgramError::ArgumentTooLarge(argument.len()));
    }

    let program = Program::deblob(code)?;

    let mut memory = Memory::new();
    let ro_start = zone;
    memory.allocate_segment(ro_start, ro_start + align_to_page(ro_length), ro_data, PageAccess::ReadOnly);

    let rw_start = 2 * zone + align_to_zone(ro_length);
    let rw_end = rw_start + align_to_page(rw_length) + heap_pages * page;
    memory.allocate_segment(rw_start, rw_end, rw_data, PageAccess::ReadWrite);
    memory.allocate_segment(rw_end, rw_end + page, &[], PageAccess::ReadWrite);
    memory.set_heap_pointer(rw_end);

    let stack_end = u64::from(STACK_SEGMENT_END);
    memory.allocate_segment(stack_end - align_to_page(stack_size), stack_end, &[], PageAccess::ReadWrite);

    let args_start = u64::from(ARGS_SEGMENT_START);
    memory.allocate_segment(
        args_start,
        args_start + u64::from(INIT_INPUT_SIZE),
        argument,
        PageAccess::ReadOnly,
    );

    let mut registers: Registers = [0; 13];
    registers[0] = u64::from(HALT_ADDRESS);
    registers[1] = stack_end;
    registers[7] = args_start;
    registers[8] = argument.len() as u64;

    Ok(StandardProgram {
        program,
        memory,
        registers,
    })
}

/// Build a standard image from its parts. Inverse of the header parsing above.
#[must_use]
pub fn encode_standard_image(
    ro_data: &[u8],
    rw_data: &[u8],
    heap_pages: u16,
    stack_size: u32,
    code_blob: &[u8],
) -> Vec<u8> {
    use crate::codec::encode_fixed_length;
    let mut image = Vec::with_capacity(15 + ro_data.len() + rw_data.len() + code_blob.len());
    image.extend_from_slice(&encode_fixed_length(ro_data.len() as u64, 3));
    image.extend_from_slice(&encode_fixed_length(rw_data.len() as u64, 3));
    image.extend_from_slice(&heap_pages.to_le_bytes());
    image.extend_from_slice(&encode_fixed_length(u64::from(stack_size), 3));
    image.extend_from_slice(ro_data);
    image.extend_from_slice(rw_data);
    image.extend_from_slice(&(code_blob.len() as u32).to_le_bytes());
    image.extend_from_slice(code_blob);
    image
}
