//! Operand decoding (Gray Paper A.5) and shared helpers for instruction handlers.

use crate::config::{MAX_SKIP, REGISTER_COUNT};

/// Operand layout of an opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    NoArgs,
    OneImmediate,
    RegisterExtendedImmediate,
    TwoImmediates,
    OneOffset,
    RegisterImmediate,
    RegisterTwoImmediates,
    RegisterImmediateOffset,
    TwoRegisters,
    TwoRegistersImmediate,
    TwoRegistersOffset,
    TwoRegistersTwoImmediates,
    ThreeRegisters,
}

/// Decoded operands. Register fields are indices (0..=12); immediates are sign-extended;
/// offsets are already resolved to absolute targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Args {
    None,
    Immediate { x: u64 },
    RegisterExtendedImmediate { a: usize, x: u64 },
    TwoImmediates { x: u64, y: u64 },
    Offset { target: u32 },
    RegisterImmediate { a: usize, x: u64 },
    RegisterTwoImmediates { a: usize, x: u64, y: u64 },
    RegisterImmediateOffset { a: usize, x: u64, target: u32 },
    TwoRegisters { d: usize, a: usize },
    TwoRegistersImmediate { a: usize, b: usize, x: u64 },
    TwoRegistersOffset { a: usize, b: usize, target: u32 },
    TwoRegistersTwoImmediates { a: usize, b: usize, x: u64, y: u64 },
    ThreeRegisters { a: usize, b: usize, d: usize },
}

/// Instruction bytes after the opcode, zero-extended past `skip` and the end of code.
#[derive(Clone, Copy, Debug)]
pub struct Operands {
    bytes: [u8; MAX_SKIP + 1],
    len: usize,
}

impl Operands {
    #[must_use]
    pub fn new(code: &[u8], pc: u32, skip: u32) -> Self {
        let mut bytes = [0u8; MAX_SKIP + 1];
        let start = (pc as usize).saturating_add(1);
        let end = start.saturating_add(skip as usize).min(code.len());
        if start < end {
            bytes[..end - start].copy_from_slice(&code[start..end]);
        }
        Self {
            bytes,
            len: skip as usize,
        }
    }

    fn byte(&self, index: usize) -> u8 {
        self.bytes.get(index).copied().unwrap_or(0)
    }

    /// Little-endian value of `length` bytes at `start`.
    fn le(&self, start: usize, length: usize) -> u64 {
        (0..length.min(8)).fold(0u64, |acc, i| acc | (u64::from(self.byte(start + i)) << (i * 8)))
    }

    /// X_n: sign-extended immediate of `length` (0..=4) bytes at `start`.
    fn immediate(&self, start: usize, length: usize) -> u64 {
        sign_extend(self.le(start, length), length)
    }

    fn offset(&self, pc: u32, start: usize, length: usize) -> u32 {
        (u64::from(pc).wrapping_add(self.immediate(start, length))) as u32
    }

    fn low_register(&self, index: usize) -> usize {
        register_index(self.byte(index) & 0x0f)
    }

    fn high_register(&self, index: usize) -> usize {
        register_index(self.byte(index) >> 4)
    }

    /// Decode operands of `shape` for the instruction at `pc`.
    #[must_use]
    pub fn decode(&self, shape: Shape, pc: u32) -> Args {
        let l = self.len;
        match shape {
            Shape::NoArgs => Args::None,
            Shape::OneImmediate => Args::Immediate {
                x: self.immediate(0, l.min(4)),
            },
            Shape::RegisterExtendedImmediate => Args::RegisterExtendedImmediate {
                a: self.low_register(0),
                x: self.le(1, 8),
            },
            Shape::TwoImmediates => {
                let lx = usize::from(self.byte(0) & 0x07).min(4);
                let ly = l.saturating_sub(lx + 1).min(4);
                Args::TwoImmediates {
                    x: self.immediate(1, lx),
                    y: self.immediate(1 + lx, ly),
                }
            }
            Shape::OneOffset => Args::Offset {
                target: self.offset(pc, 0, l.min(4)),
            },
            Shape::RegisterImmediate => Args::RegisterImmediate {
                a: self.low_register(0),
                x: self.immediate(1, l.saturating_sub(1).min(4)),
            },
            Shape::RegisterTwoImmediates | Shape::RegisterImmediateOffset => {
                let a = self.low_register(0);
                let lx = usize::from((self.byte(0) >> 4) & 0x07).min(4);
                let ly = l.saturating_sub(lx + 1).min(4);
                let x = self.immediate(1, lx);
                if shape == Shape::RegisterTwoImmediates {
                    Args::RegisterTwoImmediates {
                        a,
                        x,
                        y: self.immediate(1 + lx, ly),
                    }
                } else {
                    Args::RegisterImmediateOffset {
                        a,
                        x,
                        target: self.offset(pc, 1 + lx, ly),
                    }
                }
            }
            Shape::TwoRegisters => Args::TwoRegisters {
                d: self.low_register(0),
                a: self.high_register(0),
            },
            Shape::TwoRegistersImmediate => Args::TwoRegistersImmediate {
                a: self.low_register(0),
                b: self.high_register(0),
                x: self.immediate(1, l.saturating_sub(1).min(4)),
            },
            Shape::TwoRegistersOffset => Args::TwoRegistersOffset {
                a: self.low_register(0),
                b: self.high_register(0),
                target: self.offset(pc, 1, l.saturating_sub(1).min(4)),
            },
            Shape::TwoRegistersTwoImmediates => {
                let lx = usize::from(self.byte(1) & 0x07).min(4);
                let ly = l.saturating_sub(lx + 2).min(4);
                Args::TwoRegistersTwoImmediates {
                    a: self.low_register(0),
                    b: self.high_register(0),
                    x: self.immediate(2, lx),
                    y: self.immediate(2 + lx, ly),
                }
            }
            Shape::ThreeRegisters => Args::ThreeRegisters {
                a: self.low_register(0),
                b: self.high_register(0),
                d: register_index(self.byte(1)),
            },
        }
    }
}

/// min(12, n)
#[must_use]
pub fn register_index(n: u8) -> usize {
    usize::from(n).min(REGISTER_COUNT - 1)
}

/// X_n(x): sign-extend the low `octets` bytes of `value` to 64 bits.
#[must_use]
pub const fn sign_extend(value: u64, octets: usize) -> u64 {
    if octets == 0 {
        return 0;
    }
    if octets >= 8 {
        return value;
    }
    let bits = 8 * octets as u32;
    let shift = 64 - bits;
    (((value << shift) as i64) >> shift) as u64
}

/// X_4 of the low 32 bits.
#[must_use]
pub const fn sext32(value: u64) -> u64 {
    value as u32 as i32 as i64 as u64
}

/// Little-endian encoding of `value` in `size` bytes.
#[must_use]
pub fn value_to_bytes_le(value: u64, size: usize) -> Vec<u8> {
    value.to_le_bytes()[..size.min(8)].to_vec()
}

/// Little-endian decoding, no sign extension.
#[must_use]
pub fn bytes_to_value_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (i * 8)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_extension() {
        assert_eq!(sign_extend(0x80, 1), 0xffff_ffff_ffff_ff80);
        assert_eq!(sign_extend(0x7f, 1), 0x7f);
        assert_eq!(sign_extend(0x8000_0000, 4), 0xffff_ffff_8000_0000);
        assert_eq!(sign_extend(0xabc, 0), 0);
        assert_eq!(sext32(0x1_8000_0000), 0xffff_ffff_8000_0000);
    }

    #[test]
    fn registers_are_capped() {
        let ops = Operands::new(&[0, 0xfd, 15], 0, 2);
        assert_eq!(
            ops.decode(Shape::ThreeRegisters, 0),
            Args::ThreeRegisters { a: 12, b: 12, d: 12 }
        );
    }

    #[test]
    fn register_immediate_uses_remaining_length() {
        // load_imm r3, -1 (one immediate byte)
        let ops = Operands::new(&[51, 0x03, 0xff], 0, 2);
        assert_eq!(
            ops.decode(Shape::RegisterImmediate, 0),
            Args::RegisterImmediate { a: 3, x: u64::MAX }
        );
    }

    #[test]
    fn two_immediates_split_by_first_byte() {
        // lX = 2: x = 0x0102, y = 0x05
        let ops = Operands::new(&[30, 0x02, 0x02, 0x01, 0x05], 0, 4);
        assert_eq!(
            ops.decode(Shape::TwoImmediates, 0),
            Args::TwoImmediates { x: 0x0102, y: 5 }
        );
    }

    #[test]
    fn offsets_are_relative_to_pc() {
        // jump -2 from pc 10
        let mut code = vec![0u8; 12];
        code[10] = 40;
        code[11] = 0xfe;
        let ops = Operands::new(&code, 10, 1);
        assert_eq!(ops.decode(Shape::OneOffset, 10), Args::Offset { target: 8 });
    }

    #[test]
    fn operands_zero_extend_past_code() {
        let ops = Operands::new(&[20, 0x01, 0xaa], 0, 9);
        assert_eq!(
            ops.decode(Shape::RegisterExtendedImmediate, 0),
            Args::RegisterExtendedImmediate { a: 1, x: 0xaa }
        );
    }

    #[test]
    fn two_registers_two_immediates() {
        // rA = 1, rB = 2, lX = 1: x = 7, y = 0x10
        let ops = Operands::new(&[180, 0x21, 0x01, 0x07, 0x10], 0, 4);
        assert_eq!(
            ops.decode(Shape::TwoRegistersTwoImmediates, 0),
            Args::TwoRegistersTwoImmediates { a: 1, b: 2, x: 7, y: 0x10 }
        );
    }
}
