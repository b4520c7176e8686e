//! Wire constants shared by the encoder and decoder.

/// Largest byte value emitted as a literal code unit.
pub const MAX_LITERAL: u8 = 0x7F;

/// Opcode: dictionary reference, followed by a big-endian `u16` index.
pub const OP_DICT_REF: u8 = 0x80;

/// Opcode: raw UTF-16 code unit, followed by the big-endian unit.
pub const OP_RAW_UNIT: u8 = 0x81;

/// Byte length of a reference or raw-unit token.
pub const WIDE_TOKEN_LEN: usize = 3;

/// Hard ceiling on dictionary size: every index must fit in 16 bits.
pub const MAX_DICT_ENTRIES: usize = 65_535;

/// One decoded wire token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A code unit below 128, stored as itself.
    Literal(u8),
    /// A reference to dictionary entry `index`.
    DictRef(u16),
    /// An arbitrary code unit carried in three bytes.
    RawUnit(u16),
}

impl Token {
    /// Append the wire form of this token.
    pub fn write_to(self, out: &mut Vec<u8>) {
        match self {
            Self::Literal(b) => out.push(b),
            Self::DictRef(index) => {
                let [hi, lo] = index.to_be_bytes();
                out.extend_from_slice(&[OP_DICT_REF, hi, lo]);
            }
            Self::RawUnit(unit) => {
                let [hi, lo] = unit.to_be_bytes();
                out.extend_from_slice(&[OP_RAW_UNIT, hi, lo]);
            }
        }
    }

    /// Token for a single code unit that did not match the dictionary.
    #[must_use]
    pub fn for_unit(unit: u16) -> Self {
        match u8::try_from(unit) {
            Ok(b) if b <= MAX_LITERAL => Self::Literal(b),
            _ => Self::RawUnit(unit),
        }
    }
}
