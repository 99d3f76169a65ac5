// disasm.rs — Instruction decoding for compiled programs
//
// Splits a byte stream back into instructions using the operand layouts in
// `opcode`, and renders a listing for `--emit asm`.

use std::fmt;

use crate::error::DecodeError;
use crate::opcode::{OperandLayout, Opcode, UNCONNECTED};

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: Opcode,
    pub operands: Vec<u8>,
}

impl Instruction {
    /// Encoded length including the opcode byte.
    pub fn encoded_len(&self) -> usize {
        1 + self.operands.len()
    }
}

fn word(lo: u8, hi: u8) -> u16 {
    u16::from_le_bytes([lo, hi])
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}  {:<19} ", self.offset, self.opcode.mnemonic())?;
        let o = &self.operands;
        match self.opcode {
            Opcode::SetPinModeInput | Opcode::SetPinModeOutput => write!(f, "pin {}", o[0]),
            Opcode::ReadPin | Opcode::ReadAnalogPin => write!(f, "pin {} -> v{}", o[0], o[1]),
            Opcode::WritePin | Opcode::WriteAnalogPin => write!(f, "v{} -> pin {}", o[1], o[0]),
            Opcode::Not => write!(f, "v{} -> v{}", o[0], o[1]),
            Opcode::And | Opcode::Or | Opcode::Nand | Opcode::Nor | Opcode::Xor => {
                let n = o[0] as usize;
                let inputs: Vec<String> = o[1..=n].iter().map(|s| format!("v{s}")).collect();
                write!(f, "{} -> v{}", inputs.join(" "), o[n + 1])
            }
            Opcode::Latch => write!(
                f,
                "set v{} reset v{} -> v{} init {}",
                o[0], o[1], o[2], o[3]
            ),
            Opcode::Pulse => write!(
                f,
                "-> v{} pulse {}ms every {}ms",
                o[0],
                word(o[1], o[2]),
                word(o[3], o[4])
            ),
            Opcode::Toggle => write!(f, "v{} -> v{} init {}", o[0], o[1], o[2]),
            Opcode::AnalogRange => write!(
                f,
                "v{} in [{}, {}] -> v{}",
                o[0],
                word(o[1], o[2]),
                word(o[3], o[4]),
                o[5]
            ),
            Opcode::CompareGt
            | Opcode::CompareGe
            | Opcode::CompareLt
            | Opcode::CompareLe
            | Opcode::CompareEq
            | Opcode::CompareNe => write!(f, "v{} v{} -> v{}", o[0], o[1], o[2]),
            Opcode::ShiftRegister => {
                let reset = if o[2] == UNCONNECTED {
                    "-".to_string()
                } else {
                    format!("v{}", o[2])
                };
                write!(
                    f,
                    "data v{} clock v{} reset {} width {} init {} -> v{}",
                    o[0], o[1], reset, o[3], o[4], o[5]
                )
            }
            Opcode::Delay => write!(f, "v{} -> v{} {}ms", o[0], o[1], word(o[2], o[3])),
        }
    }
}

/// Decode every instruction in `bytes`.
pub fn disassemble(bytes: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let byte = bytes[offset];
        let opcode = Opcode::from_byte(byte).ok_or(DecodeError::UnknownOpcode {
            offset,
            opcode: byte,
        })?;
        let rest = &bytes[offset + 1..];
        let needed = match opcode.layout() {
            OperandLayout::Fixed(n) => n,
            OperandLayout::CountPrefixed => match rest.first() {
                Some(&count) => count as usize + 2,
                None => 1,
            },
        };
        if rest.len() < needed {
            return Err(DecodeError::Truncated {
                offset,
                mnemonic: opcode.mnemonic(),
                needed,
                available: rest.len(),
            });
        }
        out.push(Instruction {
            offset,
            opcode,
            operands: rest[..needed].to_vec(),
        });
        offset += 1 + needed;
    }
    Ok(out)
}

/// One instruction per line.
pub fn listing(instructions: &[Instruction]) -> String {
    let mut s = String::new();
    for inst in instructions {
        s.push_str(&inst.to_string());
        s.push('\n');
    }
    s
}
