// opcode.rs — Virtual machine instruction set
//
// Opcode numbering is a wire contract with the firmware interpreter and must
// never change. Operand layouts are described by `OperandLayout` so that the
// emitter and the disassembler agree on instruction lengths.

use crate::graph::{Comparator, GateOp};

/// Operand value meaning "input not connected" (shift-register reset).
pub const UNCONNECTED: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    SetPinModeInput = 1,
    SetPinModeOutput = 2,
    ReadPin = 3,
    WritePin = 4,
    ReadAnalogPin = 5,
    WriteAnalogPin = 6,
    Not = 10,
    And = 11,
    Or = 12,
    Nand = 13,
    Nor = 14,
    Xor = 15,
    Latch = 16,
    Pulse = 17,
    Toggle = 18,
    AnalogRange = 19,
    CompareGt = 20,
    CompareGe = 21,
    CompareLt = 22,
    CompareLe = 23,
    CompareEq = 24,
    CompareNe = 25,
    ShiftRegister = 26,
    Delay = 30,
}

/// How many operand bytes follow an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandLayout {
    Fixed(usize),
    /// Count byte `n`, then `n` inputs, then the output slot.
    CountPrefixed,
}

impl Opcode {
    pub const ALL: [Opcode; 24] = [
        Opcode::SetPinModeInput,
        Opcode::SetPinModeOutput,
        Opcode::ReadPin,
        Opcode::WritePin,
        Opcode::ReadAnalogPin,
        Opcode::WriteAnalogPin,
        Opcode::Not,
        Opcode::And,
        Opcode::Or,
        Opcode::Nand,
        Opcode::Nor,
        Opcode::Xor,
        Opcode::Latch,
        Opcode::Pulse,
        Opcode::Toggle,
        Opcode::AnalogRange,
        Opcode::CompareGt,
        Opcode::CompareGe,
        Opcode::CompareLt,
        Opcode::CompareLe,
        Opcode::CompareEq,
        Opcode::CompareNe,
        Opcode::ShiftRegister,
        Opcode::Delay,
    ];

    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.byte() == byte)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::SetPinModeInput => "SET_PIN_MODE_INPUT",
            Opcode::SetPinModeOutput => "SET_PIN_MODE_OUTPUT",
            Opcode::ReadPin => "READ_PIN",
            Opcode::WritePin => "WRITE_PIN",
            Opcode::ReadAnalogPin => "READ_ANALOG_PIN",
            Opcode::WriteAnalogPin => "WRITE_ANALOG_PIN",
            Opcode::Not => "NOT",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Nand => "NAND",
            Opcode::Nor => "NOR",
            Opcode::Xor => "XOR",
            Opcode::Latch => "LATCH",
            Opcode::Pulse => "PULSE",
            Opcode::Toggle => "TOGGLE",
            Opcode::AnalogRange => "ANALOG_RANGE",
            Opcode::CompareGt => "CMP_GT",
            Opcode::CompareGe => "CMP_GE",
            Opcode::CompareLt => "CMP_LT",
            Opcode::CompareLe => "CMP_LE",
            Opcode::CompareEq => "CMP_EQ",
            Opcode::CompareNe => "CMP_NE",
            Opcode::ShiftRegister => "SHIFT_REGISTER",
            Opcode::Delay => "DELAY",
        }
    }

    pub fn layout(self) -> OperandLayout {
        match self {
            Opcode::SetPinModeInput | Opcode::SetPinModeOutput => OperandLayout::Fixed(1),
            Opcode::ReadPin
            | Opcode::WritePin
            | Opcode::ReadAnalogPin
            | Opcode::WriteAnalogPin
            | Opcode::Not => OperandLayout::Fixed(2),
            Opcode::And | Opcode::Or | Opcode::Nand | Opcode::Nor | Opcode::Xor => {
                OperandLayout::CountPrefixed
            }
            Opcode::Toggle
            | Opcode::CompareGt
            | Opcode::CompareGe
            | Opcode::CompareLt
            | Opcode::CompareLe
            | Opcode::CompareEq
            | Opcode::CompareNe => OperandLayout::Fixed(3),
            Opcode::Latch | Opcode::Delay => OperandLayout::Fixed(4),
            Opcode::Pulse => OperandLayout::Fixed(5),
            Opcode::AnalogRange | Opcode::ShiftRegister => OperandLayout::Fixed(6),
        }
    }
}

impl From<GateOp> for Opcode {
    fn from(op: GateOp) -> Self {
        match op {
            GateOp::And => Opcode::And,
            GateOp::Or => Opcode::Or,
            GateOp::Nand => Opcode::Nand,
            GateOp::Nor => Opcode::Nor,
            GateOp::Xor => Opcode::Xor,
        }
    }
}

impl From<Comparator> for Opcode {
    fn from(c: Comparator) -> Self {
        match c {
            Comparator::Gt => Opcode::CompareGt,
            Comparator::Ge => Opcode::CompareGe,
            Comparator::Lt => Opcode::CompareLt,
            Comparator::Le => Opcode::CompareLe,
            Comparator::Eq => Opcode::CompareEq,
            Comparator::Ne => Opcode::CompareNe,
        }
    }
}
