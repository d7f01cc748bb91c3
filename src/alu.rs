use ux::{u3, u7};

use crate::signals::ALUOp;

/// the exact operation the ALU performs, resolved from the instruction
/// class and the funct fields.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ALUControl {
    #[default]
    ADD,
    SUB,
    AND,
    OR,
    XOR,
    SLL,
    SRL,
    SRA,
    SLT,
    SLTU,
}

/// This function mimics the ALU Control Unit in a RISC-V processor: it
/// combines the instruction-class signal from the main control unit with
/// the funct3/funct7 fields to pick the exact ALU operation.
///
/// Returns `None` for funct combinations with no RV32I meaning; the decode
/// stage reports those as decode faults.
#[must_use]
pub fn alu_control_unit(
    alu_op: ALUOp,
    funct3: Option<u3>,
    funct7: Option<u7>,
) -> Option<ALUControl> {
    Some(match (alu_op, funct3, funct7) {
        (ALUOp::LoadStore, _, _) => ALUControl::ADD,
        (ALUOp::Branch, _, _) => ALUControl::SUB,
        (ALUOp::Register, Some(funct3), Some(funct7)) => {
            match (u8::from(funct7), u8::from(funct3)) {
                (0b000_0000, 0b000) => ALUControl::ADD,
                (0b010_0000, 0b000) => ALUControl::SUB,
                (0b000_0000, 0b111) => ALUControl::AND,
                (0b000_0000, 0b110) => ALUControl::OR,
                (0b000_0000, 0b100) => ALUControl::XOR,
                (0b000_0000, 0b001) => ALUControl::SLL,
                (0b000_0000, 0b101) => ALUControl::SRL,
                (0b010_0000, 0b101) => ALUControl::SRA,
                (0b000_0000, 0b010) => ALUControl::SLT,
                (0b000_0000, 0b011) => ALUControl::SLTU,
                _ => return None,
            }
        }
        (ALUOp::Immediate, Some(funct3), Some(funct7)) => {
            match (u8::from(funct7), u8::from(funct3)) {
                (_, 0b000) => ALUControl::ADD,
                (_, 0b010) => ALUControl::SLT,
                (_, 0b011) => ALUControl::SLTU,
                (_, 0b100) => ALUControl::XOR,
                (_, 0b110) => ALUControl::OR,
                (_, 0b111) => ALUControl::AND,
                (0b000_0000, 0b001) => ALUControl::SLL,
                (0b000_0000, 0b101) => ALUControl::SRL,
                (0b010_0000, 0b101) => ALUControl::SRA,
                _ => return None,
            }
        }
        _ => return None,
    })
}

/// The arithmetic-logic unit: a fixed combinational mapping over two 32-bit
/// operands. Shift amounts use the low 5 bits of operand b.
#[must_use]
pub fn alu(control: ALUControl, a: u32, b: u32) -> u32 {
    let shamt = b & 0x1f;
    match control {
        ALUControl::ADD => a.wrapping_add(b),
        ALUControl::SUB => a.wrapping_sub(b),
        ALUControl::AND => a & b,
        ALUControl::OR => a | b,
        ALUControl::XOR => a ^ b,
        ALUControl::SLL => a.wrapping_shl(shamt),
        ALUControl::SRL => a.wrapping_shr(shamt),
        ALUControl::SRA => ((a as i32) >> shamt) as u32,
        ALUControl::SLT => u32::from((a as i32) < (b as i32)),
        ALUControl::SLTU => u32::from(a < b),
    }
}
