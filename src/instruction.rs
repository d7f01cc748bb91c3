use ux::{i12, u20, u3, u7};

use crate::registers::RegisterMapping;

/// A decoded RV32I instruction, one variant per encoding format.
///
/// The fields hold the raw instruction fields at their architectural widths;
/// sign extension and the B/J immediate shifts happen in [`Instruction::immediate`].
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Instruction {
    RType {
        funct7: u7,
        rs2: RegisterMapping,
        rs1: RegisterMapping,
        funct3: u3,
        rd: RegisterMapping,
        opcode: u7,
    },
    IType {
        imm: i12,
        rs1: RegisterMapping,
        funct3: u3,
        rd: RegisterMapping,
        opcode: u7,
    },
    SType {
        imm: i12,
        rs2: RegisterMapping,
        rs1: RegisterMapping,
        funct3: u3,
        opcode: u7,
    },
    /// Branch format. `imm` holds bits [12:1] of the byte offset.
    SBType {
        imm: i12,
        rs2: RegisterMapping,
        rs1: RegisterMapping,
        funct3: u3,
        opcode: u7,
    },
    UType {
        imm: u20,
        rd: RegisterMapping,
        opcode: u7,
    },
    /// Jump format. `imm` holds bits [20:1] of the byte offset.
    UJType {
        imm: u20,
        rd: RegisterMapping,
        opcode: u7,
    },
}

mod opcodes {
    pub const OP_REG: u8 = 0b011_0011;
    pub const OP_IMM: u8 = 0b001_0011;
    pub const OP_LOAD: u8 = 0b000_0011;
    pub const OP_STORE: u8 = 0b010_0011;
    pub const OP_BRANCH: u8 = 0b110_0011;
    pub const OP_JAL: u8 = 0b110_1111;
    pub const OP_JALR: u8 = 0b110_0111;
    pub const OP_LUI: u8 = 0b011_0111;
    pub const OP_AUIPC: u8 = 0b001_0111;
}
pub use opcodes::*;

impl Instruction {
    /// Decode a raw 32-bit instruction word. Returns `None` when the opcode
    /// does not name an RV32I format; funct-level validation happens in the
    /// control units.
    #[must_use]
    pub fn decode(word: u32) -> Option<Self> {
        let opcode = u7::new((word & 0x7f) as u8);
        let rd = RegisterMapping::from_bits(((word >> 7) & 0x1f) as u8);
        let rs1 = RegisterMapping::from_bits(((word >> 15) & 0x1f) as u8);
        let rs2 = RegisterMapping::from_bits(((word >> 20) & 0x1f) as u8);
        let funct3 = u3::new(((word >> 12) & 0x7) as u8);
        let funct7 = u7::new(((word >> 25) & 0x7f) as u8);

        Some(match u8::from(opcode) {
            OP_REG => Self::RType {
                funct7,
                rs2,
                rs1,
                funct3,
                rd,
                opcode,
            },
            OP_IMM | OP_LOAD | OP_JALR => Self::IType {
                imm: i12::new(((word as i32) >> 20) as i16),
                rs1,
                funct3,
                rd,
                opcode,
            },
            OP_STORE => Self::SType {
                imm: i12::new(
                    ((((word as i32) >> 25) << 5) | ((word >> 7) & 0x1f) as i32) as i16,
                ),
                rs2,
                rs1,
                funct3,
                opcode,
            },
            OP_BRANCH => Self::SBType {
                // imm[12|10:5] come from bits 31:25, imm[4:1|11] from bits 11:7
                imm: i12::new(
                    ((((word as i32) >> 31) << 11)
                        | ((((word >> 7) & 0x1) << 10) as i32)
                        | ((((word >> 25) & 0x3f) << 4) as i32)
                        | (((word >> 8) & 0xf) as i32)) as i16,
                ),
                rs2,
                rs1,
                funct3,
                opcode,
            },
            OP_LUI | OP_AUIPC => Self::UType {
                imm: u20::new(word >> 12),
                rd,
                opcode,
            },
            OP_JAL => Self::UJType {
                // imm[20|10:1|11|19:12] from bits 31:12, stored as imm[20:1]
                imm: u20::new(
                    (((word >> 31) & 0x1) << 19)
                        | (((word >> 12) & 0xff) << 11)
                        | (((word >> 20) & 0x1) << 10)
                        | ((word >> 21) & 0x3ff),
                ),
                rd,
                opcode,
            },
            _ => return None,
        })
    }

    #[must_use]
    pub const fn opcode(&self) -> u7 {
        match self {
            Self::RType { opcode, .. }
            | Self::IType { opcode, .. }
            | Self::SType { opcode, .. }
            | Self::SBType { opcode, .. }
            | Self::UType { opcode, .. }
            | Self::UJType { opcode, .. } => *opcode,
        }
    }

    #[must_use]
    pub const fn rd(&self) -> Option<RegisterMapping> {
        match self {
            Self::RType { rd, .. }
            | Self::IType { rd, .. }
            | Self::UType { rd, .. }
            | Self::UJType { rd, .. } => Some(*rd),
            Self::SType { .. } | Self::SBType { .. } => None,
        }
    }

    #[must_use]
    pub const fn rs1(&self) -> Option<RegisterMapping> {
        match self {
            Self::RType { rs1, .. }
            | Self::IType { rs1, .. }
            | Self::SType { rs1, .. }
            | Self::SBType { rs1, .. } => Some(*rs1),
            Self::UType { .. } | Self::UJType { .. } => None,
        }
    }

    #[must_use]
    pub const fn rs2(&self) -> Option<RegisterMapping> {
        match self {
            Self::RType { rs2, .. }
            | Self::SType { rs2, .. }
            | Self::SBType { rs2, .. } => Some(*rs2),
            Self::IType { .. } | Self::UType { .. } | Self::UJType { .. } => None,
        }
    }

    #[must_use]
    pub const fn funct3(&self) -> Option<u3> {
        match self {
            Self::RType { funct3, .. }
            | Self::IType { funct3, .. }
            | Self::SType { funct3, .. }
            | Self::SBType { funct3, .. } => Some(*funct3),
            Self::UType { .. } | Self::UJType { .. } => None,
        }
    }

    /// The funct7 field. For I-type instructions this is bits [11:5] of the
    /// immediate, which is where the shift instructions keep their
    /// SRLI/SRAI discriminator.
    #[must_use]
    pub fn funct7(&self) -> Option<u7> {
        match self {
            Self::RType { funct7, .. } => Some(*funct7),
            Self::IType { imm, .. } => Some(u7::new(((i16::from(*imm) >> 5) & 0x7f) as u8)),
            Self::SType { .. } | Self::SBType { .. } | Self::UType { .. } | Self::UJType { .. } => {
                None
            }
        }
    }

    /// The sign-extended immediate, per format:
    /// byte offsets for branches and jumps (the stored bits shifted left
    /// once), the upper-immediate value shifted into place for U-type, and
    /// `None` for R-type.
    #[must_use]
    pub fn immediate(&self) -> Option<i32> {
        match self {
            Self::RType { .. } => None,
            Self::IType { imm, .. } | Self::SType { imm, .. } => Some(i32::from(i16::from(*imm))),
            Self::SBType { imm, .. } => Some(i32::from(i16::from(*imm)) << 1),
            Self::UType { imm, .. } => Some((u32::from(*imm) << 12) as i32),
            Self::UJType { imm, .. } => {
                let bits = u32::from(*imm);
                // sign-extend the stored 20 bits, then restore the implicit
                // low zero bit
                Some((((bits << 12) as i32) >> 12) << 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_lw() {
        // lw x3, 4(x10)
        let inst = Instruction::decode(0b0000_0000_0100_0101_0010_0001_1000_0011).unwrap();
        assert_eq!(inst.rd(), Some(RegisterMapping::Gp));
        assert_eq!(inst.rs1(), Some(RegisterMapping::A0));
        assert_eq!(inst.rs2(), None);
        assert_eq!(inst.immediate(), Some(4));
        assert_eq!(u8::from(inst.opcode()), OP_LOAD);
    }

    #[test]
    fn decodes_sub() {
        // sub x5, x1, x2
        let inst = Instruction::decode(0b0100_0000_0010_0000_1000_0010_1011_0011).unwrap();
        assert_eq!(inst.rd(), Some(RegisterMapping::T0));
        assert_eq!(inst.rs1(), Some(RegisterMapping::Ra));
        assert_eq!(inst.rs2(), Some(RegisterMapping::Sp));
        assert_eq!(inst.funct7(), Some(u7::new(0b010_0000)));
        assert_eq!(inst.immediate(), None);
    }

    #[test]
    fn decodes_branch_offset() {
        // beq x5, x3, 12
        let inst = Instruction::decode(0b0000_0000_0011_0010_1000_0110_0110_0011).unwrap();
        assert_eq!(inst.rs1(), Some(RegisterMapping::T0));
        assert_eq!(inst.rs2(), Some(RegisterMapping::Gp));
        assert_eq!(inst.immediate(), Some(12));
    }

    #[test]
    fn decodes_negative_store_offset() {
        // sw x5, -8(x2): imm = -8 = 0b1111_1111_1000
        let word = (0b111_1111 << 25) | (5 << 20) | (2 << 15) | (0b010 << 12) | (0b11000 << 7) | 0b010_0011;
        let inst = Instruction::decode(word).unwrap();
        assert_eq!(inst.immediate(), Some(-8));
        assert_eq!(inst.rs2(), Some(RegisterMapping::T0));
        assert_eq!(inst.rd(), None);
    }

    #[test]
    fn decodes_jal_backward() {
        // jal x1, -16: imm[20:1] = -8, encoded over bits 31:12
        let imm: i32 = -16;
        let word = ((((imm >> 20) & 0x1) as u32) << 31)
            | ((((imm >> 1) & 0x3ff) as u32) << 21)
            | ((((imm >> 11) & 0x1) as u32) << 20)
            | ((((imm >> 12) & 0xff) as u32) << 12)
            | (1 << 7)
            | u32::from(OP_JAL);
        let inst = Instruction::decode(word).unwrap();
        assert_eq!(inst.immediate(), Some(-16));
        assert_eq!(inst.rd(), Some(RegisterMapping::Ra));
    }

    #[test]
    fn decodes_lui_upper_immediate() {
        // lui x7, 0x12345
        let word = (0x12345 << 12) | (7 << 7) | u32::from(OP_LUI);
        let inst = Instruction::decode(word).unwrap();
        assert_eq!(inst.immediate(), Some(0x1234_5000));
        assert_eq!(inst.rs1(), None);
    }

    #[test]
    fn rejects_unknown_opcode() {
        assert_eq!(Instruction::decode(0xffff_ffff), None);
        assert_eq!(Instruction::decode(0), None);
    }
}
