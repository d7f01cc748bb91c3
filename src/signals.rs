use ux::u3;

use crate::instruction::{
    Instruction, OP_AUIPC, OP_BRANCH, OP_IMM, OP_JAL, OP_JALR, OP_LOAD, OP_LUI, OP_REG, OP_STORE,
};

/// a 2 bit signal that tells the ALU Control Unit what type of instruction is being executed
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ALUOp {
    /// address arithmetic and everything else that just adds: loads, stores,
    /// jumps, upper immediates
    #[default]
    LoadStore,
    /// branch instructions (the branch condition itself is evaluated by a
    /// separate comparator, not the ALU)
    Branch,
    /// the operation comes from funct3/funct7 of an R-type instruction
    Register,
    /// the operation comes from funct3 (and the shift discriminator bits) of
    /// an I-type instruction
    Immediate,
}

/// a 1 bit signal that tells the ALU whether to use the register value (0) or the immediate value (1) as the second operand.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ALUSrc {
    #[default]
    Register,
    Immediate,
}

/// The first-operand source. Ordinarily rs1, but LUI pins it to zero and
/// AUIPC to the instruction's own PC.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum OpASrc {
    #[default]
    Register,
    Pc,
    Zero,
}

/// controls whether the write-back stage uses the output of the data memory unit or the ALU.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum WritebackSource {
    #[default]
    Alu,
    Memory,
}

/// The branch condition, from funct3.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BranchKind {
    Eq,
    Ne,
    Lt,
    Ge,
    Ltu,
    Geu,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum JumpKind {
    /// PC-relative jump (JAL)
    Jal,
    /// register-indirect jump (JALR)
    Jalr,
}

/// Access width of a load or store.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum MemWidth {
    Byte,
    Half,
    #[default]
    Word,
}

impl MemWidth {
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }
}

/// The control signals the decode stage generates for one instruction.
///
/// `ControlSignals::default()` has every effectful signal disabled, which is
/// exactly the bubble: a defaulted instruction slot writes nothing, reads
/// nothing, branches nowhere.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct ControlSignals {
    /// tells the register file to write to the register specified by the instruction.
    pub reg_write: bool,
    /// tells the data memory unit to perform a load for this instruction.
    pub mem_read: bool,
    /// tells the data memory unit to perform a store for this instruction.
    pub mem_write: bool,
    /// selects the write-back value between the ALU result and loaded data.
    pub wb_src: WritebackSource,
    /// selects the ALU's second operand between rs2 and the immediate.
    pub alu_src: ALUSrc,
    /// selects the ALU's first operand between rs1, the PC, and zero.
    pub a_src: OpASrc,
    /// instruction class for the ALU control unit.
    pub alu_op: ALUOp,
    /// the branch condition, when the instruction is a branch.
    pub branch: Option<BranchKind>,
    /// the jump kind, when the instruction is an unconditional jump.
    pub jump: Option<JumpKind>,
    /// access width for loads and stores.
    pub mem_width: MemWidth,
    /// whether a narrow load sign-extends (LB/LH) or zero-extends (LBU/LHU).
    pub mem_signed: bool,
}

/// The main control unit: a fixed mapping from opcode (and funct3 where the
/// format needs it) to the control signals. Returns `None` for funct values
/// with no RV32I meaning, which the decode stage reports as a decode fault.
#[must_use]
pub fn control_unit(instruction: &Instruction) -> Option<ControlSignals> {
    let mut signals = ControlSignals::default();

    match u8::from(instruction.opcode()) {
        OP_REG => {
            signals.reg_write = true;
            signals.alu_op = ALUOp::Register;
        }
        OP_IMM => {
            signals.reg_write = true;
            signals.alu_src = ALUSrc::Immediate;
            signals.alu_op = ALUOp::Immediate;
        }
        OP_LOAD => {
            signals.reg_write = true;
            signals.mem_read = true;
            signals.wb_src = WritebackSource::Memory;
            signals.alu_src = ALUSrc::Immediate;
            let (width, sign) = match u8::from(instruction.funct3()?) {
                0b000 => (MemWidth::Byte, true),
                0b001 => (MemWidth::Half, true),
                0b010 => (MemWidth::Word, true),
                0b100 => (MemWidth::Byte, false),
                0b101 => (MemWidth::Half, false),
                _ => return None,
            };
            signals.mem_width = width;
            signals.mem_signed = sign;
        }
        OP_STORE => {
            signals.mem_write = true;
            signals.alu_src = ALUSrc::Immediate;
            signals.mem_width = match u8::from(instruction.funct3()?) {
                0b000 => MemWidth::Byte,
                0b001 => MemWidth::Half,
                0b010 => MemWidth::Word,
                _ => return None,
            };
        }
        OP_BRANCH => {
            signals.alu_op = ALUOp::Branch;
            signals.branch = Some(match u8::from(instruction.funct3()?) {
                0b000 => BranchKind::Eq,
                0b001 => BranchKind::Ne,
                0b100 => BranchKind::Lt,
                0b101 => BranchKind::Ge,
                0b110 => BranchKind::Ltu,
                0b111 => BranchKind::Geu,
                _ => return None,
            });
        }
        OP_JAL => {
            signals.reg_write = true;
            signals.jump = Some(JumpKind::Jal);
        }
        OP_JALR => {
            if instruction.funct3() != Some(u3::new(0)) {
                return None;
            }
            signals.reg_write = true;
            signals.jump = Some(JumpKind::Jalr);
            signals.alu_src = ALUSrc::Immediate;
        }
        OP_LUI => {
            signals.reg_write = true;
            signals.alu_src = ALUSrc::Immediate;
            signals.a_src = OpASrc::Zero;
        }
        OP_AUIPC => {
            signals.reg_write = true;
            signals.alu_src = ALUSrc::Immediate;
            signals.a_src = OpASrc::Pc;
        }
        // ECALL/EBREAK/FENCE land here too: the core has no trap
        // architecture, so environment instructions are decode faults
        _ => return None,
    }

    Some(signals)
}
