//! The four pipeline registers that connect the five stages.
//!
//! Each register is a tagged enum: a populated variant carrying the fields
//! an instruction takes into the next stage, and a `Bubble` variant for the
//! injected no-op slots used by stalls and flushes. The hazard logic matches
//! on the variants, so a bubble can never satisfy a hazard condition.

use crate::alu::ALUControl;
use crate::instruction::Instruction;
use crate::registers::RegisterMapping;
use crate::signals::ControlSignals;

/// IF/ID: the fetched instruction word, not yet decoded.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum IFID {
    If {
        pc: u32,
        instruction_code: u32,
    },
    #[default]
    Bubble,
}

/// ID/EX: the decoded instruction with its operands read from the register
/// file. `rs1`/`rs2` are kept for the forwarding unit, `rd` for the hazard
/// checks downstream.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum IDEX {
    Id {
        pc: u32,
        instruction: Instruction,
        control_signals: ControlSignals,
        alu_control: ALUControl,
        read_data_1: u32,
        read_data_2: u32,
        immediate: i32,
        rs1: Option<RegisterMapping>,
        rs2: Option<RegisterMapping>,
        rd: Option<RegisterMapping>,
    },
    #[default]
    Bubble,
}

/// EX/MEM: the ALU result (or link address, for jumps) plus the forwarded
/// rs2 value a store will write.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum EXMEM {
    Ex {
        control_signals: ControlSignals,
        alu_result: u32,
        write_data: u32,
        rd: Option<RegisterMapping>,
    },
    #[default]
    Bubble,
}

/// MEM/WB: everything the write-back stage needs to retire the instruction.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum MEMWB {
    Mem {
        control_signals: ControlSignals,
        alu_result: u32,
        mem_data: u32,
        rd: Option<RegisterMapping>,
    },
    #[default]
    Bubble,
}

/// The register write that retired at the end of the previous cycle.
///
/// The register file commits after the cycle's reads, so an instruction
/// decoding in the cycle its writer retires still reads the old value; by
/// the time it executes, the writer has left MEM/WB. This latch keeps that
/// write visible to the forwarding unit for exactly one more cycle.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RetiredWrite {
    pub rd: RegisterMapping,
    pub value: u32,
}

impl IDEX {
    /// The destination register, with a bubble reading as "none".
    #[must_use]
    pub fn rd(&self) -> Option<RegisterMapping> {
        match self {
            Self::Id { rd, .. } => *rd,
            Self::Bubble => None,
        }
    }

    /// Whether the occupying instruction is a load.
    #[must_use]
    pub fn mem_read(&self) -> bool {
        match self {
            Self::Id {
                control_signals, ..
            } => control_signals.mem_read,
            Self::Bubble => false,
        }
    }
}
