//! Hazard detection and forwarding.
//!
//! Everything here is recomputed from the start-of-cycle pipeline registers;
//! no hazard signal survives a cycle. The forwarding unit only *selects* a
//! source for each ALU operand: the execute stage applies the selection
//! verbatim and never re-derives it.

use crate::instruction::Instruction;
use crate::registers::RegisterMapping;
use crate::stages::{EXMEM, IDEX, MEMWB, RetiredWrite};

/// the forwarding selection for the first ALU operand (rs1).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ForwardA {
    /// no hazard: use the value read from the register file in decode
    #[default]
    None,
    /// forward the EX/MEM stage's ALU result (nearest in-flight writer)
    EXMEM,
    /// forward the MEM/WB stage's about-to-write-back value
    MEMWB,
    /// forward the write that retired at the end of the previous cycle
    Retired,
}

/// the forwarding selection for the second ALU operand (rs2).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ForwardB {
    #[default]
    None,
    EXMEM,
    MEMWB,
    Retired,
}

fn exmem_write_target(exmem: &EXMEM) -> Option<RegisterMapping> {
    match exmem {
        EXMEM::Ex {
            control_signals,
            rd: Some(rd),
            ..
        } if control_signals.reg_write && *rd != RegisterMapping::Zero => Some(*rd),
        _ => None,
    }
}

fn memwb_write_target(memwb: &MEMWB) -> Option<RegisterMapping> {
    match memwb {
        MEMWB::Mem {
            control_signals,
            rd: Some(rd),
            ..
        } if control_signals.reg_write && *rd != RegisterMapping::Zero => Some(*rd),
        _ => None,
    }
}

/// The forwarding unit: decide, for each ALU source operand of the
/// instruction about to execute, where its value must come from.
///
/// Priority is strict and per-operand: the EX/MEM writer is nearer in
/// program order than the MEM/WB writer, which is nearer than the write
/// that already retired. When several match, the nearest produced the most
/// recent value and must win. A register write targeting x0 never forwards.
#[must_use]
pub fn forwarding_unit(
    exmem: &EXMEM,
    memwb: &MEMWB,
    retired: Option<RetiredWrite>,
    idex: &IDEX,
) -> (ForwardA, ForwardB) {
    let mut forward_a = ForwardA::None;
    let mut forward_b = ForwardB::None;

    let (idex_source_reg1, idex_source_reg2) = match idex {
        IDEX::Id { rs1, rs2, .. } => (*rs1, *rs2),
        IDEX::Bubble => (None, None),
    };

    let exmem_dest = exmem_write_target(exmem);
    let memwb_dest = memwb_write_target(memwb);
    let retired_dest = retired
        .filter(|write| write.rd != RegisterMapping::Zero)
        .map(|write| write.rd);

    match idex_source_reg1 {
        None | Some(RegisterMapping::Zero) => (),
        Some(rs1) if exmem_dest == Some(rs1) => forward_a = ForwardA::EXMEM,
        Some(rs1) if memwb_dest == Some(rs1) => forward_a = ForwardA::MEMWB,
        Some(rs1) if retired_dest == Some(rs1) => forward_a = ForwardA::Retired,
        _ => (),
    }

    match idex_source_reg2 {
        None | Some(RegisterMapping::Zero) => (),
        Some(rs2) if exmem_dest == Some(rs2) => forward_b = ForwardB::EXMEM,
        Some(rs2) if memwb_dest == Some(rs2) => forward_b = ForwardB::MEMWB,
        Some(rs2) if retired_dest == Some(rs2) => forward_b = ForwardB::Retired,
        _ => (),
    }

    (forward_a, forward_b)
}

/// The hazard detection unit decides whether the instruction about to enter
/// decode must stall for one cycle (load-use hazard).
///
/// A load's data is only available at the end of its memory stage, one
/// cycle later than any forwarding path can deliver it to an immediately
/// following consumer. The stall re-presents the consumer next cycle, after
/// which the ordinary MEM/WB forward resolves the dependency.
pub struct HazardDetectionUnit {
    ifid_rs1: Option<RegisterMapping>,
    ifid_rs2: Option<RegisterMapping>,
    idex_rd: Option<RegisterMapping>,
    idex_memread: bool,
}

impl HazardDetectionUnit {
    /// prime the hazard detection unit with the relevant current pipeline state
    #[must_use]
    pub fn prime(decoded_instruction: Option<&Instruction>, idex_reg: &IDEX) -> Self {
        Self {
            ifid_rs1: decoded_instruction.and_then(Instruction::rs1),
            ifid_rs2: decoded_instruction.and_then(Instruction::rs2),
            idex_rd: idex_reg.rd(),
            idex_memread: idex_reg.mem_read(),
        }
    }

    /// Detect whether a stall is required to resolve a load-use hazard.
    /// Each source operand is checked independently; a load targeting x0
    /// never forces a stall.
    #[must_use]
    pub fn detect_stall_conditions(self) -> bool {
        let load_dest = match (self.idex_memread, self.idex_rd) {
            (true, Some(rd)) if rd != RegisterMapping::Zero => rd,
            _ => return false,
        };

        self.ifid_rs1 == Some(load_dest) || self.ifid_rs2 == Some(load_dest)
    }
}
