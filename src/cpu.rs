//! The pipelined core itself.
//!
//! [`CPU::run_step`] advances the machine by exactly one clock cycle in two
//! phases. The compute phase derives every stage's output from the pipeline
//! registers as they stood at the start of the cycle, so stage order never
//! matters. The commit phase then moves those outputs into the registers,
//! applying the hazard unit's verdict: a flush squashes the two wrong-path
//! instructions and steers the PC, a stall freezes fetch and decode for one
//! cycle, and otherwise everything shifts down one stage.

use crate::alu::{alu, alu_control_unit};
use crate::fault::Fault;
use crate::hazard_detection::{forwarding_unit, ForwardA, ForwardB, HazardDetectionUnit};
use crate::instruction::Instruction;
use crate::memory::{DataMemory, InstructionMemory};
use crate::registers::{RegisterFile, RegisterMapping};
use crate::signals::{
    control_unit, ALUSrc, BranchKind, JumpKind, MemWidth, OpASrc, WritebackSource,
};
use crate::stages::{RetiredWrite, EXMEM, IDEX, IFID, MEMWB};

/// What one clock cycle reports: the cycle count, then one line per visible
/// state change, oldest instruction first.
pub type Report = String;

/// A store waiting for the commit phase: address, width, value.
type PendingStore = (u32, MemWidth, u32);

#[derive(Debug)]
pub struct CPU {
    pc: u32,
    total_clock_cycles: u64,
    if_id: IFID,
    id_ex: IDEX,
    ex_mem: EXMEM,
    mem_wb: MEMWB,
    /// the register write that retired at the end of the previous cycle,
    /// kept visible to the forwarding unit for one more cycle
    retired: Option<RetiredWrite>,
    rf: RegisterFile,
    i_mem: InstructionMemory,
    d_mem: DataMemory,
}

impl CPU {
    #[must_use]
    pub fn new(program: Vec<u32>) -> Self {
        Self {
            pc: 0,
            total_clock_cycles: 0,
            if_id: IFID::default(),
            id_ex: IDEX::default(),
            ex_mem: EXMEM::default(),
            mem_wb: MEMWB::default(),
            retired: None,
            rf: RegisterFile::new(),
            i_mem: InstructionMemory::new(program),
            d_mem: DataMemory::new(),
        }
    }

    /// Initialize the register file with the provided values, everything
    /// else becomes 0.
    pub fn initialize_rf(&mut self, mappings: &[(RegisterMapping, u32)]) {
        self.rf.initialize(mappings);
    }

    /// Seed data memory with word values before the program runs.
    pub fn initialize_dmem(&mut self, words: &[(u32, u32)]) -> Result<(), Fault> {
        self.d_mem.initialize(words)
    }

    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    #[must_use]
    pub const fn get_total_clock_cycles(&self) -> u64 {
        self.total_clock_cycles
    }

    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.rf
    }

    /// Whether the program has run off the end of instruction memory and
    /// every in-flight instruction has retired.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.pc == self.i_mem.end_address()
            && matches!(self.if_id, IFID::Bubble)
            && matches!(self.id_ex, IDEX::Bubble)
            && matches!(self.ex_mem, EXMEM::Bubble)
            && matches!(self.mem_wb, MEMWB::Bubble)
    }

    /// Run the program to completion, printing each cycle's report.
    pub fn run(&mut self) -> Result<(), Fault> {
        while !self.is_done() {
            print!("{}", self.run_step()?);
        }
        Ok(())
    }

    /// Advance the machine by one clock cycle.
    ///
    /// On a fault the machine keeps the state it had at the start of the
    /// cycle, except that a store older than the faulting instruction may
    /// already have committed.
    pub fn run_step(&mut self) -> Result<Report, Fault> {
        // compute phase: every stage reads the start-of-cycle registers
        let writeback = Self::writeback(&self.mem_wb);
        let (next_mem_wb, store) = self.mem_stage()?;
        let (forward_a, forward_b) =
            forwarding_unit(&self.ex_mem, &self.mem_wb, self.retired, &self.id_ex);
        let (next_ex_mem, redirect) = self.execute(forward_a, forward_b);
        let flush = redirect.is_some();

        // a flush squashes the instructions in fetch and decode, so neither
        // stage runs; a squashed instruction can not raise a fault
        let (next_id_ex, next_if_id, stall) = if flush {
            (IDEX::Bubble, IFID::Bubble, false)
        } else {
            let (next_id_ex, decoded) = self.decode()?;
            let stall = HazardDetectionUnit::prime(decoded.as_ref(), &self.id_ex)
                .detect_stall_conditions();
            let next_if_id = if stall { self.if_id } else { self.fetch()? };
            (next_id_ex, next_if_id, stall)
        };

        // commit phase, oldest instruction first: the store in MEM, the
        // write-back, then the pipeline registers and the PC
        let mut committed_store = None;
        if let Some((addr, width, value)) = store {
            self.d_mem.store(addr, width, value)?;
            let shown = match width {
                MemWidth::Byte => value & 0xff,
                MemWidth::Half => value & 0xffff,
                MemWidth::Word => value,
            };
            committed_store = Some((addr, shown));
        }

        self.total_clock_cycles += 1;
        let mut report = format!("total_clock_cycles {} :\n", self.total_clock_cycles);
        if let Some((addr, value)) = committed_store {
            report.push_str(&format!("memory {addr:#x} is modified to {value:#x}\n"));
        }

        self.retired = None;
        if let Some((rd, value)) = writeback {
            self.rf.write(rd, value);
            if rd != RegisterMapping::Zero {
                self.retired = Some(RetiredWrite { rd, value });
                report.push_str(&format!("{rd} is modified to {value:#x}\n"));
            }
        }

        let old_pc = self.pc;
        if let Some(target) = redirect {
            self.if_id = IFID::Bubble;
            self.id_ex = IDEX::Bubble;
            self.pc = target;
            report.push_str("pipeline flushed\n");
        } else if stall {
            // fetch and decode are frozen; the bubble enters execute
            self.id_ex = IDEX::Bubble;
        } else {
            self.if_id = next_if_id;
            self.id_ex = next_id_ex;
            if matches!(next_if_id, IFID::If { .. }) {
                self.pc = self.pc.wrapping_add(4);
            }
        }
        self.ex_mem = next_ex_mem;
        self.mem_wb = next_mem_wb;

        if self.pc != old_pc {
            report.push_str(&format!("pc is modified to {:#x}\n", self.pc));
        }

        Ok(report)
    }

    /// Fetch the instruction at the current PC. A PC sitting exactly one
    /// past the end of the program is the normal drain condition, not a
    /// fault: fetch just stops producing instructions.
    fn fetch(&self) -> Result<IFID, Fault> {
        if self.pc == self.i_mem.end_address() {
            return Ok(IFID::Bubble);
        }
        Ok(IFID::If {
            pc: self.pc,
            instruction_code: self.i_mem.fetch(self.pc)?,
        })
    }

    /// Decode the fetched word, generate its control signals, and read the
    /// register file. The decoded instruction is returned alongside the
    /// latch value so the hazard unit can inspect its source registers.
    fn decode(&self) -> Result<(IDEX, Option<Instruction>), Fault> {
        let IFID::If {
            pc,
            instruction_code,
        } = self.if_id
        else {
            return Ok((IDEX::Bubble, None));
        };

        let fault = Fault::Decode {
            pc,
            word: instruction_code,
        };
        let instruction = Instruction::decode(instruction_code).ok_or(fault)?;
        let control_signals = control_unit(&instruction).ok_or(fault)?;
        let alu_control = alu_control_unit(
            control_signals.alu_op,
            instruction.funct3(),
            instruction.funct7(),
        )
        .ok_or(fault)?;

        let rs1 = instruction.rs1();
        let rs2 = instruction.rs2();
        let read = |reg: Option<RegisterMapping>| reg.map_or(0, |r| self.rf.read(r));

        Ok((
            IDEX::Id {
                pc,
                instruction,
                control_signals,
                alu_control,
                read_data_1: read(rs1),
                read_data_2: read(rs2),
                immediate: instruction.immediate().unwrap_or(0),
                rs1,
                rs2,
                rd: instruction.rd(),
            },
            Some(instruction),
        ))
    }

    /// The execute stage: resolve the forwarded operands, run the ALU, and
    /// decide whether the PC must be redirected. Branches resolve here
    /// (fetch always predicts not-taken), and jumps always redirect.
    fn execute(&self, forward_a: ForwardA, forward_b: ForwardB) -> (EXMEM, Option<u32>) {
        let IDEX::Id {
            pc,
            control_signals,
            alu_control,
            read_data_1,
            read_data_2,
            immediate,
            rd,
            ..
        } = self.id_ex
        else {
            return (EXMEM::Bubble, None);
        };

        let rs1_value = match forward_a {
            ForwardA::None => read_data_1,
            ForwardA::EXMEM => Self::exmem_result(&self.ex_mem).unwrap_or(read_data_1),
            ForwardA::MEMWB => Self::writeback(&self.mem_wb).map_or(read_data_1, |(_, v)| v),
            ForwardA::Retired => self.retired.map_or(read_data_1, |w| w.value),
        };
        let rs2_value = match forward_b {
            ForwardB::None => read_data_2,
            ForwardB::EXMEM => Self::exmem_result(&self.ex_mem).unwrap_or(read_data_2),
            ForwardB::MEMWB => Self::writeback(&self.mem_wb).map_or(read_data_2, |(_, v)| v),
            ForwardB::Retired => self.retired.map_or(read_data_2, |w| w.value),
        };

        let op_a = match control_signals.a_src {
            OpASrc::Register => rs1_value,
            OpASrc::Pc => pc,
            OpASrc::Zero => 0,
        };
        let op_b = match control_signals.alu_src {
            ALUSrc::Register => rs2_value,
            ALUSrc::Immediate => immediate as u32,
        };
        let mut alu_result = alu(alu_control, op_a, op_b);

        let mut redirect = None;
        if let Some(kind) = control_signals.branch {
            if branch_taken(kind, rs1_value, rs2_value) {
                redirect = Some(pc.wrapping_add_signed(immediate));
            }
        }
        if let Some(kind) = control_signals.jump {
            redirect = Some(match kind {
                JumpKind::Jal => pc.wrapping_add_signed(immediate),
                JumpKind::Jalr => rs1_value.wrapping_add_signed(immediate) & !1,
            });
            // the link address travels down the ALU-result path
            alu_result = pc.wrapping_add(4);
        }

        (
            EXMEM::Ex {
                control_signals,
                alu_result,
                write_data: rs2_value,
                rd,
            },
            redirect,
        )
    }

    /// The memory stage. Loads read data memory immediately; a store is
    /// returned as a pending action for the commit phase, after its address
    /// has been formed. Either can fault.
    fn mem_stage(&self) -> Result<(MEMWB, Option<PendingStore>), Fault> {
        let EXMEM::Ex {
            control_signals,
            alu_result,
            write_data,
            rd,
        } = self.ex_mem
        else {
            return Ok((MEMWB::Bubble, None));
        };

        let mut store = None;
        let mem_data = if control_signals.mem_read {
            self.d_mem.load(
                alu_result,
                control_signals.mem_width,
                control_signals.mem_signed,
            )?
        } else {
            if control_signals.mem_write {
                store = Some((alu_result, control_signals.mem_width, write_data));
            }
            0
        };

        Ok((
            MEMWB::Mem {
                control_signals,
                alu_result,
                mem_data,
                rd,
            },
            store,
        ))
    }

    /// The value (and destination) the write-back stage will commit this
    /// cycle, if any.
    fn writeback(mem_wb: &MEMWB) -> Option<(RegisterMapping, u32)> {
        match mem_wb {
            MEMWB::Mem {
                control_signals,
                alu_result,
                mem_data,
                rd: Some(rd),
            } if control_signals.reg_write => {
                let value = match control_signals.wb_src {
                    WritebackSource::Alu => *alu_result,
                    WritebackSource::Memory => *mem_data,
                };
                Some((*rd, value))
            }
            _ => None,
        }
    }

    fn exmem_result(ex_mem: &EXMEM) -> Option<u32> {
        match ex_mem {
            EXMEM::Ex { alu_result, .. } => Some(*alu_result),
            EXMEM::Bubble => None,
        }
    }
}

/// The dedicated branch comparator. Branch conditions are evaluated on the
/// forwarded operands, independent of the ALU.
fn branch_taken(kind: BranchKind, a: u32, b: u32) -> bool {
    match kind {
        BranchKind::Eq => a == b,
        BranchKind::Ne => a != b,
        BranchKind::Lt => (a as i32) < (b as i32),
        BranchKind::Ge => (a as i32) >= (b as i32),
        BranchKind::Ltu => a < b,
        BranchKind::Geu => a >= b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm;
    use crate::registers::RegisterMapping::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_program_is_immediately_done() {
        let cpu = CPU::new(vec![]);
        assert!(cpu.is_done());
    }

    #[test]
    fn stall_freezes_fetch_and_reissues_decode() {
        // lw x5, 0(x10) ; add x6, x5, x5, a textbook load-use pair
        let mut cpu = CPU::new(vec![asm::lw(T0, 0, A0), asm::add(T1, T0, T0)]);
        cpu.initialize_rf(&[(A0, 0)]);
        cpu.initialize_dmem(&[(0, 7)]).unwrap();

        cpu.run_step().unwrap();
        cpu.run_step().unwrap();

        // cycle 3 stalls: the add stays latched in IF/ID and the PC holds
        let held_if_id = cpu.if_id;
        let held_pc = cpu.pc;
        cpu.run_step().unwrap();
        assert_eq!(cpu.if_id, held_if_id);
        assert_eq!(cpu.pc, held_pc);
        assert_eq!(cpu.id_ex, IDEX::Bubble);

        while !cpu.is_done() {
            cpu.run_step().unwrap();
        }
        assert_eq!(cpu.registers().read(T1), 14);
        // one stall cycle on top of the 6 a stall-free pair would take
        assert_eq!(cpu.get_total_clock_cycles(), 7);
    }

    #[test]
    fn drain_does_not_advance_the_pc() {
        let mut cpu = CPU::new(vec![asm::addi(T0, Zero, 1)]);
        cpu.run_step().unwrap();
        assert_eq!(cpu.pc(), 4);
        // the pipeline drains for four more cycles with the PC parked at
        // the end of the program
        while !cpu.is_done() {
            cpu.run_step().unwrap();
        }
        assert_eq!(cpu.pc(), 4);
        assert_eq!(cpu.get_total_clock_cycles(), 5);
        assert_eq!(cpu.registers().read(T0), 1);
    }

    #[test]
    fn faulting_cycle_leaves_state_untouched() {
        // lw x1, 2(x0): misaligned address, faults in its memory stage
        let mut cpu = CPU::new(vec![asm::lw(Ra, 2, Zero)]);
        cpu.run_step().unwrap();
        cpu.run_step().unwrap();
        cpu.run_step().unwrap();
        let cycles = cpu.get_total_clock_cycles();
        assert_eq!(
            cpu.run_step(),
            Err(Fault::MemoryMisaligned { addr: 2, width: 4 })
        );
        assert_eq!(cpu.get_total_clock_cycles(), cycles);
        assert_eq!(cpu.registers().read(Ra), 0);
    }
}
