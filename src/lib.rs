//! A cycle-accurate simulator for a classic five-stage in-order RV32I
//! pipeline: fetch, decode, execute, memory, write-back.
//!
//! The pipeline handles data hazards with full forwarding (plus a one-cycle
//! load-use stall), and control hazards by predicting not-taken and flushing
//! the two wrong-path instructions when a branch or jump resolves in
//! execute. [`cpu::CPU::run_step`] advances the machine one clock cycle and
//! reports every architecturally visible state change that cycle made.

pub mod alu;
pub mod cpu;
pub mod fault;
pub mod hazard_detection;
pub mod instruction;
pub mod memory;
pub mod registers;
pub mod signals;
pub mod stages;
pub mod utils;

#[cfg(test)]
pub(crate) mod asm;
