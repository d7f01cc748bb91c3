//! A tiny instruction encoder for building test programs without hand-packed
//! binary literals. Offsets for branches and jumps are byte offsets relative
//! to the instruction itself.

use crate::instruction::{
    OP_AUIPC, OP_BRANCH, OP_IMM, OP_JAL, OP_JALR, OP_LOAD, OP_LUI, OP_REG, OP_STORE,
};
use crate::registers::RegisterMapping;

fn r_type(
    funct7: u32,
    rs2: RegisterMapping,
    rs1: RegisterMapping,
    funct3: u32,
    rd: RegisterMapping,
) -> u32 {
    (funct7 << 25)
        | ((rs2 as u32) << 20)
        | ((rs1 as u32) << 15)
        | (funct3 << 12)
        | ((rd as u32) << 7)
        | u32::from(OP_REG)
}

fn i_type(imm: i32, rs1: RegisterMapping, funct3: u32, rd: RegisterMapping, opcode: u8) -> u32 {
    (((imm as u32) & 0xfff) << 20)
        | ((rs1 as u32) << 15)
        | (funct3 << 12)
        | ((rd as u32) << 7)
        | u32::from(opcode)
}

fn s_type(imm: i32, rs2: RegisterMapping, rs1: RegisterMapping, funct3: u32) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7f) << 25)
        | ((rs2 as u32) << 20)
        | ((rs1 as u32) << 15)
        | (funct3 << 12)
        | ((imm & 0x1f) << 7)
        | u32::from(OP_STORE)
}

fn b_type(offset: i32, rs2: RegisterMapping, rs1: RegisterMapping, funct3: u32) -> u32 {
    let imm = offset as u32;
    (((imm >> 12) & 0x1) << 31)
        | (((imm >> 5) & 0x3f) << 25)
        | ((rs2 as u32) << 20)
        | ((rs1 as u32) << 15)
        | (funct3 << 12)
        | (((imm >> 1) & 0xf) << 8)
        | (((imm >> 11) & 0x1) << 7)
        | u32::from(OP_BRANCH)
}

pub fn add(rd: RegisterMapping, rs1: RegisterMapping, rs2: RegisterMapping) -> u32 {
    r_type(0b000_0000, rs2, rs1, 0b000, rd)
}

pub fn sub(rd: RegisterMapping, rs1: RegisterMapping, rs2: RegisterMapping) -> u32 {
    r_type(0b010_0000, rs2, rs1, 0b000, rd)
}

pub fn and(rd: RegisterMapping, rs1: RegisterMapping, rs2: RegisterMapping) -> u32 {
    r_type(0b000_0000, rs2, rs1, 0b111, rd)
}

pub fn or(rd: RegisterMapping, rs1: RegisterMapping, rs2: RegisterMapping) -> u32 {
    r_type(0b000_0000, rs2, rs1, 0b110, rd)
}

pub fn addi(rd: RegisterMapping, rs1: RegisterMapping, imm: i32) -> u32 {
    i_type(imm, rs1, 0b000, rd, OP_IMM)
}

pub fn lw(rd: RegisterMapping, imm: i32, rs1: RegisterMapping) -> u32 {
    i_type(imm, rs1, 0b010, rd, OP_LOAD)
}

pub fn lbu(rd: RegisterMapping, imm: i32, rs1: RegisterMapping) -> u32 {
    i_type(imm, rs1, 0b100, rd, OP_LOAD)
}

pub fn sw(rs2: RegisterMapping, imm: i32, rs1: RegisterMapping) -> u32 {
    s_type(imm, rs2, rs1, 0b010)
}

pub fn sb(rs2: RegisterMapping, imm: i32, rs1: RegisterMapping) -> u32 {
    s_type(imm, rs2, rs1, 0b000)
}

pub fn beq(rs1: RegisterMapping, rs2: RegisterMapping, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 0b000)
}

pub fn bne(rs1: RegisterMapping, rs2: RegisterMapping, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 0b001)
}

pub fn jal(rd: RegisterMapping, offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 20) & 0x1) << 31)
        | (((imm >> 1) & 0x3ff) << 21)
        | (((imm >> 11) & 0x1) << 20)
        | (((imm >> 12) & 0xff) << 12)
        | ((rd as u32) << 7)
        | u32::from(OP_JAL)
}

pub fn jalr(rd: RegisterMapping, rs1: RegisterMapping, imm: i32) -> u32 {
    i_type(imm, rs1, 0b000, rd, OP_JALR)
}

pub fn lui(rd: RegisterMapping, imm20: u32) -> u32 {
    (imm20 << 12) | ((rd as u32) << 7) | u32::from(OP_LUI)
}

pub fn auipc(rd: RegisterMapping, imm20: u32) -> u32 {
    (imm20 << 12) | ((rd as u32) << 7) | u32::from(OP_AUIPC)
}
