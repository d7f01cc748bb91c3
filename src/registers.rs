use std::{fmt, ops::Index};

/// the number of registers in the RISC-V ISA
pub const REGISTERS_COUNT: u8 = 32;

/// ABI names for the 32 general-purpose registers.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum RegisterMapping {
    Zero = 0,
    Ra = 1,
    Sp = 2,
    Gp = 3,
    Tp = 4,
    T0 = 5,
    T1 = 6,
    T2 = 7,
    S0 = 8,
    S1 = 9,
    A0 = 10,
    A1 = 11,
    A2 = 12,
    A3 = 13,
    A4 = 14,
    A5 = 15,
    A6 = 16,
    A7 = 17,
    S2 = 18,
    S3 = 19,
    S4 = 20,
    S5 = 21,
    S6 = 22,
    S7 = 23,
    S8 = 24,
    S9 = 25,
    S10 = 26,
    S11 = 27,
    T3 = 28,
    T4 = 29,
    T5 = 30,
    T6 = 31,
}

impl fmt::Display for RegisterMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", *self as u8)
    }
}

impl RegisterMapping {
    /// Map a 5-bit register field to its register. The value is masked to 5
    /// bits, so every instruction field maps to a valid register.
    #[must_use]
    pub fn from_bits(value: u8) -> Self {
        // this is safe because:
        // 1. the value is masked to the range of the enum
        // 2. the enum is repr(u8), so the memory layout is the same as u8
        // 3. we explicitly define the src and dst generics to ensure that future changes to the enum's memory size are caught at compile time
        unsafe { std::mem::transmute::<u8, Self>(value & (REGISTERS_COUNT - 1)) }
    }
}

/// The architectural register file: 32 32-bit registers, with x0 hardwired
/// to zero. Reads are pure; the write-back stage is the only writer, and a
/// write targeting x0 is discarded.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct RegisterFile {
    registers: [u32; REGISTERS_COUNT as usize],
}

impl Index<RegisterMapping> for RegisterFile {
    type Output = u32;
    fn index(&self, index: RegisterMapping) -> &Self::Output {
        &self.registers[index as usize]
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            registers: [0; REGISTERS_COUNT as usize],
        }
    }

    /// Initialize the register file with the provided defaults, makes everything else 0
    pub fn initialize(&mut self, mappings: &[(RegisterMapping, u32)]) {
        self.registers = [0; REGISTERS_COUNT as usize];
        for (mapping, value) in mappings {
            self.write(*mapping, *value);
        }
    }

    #[must_use]
    pub const fn read(&self, reg: RegisterMapping) -> u32 {
        self.registers[reg as usize]
    }

    /// Write a register. Writes to x0 are discarded, which is what keeps
    /// the register-zero invariant without special cases elsewhere.
    pub fn write(&mut self, reg: RegisterMapping, value: u32) {
        if reg != RegisterMapping::Zero {
            self.registers[reg as usize] = value;
        }
    }
}
