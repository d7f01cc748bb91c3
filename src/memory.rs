//! The two memory collaborators. Instruction and data memory are fully
//! separate (Harvard organization): the fetch stage can never collide with
//! a load or store, so no structural hazard exists between them.

use crate::fault::Fault;
use crate::signals::MemWidth;

/// Default data-memory size in bytes.
pub const DMEM_BYTES: usize = 4096;

/// Read-only instruction memory, addressed by the PC.
///
/// The program image is a sequence of 32-bit instruction words starting at
/// address 0.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct InstructionMemory {
    rom: Vec<u32>,
}

impl InstructionMemory {
    #[must_use]
    pub fn new(rom: Vec<u32>) -> Self {
        Self { rom }
    }

    /// The instruction word at `pc`. A misaligned or out-of-range PC is a
    /// fetch fault.
    pub fn fetch(&self, pc: u32) -> Result<u32, Fault> {
        if pc % 4 != 0 {
            return Err(Fault::Fetch { pc });
        }
        self.rom
            .get(pc as usize / 4)
            .copied()
            .ok_or(Fault::Fetch { pc })
    }

    /// One past the last valid instruction address: the PC value at which
    /// the program has run off the end.
    #[must_use]
    pub fn end_address(&self) -> u32 {
        (self.rom.len() * 4) as u32
    }
}

/// Byte-addressable data memory with aligned 1/2/4-byte accesses,
/// little-endian like the rest of the architecture.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DataMemory {
    bytes: Vec<u8>,
}

impl Default for DataMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl DataMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(DMEM_BYTES)
    }

    #[must_use]
    pub fn with_size(bytes: usize) -> Self {
        Self {
            bytes: vec![0; bytes],
        }
    }

    /// Initialize memory word-by-word, for seeding a test image.
    /// Addresses must be word-aligned and in range.
    pub fn initialize(&mut self, words: &[(u32, u32)]) -> Result<(), Fault> {
        for &(addr, value) in words {
            self.store(addr, MemWidth::Word, value)?;
        }
        Ok(())
    }

    fn range_for(&self, addr: u32, width: MemWidth) -> Result<std::ops::Range<usize>, Fault> {
        if addr % width.bytes() != 0 {
            return Err(Fault::MemoryMisaligned {
                addr,
                width: width.bytes(),
            });
        }
        let start = addr as usize;
        let end = start + width.bytes() as usize;
        if end > self.bytes.len() {
            return Err(Fault::MemoryOutOfRange { addr });
        }
        Ok(start..end)
    }

    /// Load `width` bytes at `addr`, sign- or zero-extending to 32 bits.
    pub fn load(&self, addr: u32, width: MemWidth, signed: bool) -> Result<u32, Fault> {
        let range = self.range_for(addr, width)?;
        let bytes = &self.bytes[range];
        Ok(match (width, signed) {
            (MemWidth::Byte, true) => bytes[0] as i8 as i32 as u32,
            (MemWidth::Byte, false) => u32::from(bytes[0]),
            (MemWidth::Half, true) => {
                i16::from_le_bytes([bytes[0], bytes[1]]) as i32 as u32
            }
            (MemWidth::Half, false) => u32::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            (MemWidth::Word, _) => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        })
    }

    /// Store the low `width` bytes of `value` at `addr`.
    pub fn store(&mut self, addr: u32, width: MemWidth, value: u32) -> Result<(), Fault> {
        let range = self.range_for(addr, width)?;
        let le = value.to_le_bytes();
        self.bytes[range].copy_from_slice(&le[..width.bytes() as usize]);
        Ok(())
    }
}
