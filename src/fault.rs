use thiserror::Error;

/// An architectural fault raised during simulation.
///
/// Faults stop the pipeline at the end of the cycle in which they are
/// detected; the machine state visible afterwards is the state from the
/// start of that cycle.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum Fault {
    /// the PC points outside instruction memory (or is misaligned)
    #[error("fetch fault: pc {pc:#x} is not a valid instruction address")]
    Fetch { pc: u32 },
    /// the fetched word is not a valid RV32I instruction
    #[error("decode fault: word {word:#010x} at pc {pc:#x} is not a valid instruction")]
    Decode { pc: u32, word: u32 },
    /// a load or store touched bytes outside data memory
    #[error("memory fault: address {addr:#x} is out of range")]
    MemoryOutOfRange { addr: u32 },
    /// a load or store address was not aligned to its access width
    #[error("memory fault: address {addr:#x} is not aligned to {width} bytes")]
    MemoryMisaligned { addr: u32, width: u32 },
}
