use std::env;
use std::fs;

use anyhow::{ensure, Context, Result};

use rv32i_pipeline::cpu::CPU;
use rv32i_pipeline::utils::{bit_vec_from_string, bit_vec_to_int};

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .context("usage: rv32i-pipeline <program file>")?;
    let text =
        fs::read_to_string(&path).with_context(|| format!("failed to read program file {path}"))?;

    let mut program = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let bits = bit_vec_from_string(line)
            .with_context(|| format!("bad instruction on line {}", i + 1))?;
        if bits.is_empty() {
            continue;
        }
        ensure!(
            bits.len() == 32,
            "instruction on line {} is {} bits long, expected 32",
            i + 1,
            bits.len()
        );
        program.push(bit_vec_to_int(&bits));
    }

    let mut cpu = CPU::new(program);
    cpu.run()?;

    println!("program terminated:");
    println!(
        "total execution time is {} cycles",
        cpu.get_total_clock_cycles()
    );
    Ok(())
}
