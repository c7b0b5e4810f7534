use color_eyre::eyre::Result;

use ls8::machine::{Machine, STACK_TOP};
use ls8::memory::Byte;
use ls8::write_instructions;
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Address of the subroutine doubling R0
const DOUBLE: Byte = 0x10;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .init()
        .unwrap(); // logging

    let mut machine = Machine::new().with_stack_pointer(STACK_TOP);
    let mem = &mut machine.memory;

    use ls8::machine::Instruction::*;
    write_instructions!(mem : 0 =>
        LDI, 1, DOUBLE,
        LDI, 0, 21,
        CALL, 1,
        PRN, 0,
        HLT
    );
    write_instructions!(mem : DOUBLE =>
        ADD, 0, 0,
        RET
    );

    machine.run()?;

    Ok(())
}
