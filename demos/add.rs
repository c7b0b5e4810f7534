use color_eyre::eyre::Result;

use ls8::machine::Machine;
use ls8::write_instructions;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().init().unwrap(); // logging

    let mut machine = Machine::new();
    let mem = &mut machine.memory;

    use ls8::machine::Instruction::*;
    write_instructions!(mem : 0 =>
        LDI, 0, 8,
        LDI, 1, 9,
        ADD, 0, 1,
        PRN, 0,
        HLT
    );

    machine.run()?;

    Ok(())
}
