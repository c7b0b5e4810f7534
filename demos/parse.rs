use color_eyre::eyre::{eyre, Result};

use ls8::machine::Machine;
use ls8::memory::Memory;
use simple_logger::SimpleLogger;

const PROGRAM: &str = "demos/programs/mult.ls8";

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().init().unwrap(); // logging

    let mem = Memory::from_file(PROGRAM).map_err(|err| eyre!("{}: {}", PROGRAM, err))?;
    mem.dump();

    let mut machine = Machine::new();
    machine.memory = mem;
    machine.run()?;

    Ok(())
}
