use std::convert::TryFrom;
use std::error;
use std::fmt;
use std::io::{self, Write};

use crate::memory::{Address, Byte, Memory, RAM_SIZE};
use color_eyre::eyre::{Result, WrapErr};
use log::*;

mod flags;
mod instruction;

pub use flags::Flags;
pub use instruction::Instruction;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;
/// Register holding the stack pointer
pub const SP: usize = 7;
/// Stack pointer after construction. The first push wraps around to `0xFF`.
pub const INITIAL_SP: Byte = 0x00;
/// Conventional top of the stack, leaving the upper memory free
pub const STACK_TOP: Byte = 0xF4;

/// Fatal conditions raised while the machine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineError {
    /// The byte at the program counter is not an opcode
    IllegalInstruction { opcode: Byte, pc: Address },
    /// An operand names a register that does not exist
    InvalidRegister { register: Byte, pc: Address },
    /// The program does not fit into memory
    ProgramTooLarge { size: usize },
    /// The machine was stepped after it stopped
    Halted,
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineError::IllegalInstruction { opcode, pc } => {
                write!(f, "illegal instruction `0x{:02X}` at `0x{:02X}`", opcode, pc)
            }
            MachineError::InvalidRegister { register, pc } => write!(
                f,
                "register `{}` does not exist (instruction at `0x{:02X}`)",
                register, pc
            ),
            MachineError::ProgramTooLarge { size } => write!(
                f,
                "program of `{}` bytes does not fit into `{}` bytes of memory",
                size, RAM_SIZE
            ),
            MachineError::Halted => f.write_str("machine is halted"),
        }
    }
}

impl error::Error for MachineError {}

/// Emulates the machine: memory, registers and the fetch-execute loop
#[derive(Debug, Clone)]
pub struct Machine<W = io::Stdout> {
    pub memory: Memory,
    /// General purpose registers, `R7` is the stack pointer
    pub reg: [Byte; REGISTER_COUNT],
    /// Program counter
    pub pc: Address,
    pub flags: Flags,
    /// Cleared by `HLT` or by a fatal error
    pub running: bool,
    /// Receives the output of `PRN`
    output: W,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Initializes a new machine printing to stdout
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<W: Write> Machine<W> {
    /// Initializes a new machine printing to `output`
    pub fn with_output(output: W) -> Self {
        let mut reg = [0; REGISTER_COUNT];
        reg[SP] = INITIAL_SP;

        Self {
            memory: Memory::default(),
            reg,
            pc: 0,
            flags: Flags::default(),
            running: true,
            output,
        }
    }

    /// Replaces the initial stack pointer, e.g. with [`STACK_TOP`]
    pub fn with_stack_pointer(mut self, sp: Byte) -> Self {
        self.reg[SP] = sp;
        self
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn read(&self, address: Address) -> Byte {
        self.memory.read_byte(address)
    }

    pub fn write(&mut self, address: Address, value: Byte) {
        self.memory.write_byte(address, value);
    }

    /// Copies `program` into memory starting at address 0. Registers, program
    /// counter and flags are left as they are.
    pub fn load(&mut self, program: &[Byte]) -> Result<()> {
        if program.len() > RAM_SIZE {
            return Err(MachineError::ProgramTooLarge {
                size: program.len(),
            }
            .into());
        }

        self.memory.write_array(0, program);
        debug!("Loaded {} bytes", program.len());

        Ok(())
    }

    /// Formats the program counter, the fetched bytes and all registers
    pub fn trace(&self) -> String {
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            self.read(self.pc),
            self.read(self.pc.wrapping_add(1)),
            self.read(self.pc.wrapping_add(2)),
        );
        for value in self.reg.iter() {
            line.push_str(&format!(" {:02X}", value));
        }
        line
    }

    fn register(&self, operand: Byte) -> Result<usize, MachineError> {
        let index = operand as usize;
        if index < REGISTER_COUNT {
            Ok(index)
        } else {
            Err(MachineError::InvalidRegister {
                register: operand,
                pc: self.pc,
            })
        }
    }

    fn decrement_sp(&mut self) -> Address {
        self.reg[SP] = self.reg[SP].wrapping_sub(1);
        self.reg[SP]
    }

    fn increment_sp(&mut self) {
        self.reg[SP] = self.reg[SP].wrapping_add(1);
    }

    /// Executes a single instruction with the two bytes following its opcode
    pub fn execute_instruction(
        &mut self,
        instruction: Instruction,
        a: Byte,
        b: Byte,
    ) -> Result<()> {
        let pc = self.pc;

        // Some(address) when the instruction assigns the program counter
        let target = match instruction {
            Instruction::LDI => {
                let r = self.register(a)?;
                self.reg[r] = b;

                debug!("LDI R{} {}", r, b);
                None
            }
            Instruction::PRN => {
                let r = self.register(a)?;
                let value = self.reg[r];
                writeln!(self.output, "{}", value).wrap_err("Failed to write output")?;

                debug!("PRN R{}: {}", r, value);
                None
            }
            Instruction::HLT => {
                self.running = false;

                debug!("HLT");
                None
            }
            Instruction::MUL => {
                let (ra, rb) = (self.register(a)?, self.register(b)?);
                let result = self.reg[ra].wrapping_mul(self.reg[rb]);
                self.reg[ra] = result;

                debug!("MUL R{} R{}: {}", ra, rb, result);
                None
            }
            Instruction::ADD => {
                let (ra, rb) = (self.register(a)?, self.register(b)?);
                let result = self.reg[ra].wrapping_add(self.reg[rb]);
                self.reg[ra] = result;

                debug!("ADD R{} R{}: {}", ra, rb, result);
                None
            }
            Instruction::PUSH => {
                let r = self.register(a)?;
                // the source is read after the decrement, so `PUSH R7` pushes the new sp
                let sp = self.decrement_sp();
                let value = self.reg[r];
                self.memory.write_byte(sp, value);

                debug!("PUSH R{}: {} -> 0x{:02X}", r, value, sp);
                None
            }
            Instruction::POP => {
                let r = self.register(a)?;
                let sp = self.reg[SP];
                let value = self.memory.read_byte(sp);
                self.reg[r] = value;
                self.increment_sp();

                debug!("POP R{}: {} <- 0x{:02X}", r, value, sp);
                None
            }
            Instruction::CALL => {
                let r = self.register(a)?;
                let return_address = pc.wrapping_add(2);
                let sp = self.decrement_sp();
                self.memory.write_byte(sp, return_address);
                let address = self.reg[r];

                debug!(
                    "CALL R{}: 0x{:02X}, returning to 0x{:02X}",
                    r, address, return_address
                );
                Some(address)
            }
            Instruction::RET => {
                let address = self.memory.read_byte(self.reg[SP]);
                self.increment_sp();

                debug!("RET 0x{:02X}", address);
                Some(address)
            }
            Instruction::CMP => {
                let (ra, rb) = (self.register(a)?, self.register(b)?);
                self.flags.compare(self.reg[ra], self.reg[rb]);

                debug!("CMP R{} R{}: 0b{:03b}", ra, rb, self.flags.bits());
                None
            }
            Instruction::JMP => {
                let address = self.reg[self.register(a)?];

                debug!("JMP 0x{:02X}", address);
                Some(address)
            }
            Instruction::JEQ => {
                let taken = self.flags.equal();
                let target = if taken {
                    Some(self.reg[self.register(a)?])
                } else {
                    None
                };

                debug!("JEQ R{}: {}", a, if taken { "taken" } else { "not taken" });
                target
            }
            Instruction::JNE => {
                let taken = !self.flags.equal();
                let target = if taken {
                    Some(self.reg[self.register(a)?])
                } else {
                    None
                };

                debug!("JNE R{}: {}", a, if taken { "taken" } else { "not taken" });
                target
            }
        };

        debug_assert!(target.is_none() || instruction.sets_pc());
        self.pc = target.unwrap_or_else(|| pc.wrapping_add(instruction.width()));

        Ok(())
    }

    /// Runs one fetch-execute step. Any error stops the machine for good.
    pub fn step(&mut self) -> Result<()> {
        if !self.running {
            return Err(MachineError::Halted.into());
        }

        trace!("{}", self.trace());

        // always fetch three bytes, the opcode decides how many are used
        let opcode = self.read(self.pc);
        let a = self.read(self.pc.wrapping_add(1));
        let b = self.read(self.pc.wrapping_add(2));

        let result = match Instruction::try_from(opcode) {
            Ok(instruction) => self.execute_instruction(instruction, a, b),
            Err(_) => Err(MachineError::IllegalInstruction {
                opcode,
                pc: self.pc,
            }
            .into()),
        };

        if let Err(err) = &result {
            self.running = false;
            error!("{}", err);
        }

        result
    }

    /// Run program until it halts
    pub fn run(&mut self) -> Result<()> {
        while self.running {
            self.step()?;
        }

        info!("Program halted at 0x{:02X}", self.pc);

        Ok(())
    }
}
