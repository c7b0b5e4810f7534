use std::path::Path;
use std::str::FromStr;

pub mod parse;

use parse::{LoadError, ParseError, Parser};

pub type Byte = u8; // 1 byte
pub type Address = u8; // memory is addressed by a single byte

/// Number of addressable cells
pub const RAM_SIZE: usize = Address::MAX as usize + 1;

/// Emulates memory for use with the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory {
    /// The actual data of the memory
    pub data: [Byte; RAM_SIZE],
}

impl Default for Memory {
    /// Initializes the memory
    fn default() -> Self {
        Memory {
            data: [0; RAM_SIZE],
        }
    }
}

impl Memory {
    /// Reads a byte from the memory
    pub fn read_byte(&self, position: Address) -> Byte {
        self.data[position as usize]
    }

    /// Writes a byte to the memory
    pub fn write_byte(&mut self, position: Address, value: Byte) {
        self.data[position as usize] = value;
    }

    /// Writes an array of bytes to the memory, wrapping around past the last address
    pub fn write_array(&mut self, position: Address, data: &[Byte]) {
        for (offset, byte) in data.iter().enumerate() {
            self.write_byte(position.wrapping_add(offset as Address), *byte);
        }
    }

    /// Reads and parses a program file into a fresh memory
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let program = parse::load_program(path)?;

        let mut memory = Memory::default();
        memory.write_array(0, &program);
        Ok(memory)
    }

    /// Logs the memory in rows of 16 bytes, skipping rows that are all zero
    pub fn dump(&self) {
        for (row, chunk) in self.data.chunks(16).enumerate() {
            if chunk.iter().all(|byte| *byte == 0) {
                continue;
            }

            let bytes = chunk
                .iter()
                .map(|byte| format!("{:02X}", byte))
                .collect::<Vec<_>>()
                .join(" ");
            log::info!("{:02X}: {}", row * 16, bytes);
        }
    }
}

impl FromStr for Memory {
    type Err = Vec<ParseError>;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let program = Parser::new(data).parse()?;

        let mut memory = Memory::default();
        memory.write_array(0, &program);
        Ok(memory)
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $byte:expr ),+ $(,)? ) => {
        $mem.write_array($pos, &[
            $(
                $byte as $crate::memory::Byte,
            )+
        ]);
    };
}

#[cfg(test)]
mod tests {
    use crate::machine::Instruction;

    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_read_byte() -> Result<()> {
        let mut mem = Memory::default();
        mem.data[0x2] = 0x12;
        assert_eq!(mem.read_byte(0x2), 0x12);

        Ok(())
    }

    #[test]
    fn test_write_byte() -> Result<()> {
        let mut mem = Memory::default();
        mem.write_byte(0x44, 12);
        assert_eq!(mem.data[0x44], 12);

        Ok(())
    }

    #[test]
    fn test_write_array() -> Result<()> {
        let mut mem = Memory::default();
        mem.write_array(0x44, &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(mem.data[0x44], 0x12);
        assert_eq!(mem.data[0x45], 0x34);
        assert_eq!(mem.data[0x46], 0x56);
        assert_eq!(mem.data[0x47], 0x78);

        Ok(())
    }

    #[test]
    fn test_write_array_wraps() -> Result<()> {
        let mut mem = Memory::default();
        mem.write_array(0xFE, &[1, 2, 3]);
        assert_eq!(mem.data[0xFE], 1);
        assert_eq!(mem.data[0xFF], 2);
        assert_eq!(mem.data[0x00], 3);

        Ok(())
    }

    #[test]
    fn test_write_instructions() -> Result<()> {
        let mut mem = Memory::default();

        mem.write_array(
            0,
            &[
                Instruction::LDI as Byte,
                0,
                42,
                Instruction::PRN as Byte,
                0,
                Instruction::HLT as Byte,
            ],
        );

        let mut mem2 = Memory::default();
        use crate::machine::Instruction::*;
        write_instructions!(mem2 : 0 => LDI, 0, 42, PRN, 0, HLT);

        assert_eq!(mem, mem2);

        Ok(())
    }

    #[test]
    fn test_from_str() -> Result<()> {
        let mem = Memory::from_str("10000010\n00000001\n00000010 # R1 = 2\n00000001").unwrap();

        assert_eq!(mem.read_byte(0), Instruction::LDI as Byte);
        assert_eq!(mem.read_byte(1), 1);
        assert_eq!(mem.read_byte(2), 2);
        assert_eq!(mem.read_byte(3), Instruction::HLT as Byte);
        assert_eq!(mem.read_byte(4), 0);

        Ok(())
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let mem = Memory::from_file("demos/programs/print8.ls8").unwrap();
        mem.dump();

        assert_eq!(mem.read_byte(0), Instruction::LDI as Byte);
        assert_eq!(mem.read_byte(1), 0);
        assert_eq!(mem.read_byte(2), 8);
        assert_eq!(mem.read_byte(3), Instruction::PRN as Byte);
        assert_eq!(mem.read_byte(4), 0);
        assert_eq!(mem.read_byte(5), Instruction::HLT as Byte);
        assert!(mem.data[6..].iter().all(|byte| *byte == 0));

        Ok(())
    }

    #[test]
    fn test_from_file_missing() -> Result<()> {
        let err = Memory::from_file("demos/programs/missing.ls8").unwrap_err();

        assert!(matches!(err, LoadError::Io(_)));

        Ok(())
    }
}
