use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

/// Opcode bits holding the number of operands
const OPERAND_MASK: u8 = 0b1100_0000;
/// Opcode bit set for instructions that may assign the program counter
const SETS_PC_BIT: u8 = 0b0001_0000;

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal , )+ ) => {
        /// Defines the instructions
        /// Each opcode encodes its operand count in the upper two bits
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

instructions! {
    /// Stop the execution of the program
    HLT = 0b0000_0001,
    /// Return from a subroutine to the address on top of the stack
    RET = 0b0001_0001,
    /// Print the decimal value of a register
    /// @param register The register to print
    PRN = 0b0100_0111,
    /// Push a register onto the stack
    /// @param register The register to push
    PUSH = 0b0100_0101,
    /// Pop the top of the stack into a register
    /// @param register The register to pop into
    POP = 0b0100_0110,
    /// Push the return address and jump to the address held by a register
    /// @param register The register holding the subroutine address
    CALL = 0b0101_0000,
    /// Jump to the address held by a register
    /// @param register The register holding the address
    JMP = 0b0101_0100,
    /// Jump if the last comparison was equal
    /// @param register The register holding the address
    JEQ = 0b0101_0101,
    /// Jump if the last comparison was not equal
    /// @param register The register holding the address
    JNE = 0b0101_0110,
    /// Set a register to a constant
    /// @param register The register to set
    /// @param value The value to load
    LDI = 0b1000_0010,
    /// Add the second register to the first
    /// @param a The register receiving the sum
    /// @param b The register to add
    ADD = 0b1010_0000,
    /// Multiply the first register by the second
    /// @param a The register receiving the product
    /// @param b The register to multiply by
    MUL = 0b1010_0010,
    /// Compare two registers and set the flags
    /// @param a The left hand side
    /// @param b The right hand side
    CMP = 0b1010_0111,
}

impl Instruction {
    /// Number of operand bytes following the opcode
    pub fn operands(self) -> u8 {
        (u8::from(self) & OPERAND_MASK) >> 6
    }

    /// Number of bytes the program counter advances by when the instruction
    /// does not assign it
    pub fn width(self) -> u8 {
        self.operands() + 1
    }

    pub fn sets_pc(self) -> bool {
        u8::from(self) & SETS_PC_BIT != 0
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_widths() -> Result<()> {
        use Instruction::*;

        for instruction in [HLT, RET].iter() {
            assert_eq!(instruction.width(), 1, "{}", instruction);
        }
        for instruction in [PRN, PUSH, POP, CALL, JMP, JEQ, JNE].iter() {
            assert_eq!(instruction.width(), 2, "{}", instruction);
        }
        for instruction in [LDI, ADD, MUL, CMP].iter() {
            assert_eq!(instruction.width(), 3, "{}", instruction);
        }

        Ok(())
    }

    #[test]
    fn test_sets_pc_bit() -> Result<()> {
        let sets_pc = [
            Instruction::RET,
            Instruction::CALL,
            Instruction::JMP,
            Instruction::JEQ,
            Instruction::JNE,
        ];

        for instruction in Instruction::ALL {
            assert_eq!(instruction.sets_pc(), sets_pc.contains(instruction));
        }

        Ok(())
    }

    #[test]
    fn test_decode() -> Result<()> {
        for instruction in Instruction::ALL {
            assert_eq!(Instruction::try_from(u8::from(*instruction))?, *instruction);
        }

        // SUB and DIV are not implemented
        assert!(Instruction::try_from(0b1010_0001u8).is_err());
        assert!(Instruction::try_from(0b1010_0011u8).is_err());
        assert!(Instruction::try_from(0u8).is_err());

        Ok(())
    }
}
