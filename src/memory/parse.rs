//! Program files hold one byte per line, written in base 2:
//!
//! ```text
//! # print8.ls8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use std::borrow::Cow;
use std::error;
use std::fs;
use std::io;
use std::path::Path;
use std::{fmt, str::Lines};

use super::{Byte, RAM_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidNumber { radix: u32 },
    /// `size` is the number of bytes in the whole program
    ProgramTooLarge { size: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidNumber { radix } => {
                write!(f, "failed to parse byte with radix `{}`", radix)
            }
            ParseErrorKind::ProgramTooLarge { size } => {
                write!(
                    f,
                    "program of `{}` bytes does not fit into `{}` bytes of memory",
                    size, RAM_SIZE
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    context: Option<Cow<'static, str>>,
    line_nr: usize,
}

impl ParseError {
    fn new<C, S>(kind: ParseErrorKind, context: C, line_nr: usize) -> Self
    where
        C: Into<Option<S>>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            context: context.into().map(|inner| inner.into()),
            line_nr,
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// Line of the program file the error was found on, starting at 1
    pub fn line_nr(&self) -> usize {
        self.line_nr
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "error [ln: {}]: {} - {}",
                self.line_nr, self.kind, context
            )
        } else {
            write!(f, "error [ln: {}]: {}", self.line_nr, self.kind)
        }
    }
}

impl error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Failure to turn a program file into bytes
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be read
    Io(io::Error),
    /// The file was read but its content is malformed
    Parse(Vec<ParseError>),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "failed to read program: {}", err),
            LoadError::Parse(errors) => {
                write!(f, "failed to parse program ({} errors)", errors.len())
            }
        }
    }
}

impl error::Error for LoadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            LoadError::Io(err) => Some(err),
            LoadError::Parse(_) => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::Io(err)
    }
}

/// Reads and parses the program file at `path`
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<Byte>, LoadError> {
    let data = fs::read_to_string(path.as_ref())?;
    log::debug!("Loaded `{}`", path.as_ref().display());

    Parser::new(&data).parse().map_err(LoadError::Parse)
}

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
    program: Vec<Byte>,
    /// Bytes read so far, including those that did not fit
    size: usize,
    /// Line of the first byte that did not fit
    overflow_line: Option<usize>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for `data`.
    pub fn new(data: &'a str) -> Self {
        Self {
            lines: data.lines(),
            line_nr: 0,
            program: Vec::new(),
            size: 0,
            overflow_line: None,
        }
    }

    /// Consumes `self` and tries to parse all of the data into a sequence of
    /// bytes, the first one destined for address 0.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    pub fn parse(mut self) -> Result<Vec<Byte>, Vec<ParseError>> {
        let mut errors = Vec::new();

        while let Some(res) = self.parse_next_line() {
            if let Err(err) = res {
                log::error!("{}", err);
                errors.push(err);
            }
        }

        if let Some(line_nr) = self.overflow_line {
            let err = ParseError::new(
                ParseErrorKind::ProgramTooLarge { size: self.size },
                format!("bytes from line {} on are outside of memory", line_nr),
                line_nr,
            );
            log::error!("{}", err);
            errors.push(err);
        }

        if errors.is_empty() {
            Ok(self.program)
        } else {
            Err(errors)
        }
    }

    /// Tries to parse the next line. Each byte should be located on it's own
    /// line, optionally followed by a comment.
    fn parse_next_line(&mut self) -> Option<Result<()>> {
        let line = self.lines.next()?;
        self.line_nr += 1;

        let line = match line.find('#') {
            Some(index) => &line[..index],
            None => line,
        }
        .trim();

        if line.is_empty() {
            // Comment or empty line; skip
            Some(Ok(()))
        } else {
            Some(self.parse_byte(line))
        }
    }

    /// Tries to parse `line` as a base 2 byte, with or without a `0b` prefix.
    ///
    /// # Examples
    ///
    /// - `10000010`
    /// - `0b1`
    fn parse_byte(&mut self, line: &str) -> Result<()> {
        let digits = line.strip_prefix("0b").unwrap_or(line);

        let byte = Byte::from_str_radix(digits, 2).map_err(|_| {
            ParseError::new(
                ParseErrorKind::InvalidNumber { radix: 2 },
                format!("`{}` is not a binary byte", line),
                self.line_nr,
            )
        })?;

        log::trace!("[{}] Found byte 0b{:08b}", self.line_nr, byte);

        self.write_byte(byte);
        Ok(())
    }

    /// Appends `byte` to the program. Bytes past the end of memory are only
    /// counted, [`Parser::parse`] reports them once at the end.
    fn write_byte(&mut self, byte: Byte) {
        self.size += 1;

        if self.program.len() < RAM_SIZE {
            self.program.push(byte);
        } else if self.overflow_line.is_none() {
            self.overflow_line = Some(self.line_nr);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::machine::Instruction;

    use super::*;
    use color_eyre::Result;

    #[test]
    fn parse_print8() -> Result<()> {
        let data = r#"
            # print8.ls8
            10000010 # LDI R0,8
            00000000
            00001000
            01000111 # PRN R0
            00000000
            00000001 # HLT
        "#;

        let program = Parser::new(data).parse().unwrap();

        assert_eq!(
            program,
            vec![
                Instruction::LDI as Byte,
                0,
                8,
                Instruction::PRN as Byte,
                0,
                Instruction::HLT as Byte,
            ]
        );

        Ok(())
    }

    #[test]
    fn parse_prefixed_and_comment_only_lines() -> Result<()> {
        let data = "# nothing here\n\n   # indented comment\n0b101\n1#trailing";

        let program = Parser::new(data).parse().unwrap();

        assert_eq!(program, vec![5, 1]);

        Ok(())
    }

    #[test]
    fn parse_collects_all_errors() -> Result<()> {
        let data = "00000001\n0000002\nLDI\n100000000";

        let errors = Parser::new(data).parse().unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].line_nr(), 2);
        assert_eq!(errors[1].line_nr(), 3);
        assert_eq!(errors[2].line_nr(), 4);
        assert!(errors
            .iter()
            .all(|err| err.kind() == ParseErrorKind::InvalidNumber { radix: 2 }));

        Ok(())
    }

    #[test]
    fn parse_too_large() -> Result<()> {
        let data = format!("# header\n{}", "0\n".repeat(RAM_SIZE + 2));

        let errors = Parser::new(&data).parse().unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind(),
            ParseErrorKind::ProgramTooLarge { size: RAM_SIZE + 2 }
        );
        assert_eq!(errors[0].line_nr(), RAM_SIZE + 2);

        Ok(())
    }

    #[test]
    fn load_missing_file() -> Result<()> {
        let err = load_program("does/not/exist.ls8").unwrap_err();

        assert!(matches!(err, LoadError::Io(_)));

        Ok(())
    }
}
