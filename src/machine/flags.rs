use std::cmp::Ordering;

use crate::memory::Byte;

const EQUAL: Byte = 0b001;
const GREATER: Byte = 0b010;
const LESS: Byte = 0b100;

/// Condition flags written by `CMP`. Exactly one bit is set after a
/// comparison; none are set before the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(Byte);

impl Flags {
    /// Replaces all flags with the outcome of comparing `a` to `b`
    pub fn compare(&mut self, a: Byte, b: Byte) {
        self.0 = match a.cmp(&b) {
            Ordering::Equal => EQUAL,
            Ordering::Greater => GREATER,
            Ordering::Less => LESS,
        };
    }

    pub fn equal(&self) -> bool {
        self.0 & EQUAL != 0
    }

    pub fn greater(&self) -> bool {
        self.0 & GREATER != 0
    }

    pub fn less(&self) -> bool {
        self.0 & LESS != 0
    }

    pub fn bits(&self) -> Byte {
        self.0
    }
}
