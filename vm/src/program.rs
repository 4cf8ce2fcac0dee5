use std::collections::HashMap;

use abysmal_decimal::Decimal;

use crate::opcode::OpCode;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub param: u32,
}

/// An immutable, loaded DSMAL program. Cheaply shareable across many
/// `Machine`s; a `Machine` never mutates its `Program`.
#[derive(Clone, Debug)]
pub struct Program {
    pub(crate) variable_names: Vec<String>,
    pub(crate) variable_slots: HashMap<String, u32>,
    pub(crate) constants: Vec<Decimal>,
    pub(crate) instructions: Vec<Instruction>,
    pub(crate) source: String,
}

impl Program {
    pub fn variable_count(&self) -> usize {
        self.variable_names.len()
    }

    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn constants(&self) -> &[Decimal] {
        &self.constants
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn variable_slot(&self, name: &str) -> Option<u32> {
        self.variable_slots.get(name).copied()
    }

    /// The original DSMAL text this program was loaded from, preserved
    /// verbatim so a `Program` can be round-tripped through serialization.
    pub fn source(&self) -> &str {
        &self.source
    }
}
