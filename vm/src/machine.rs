//! `Machine` is the public facade over a loaded [`Program`]: it owns the
//! variable registers for one run and knows how to read and write them by
//! name, using the same canonical decimal text the compiler's constant
//! folder and the DSMAL constant pool use.

use std::collections::HashMap;

use abysmal_decimal::Decimal;

use crate::error::{ExecutionError, InvalidVariableValue};
use crate::executor::Executor;
use crate::program::Program;
use crate::random::{DefaultRandomSource, RandomSource};

/// One independently-resettable instance of a [`Program`]: its own variable
/// values, its own instruction limit, its own random source.
pub struct Machine<'p> {
    program: &'p Program,
    variables: Vec<Decimal>,
    instruction_limit: Option<u64>,
    random_source: Option<Box<dyn RandomSource + 'p>>,
}

impl<'p> Machine<'p> {
    pub(crate) fn new(program: &'p Program) -> Machine<'p> {
        Machine {
            program,
            variables: vec![Decimal::zero(); program.variable_count()],
            instruction_limit: None,
            random_source: Some(Box::new(DefaultRandomSource)),
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// Caps the number of instructions a single `run` may execute before
    /// raising [`ExecutionError::InstructionLimitExceeded`]. `None` (the
    /// default) means unlimited.
    pub fn set_instruction_limit(&mut self, limit: Option<u64>) {
        self.instruction_limit = limit;
    }

    pub fn instruction_limit(&self) -> Option<u64> {
        self.instruction_limit
    }

    /// Installs the source the `Lr` opcode draws from, overriding the
    /// process-wide default every new `Machine` starts with.
    pub fn set_random_source<R>(&mut self, source: R)
    where
        R: RandomSource + 'p,
    {
        self.random_source = Some(Box::new(source));
    }

    /// Restores the process-wide default random source (decimals `k /
    /// 10^9` for uniform `k ∈ [0, 10^9)`), undoing any prior
    /// [`set_random_source`](Self::set_random_source).
    pub fn clear_random_source(&mut self) {
        self.random_source = Some(Box::new(DefaultRandomSource));
    }

    /// Resets every variable to zero, then applies `overrides` by name.
    pub fn reset(&mut self, overrides: &HashMap<String, String>) -> Result<(), InvalidVariableValue> {
        for slot in self.variables.iter_mut() {
            *slot = Decimal::zero();
        }
        for (name, text) in overrides {
            self.set_variable(name, text)?;
        }
        Ok(())
    }

    /// Parses `text` as a decimal and stores it into the named variable.
    /// Unknown names are silently ignored, matching the loader's treatment
    /// of a DSMAL program as the sole authority over which variables exist.
    pub fn set_variable(&mut self, name: &str, text: &str) -> Result<(), InvalidVariableValue> {
        if let Some(slot) = self.program.variable_slot(name) {
            let value = Decimal::parse(text).map_err(|_| InvalidVariableValue(text.to_string()))?;
            self.variables[slot as usize] = value;
        }
        Ok(())
    }

    /// Returns the named variable's current value in canonical decimal
    /// text, or `None` if the program has no such variable.
    pub fn get_variable(&self, name: &str) -> Option<String> {
        let slot = self.program.variable_slot(name)?;
        Some(self.variables[slot as usize].to_string())
    }

    pub fn variable_names(&self) -> &[String] {
        self.program.variable_names()
    }

    /// Runs the program to completion (an `Xx`) and returns the number of
    /// instructions it executed.
    pub fn run(&mut self) -> Result<u64, ExecutionError> {
        let random_source = self.random_source.as_deref_mut();
        let executor = Executor::new(
            self.program,
            &mut self.variables,
            self.instruction_limit,
            random_source,
            None,
        );
        executor.run()
    }

    /// Like [`run`](Self::run), but also returns a per-instruction coverage
    /// vector: `coverage[i]` is `true` iff instruction `i` was executed at
    /// least once.
    pub fn run_with_coverage(&mut self) -> Result<(u64, Vec<bool>), ExecutionError> {
        let mut coverage = vec![false; self.program.instruction_count()];
        let random_source = self.random_source.as_deref_mut();
        let executor = Executor::new(
            self.program,
            &mut self.variables,
            self.instruction_limit,
            random_source,
            Some(&mut coverage),
        );
        let executed = executor.run()?;
        Ok((executed, coverage))
    }
}
