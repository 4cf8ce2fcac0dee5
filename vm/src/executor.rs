//! The stack-machine dispatch loop shared by `Machine::run` and
//! `Machine::run_with_coverage`.

use abysmal_decimal::{Decimal, DecimalError};

use crate::error::ExecutionError;
use crate::opcode::OpCode;
use crate::program::{Instruction, Program};
use crate::random::RandomSource;

const MAX_STACK_DEPTH: usize = 2048;
const MAX_HEAP_VALUES: usize = 100_000;

pub struct Executor<'p> {
    program: &'p Program,
    variables: &'p mut [Decimal],
    stack: Vec<Decimal>,
    heap_used: usize,
    pointer: usize,
    executed: u64,
    instruction_limit: Option<u64>,
    random_source: Option<&'p mut dyn RandomSource>,
    coverage: Option<&'p mut [bool]>,
}

impl<'p> Executor<'p> {
    pub fn new(
        program: &'p Program,
        variables: &'p mut [Decimal],
        instruction_limit: Option<u64>,
        random_source: Option<&'p mut dyn RandomSource>,
        coverage: Option<&'p mut [bool]>,
    ) -> Executor<'p> {
        Executor {
            program,
            variables,
            stack: Vec::new(),
            heap_used: 0,
            pointer: 0,
            executed: 0,
            instruction_limit,
            random_source,
            coverage,
        }
    }

    pub fn run(mut self) -> Result<u64, ExecutionError> {
        let instructions = self.program.instructions();
        loop {
            if self.pointer >= instructions.len() {
                return Err(ExecutionError::OutOfBounds(self.pointer));
            }
            if let Some(limit) = self.instruction_limit {
                if self.executed >= limit {
                    return Err(ExecutionError::InstructionLimitExceeded(limit));
                }
            }

            let instruction = instructions[self.pointer];
            if let Some(coverage) = self.coverage.as_deref_mut() {
                coverage[self.pointer] = true;
            }
            self.executed += 1;

            if let Some(next) = self.dispatch(instruction)? {
                self.pointer = next;
            } else {
                return Ok(self.executed);
            }
        }
    }

    /// Returns the next instruction pointer, or `None` on `Xx`.
    fn dispatch(&mut self, instruction: Instruction) -> Result<Option<usize>, ExecutionError> {
        let here = self.pointer;
        let opcode = instruction.opcode;
        let param = instruction.param as usize;

        match opcode {
            OpCode::Xx => return Ok(None),
            OpCode::Ju => return Ok(Some(param)),
            OpCode::Jn => {
                let t = self.pop(opcode, 1)?;
                return Ok(Some(if t.is_truthy() { param } else { here + 1 }));
            }
            OpCode::Jz => {
                let t = self.pop(opcode, 1)?;
                return Ok(Some(if !t.is_truthy() { param } else { here + 1 }));
            }
            OpCode::Lc => self.push(self.program.constants()[param].clone())?,
            OpCode::Lv => self.push(self.variables[param].clone())?,
            OpCode::Lr => {
                let value = self.pull_random()?;
                self.push_new(value)?;
            }
            OpCode::Lz => self.push(Decimal::zero())?,
            OpCode::Lo => self.push(Decimal::one())?,
            OpCode::St => {
                let t = self.pop(opcode, 1)?;
                self.variables[param] = t;
            }
            OpCode::Cp => {
                let t = self.peek(opcode)?;
                self.push(t)?;
            }
            OpCode::Pp => {
                self.pop(opcode, 1)?;
            }
            OpCode::Nt => {
                let t = self.pop(opcode, 1)?;
                self.push(if t.is_truthy() {
                    Decimal::zero()
                } else {
                    Decimal::one()
                })?;
            }
            OpCode::Ng => {
                let t = self.pop(opcode, 1)?;
                let result = self.arith(opcode, t.neg())?;
                self.push_new(result)?;
            }
            OpCode::Ab => {
                let t = self.pop(opcode, 1)?;
                let result = self.arith(opcode, t.abs())?;
                self.push_new(result)?;
            }
            OpCode::Cl => {
                let t = self.pop(opcode, 1)?;
                let result = self.arith(opcode, t.ceil())?;
                self.push_new(result)?;
            }
            OpCode::Fl => {
                let t = self.pop(opcode, 1)?;
                let result = self.arith(opcode, t.floor())?;
                self.push_new(result)?;
            }
            OpCode::Rd => {
                let t = self.pop(opcode, 1)?;
                let result = self.arith(opcode, t.round_to_integer())?;
                self.push_new(result)?;
            }
            OpCode::Eq | OpCode::Ne | OpCode::Gt | OpCode::Ge => {
                let (a, b) = self.pop2(opcode)?;
                let truth = match opcode {
                    OpCode::Eq => a == b,
                    OpCode::Ne => a != b,
                    OpCode::Gt => a > b,
                    OpCode::Ge => a >= b,
                    _ => unreachable!(),
                };
                self.push(if truth { Decimal::one() } else { Decimal::zero() })?;
            }
            OpCode::Ad | OpCode::Sb | OpCode::Ml | OpCode::Dv | OpCode::Pw => {
                let (a, b) = self.pop2(opcode)?;
                let result = match opcode {
                    OpCode::Ad => a.add(&b),
                    OpCode::Sb => a.sub(&b),
                    OpCode::Ml => a.mul(&b),
                    OpCode::Dv => a.div(&b),
                    OpCode::Pw => a.pow(&b),
                    _ => unreachable!(),
                };
                let result = self.arith(opcode, result)?;
                self.push_new(result)?;
            }
            OpCode::Mn | OpCode::Mx => {
                let (a, b) = self.pop2(opcode)?;
                let result = if opcode == OpCode::Mn { a.min(&b) } else { a.max(&b) };
                self.push(result)?;
            }
        }

        Ok(Some(here + 1))
    }

    fn arith(
        &self,
        opcode: OpCode,
        result: Result<Decimal, DecimalError>,
    ) -> Result<Decimal, ExecutionError> {
        result.map_err(|err| match err {
            DecimalError::DivisionByZero | DecimalError::IllegalPower => ExecutionError::Illegal {
                opcode,
                instruction: self.pointer,
            },
            DecimalError::TooLarge => ExecutionError::ResultTooLarge {
                opcode,
                instruction: self.pointer,
            },
            DecimalError::TooSmall => ExecutionError::ResultTooSmall {
                opcode,
                instruction: self.pointer,
            },
            DecimalError::Parse(_) => unreachable!("arithmetic never re-parses"),
        })
    }

    fn pull_random(&mut self) -> Result<Decimal, ExecutionError> {
        let source = self
            .random_source
            .as_deref_mut()
            .ok_or(ExecutionError::RandomIteratorExhausted)?;
        let text = source
            .next_value()
            .ok_or(ExecutionError::RandomIteratorExhausted)?;
        Decimal::parse(&text).map_err(|_| ExecutionError::InvalidRandomValue(text))
    }

    fn pop(&mut self, opcode: OpCode, required: usize) -> Result<Decimal, ExecutionError> {
        self.stack.pop().ok_or(ExecutionError::InsufficientOperands {
            opcode,
            required,
            available: 0,
        })
    }

    fn pop2(&mut self, opcode: OpCode) -> Result<(Decimal, Decimal), ExecutionError> {
        if self.stack.len() < 2 {
            return Err(ExecutionError::InsufficientOperands {
                opcode,
                required: 2,
                available: self.stack.len(),
            });
        }
        let b = self.stack.pop().unwrap();
        let a = self.stack.pop().unwrap();
        Ok((a, b))
    }

    fn peek(&mut self, opcode: OpCode) -> Result<Decimal, ExecutionError> {
        self.stack
            .last()
            .cloned()
            .ok_or(ExecutionError::InsufficientOperands {
                opcode,
                required: 1,
                available: 0,
            })
    }

    fn push(&mut self, value: Decimal) -> Result<(), ExecutionError> {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(ExecutionError::OutOfStack);
        }
        self.stack.push(value);
        Ok(())
    }

    /// Like [`push`](Self::push), but additionally charges the bounded
    /// heap budget — used for results that are genuinely new decimal
    /// values rather than ones already owned by a constant, variable, or
    /// singleton zero/one slot.
    fn push_new(&mut self, value: Decimal) -> Result<(), ExecutionError> {
        if self.heap_used >= MAX_HEAP_VALUES {
            return Err(ExecutionError::OutOfSpace);
        }
        self.heap_used += 1;
        self.push(value)
    }
}
