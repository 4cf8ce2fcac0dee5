use crate::error::{ExecutionError, InvalidProgramError};
use crate::opcode::OpCode;
use crate::test::{final_variables, load_error, run_error};

mod ad;
mod comparisons;
mod dv;
mod jn_jz;
mod lv_st;
mod pw;
mod random;
mod stack_ops;
mod unary_math;
