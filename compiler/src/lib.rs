//! Front end and optimizing code generator for Abysmal programs: turns
//! source text into a loaded [`abysmal_vm::Program`] plus a parallel
//! source map.
//!
//! The pipeline is [`lexer::tokenize`] -> [`parser::parse`] ->
//! [`semantic::validate`] -> [`optimizer::optimize`] ->
//! [`codegen::compile_ast`] -> [`abysmal_vm::Program::load`], wired
//! together by [`compile`].

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod semantic;
pub mod source_map;

#[cfg(test)]
mod test;

use std::collections::{HashMap, HashSet};

use abysmal_decimal::Decimal;
use abysmal_vm::Program;

pub use error::{CompilationError, CompilationErrorKind};
pub use lexer::canonicalize_number_literal;
pub use parser::Scope;
pub use source_map::{SourceLine, SourceMap};

/// Compiles `source` against the given external variable names and named
/// constants, producing a loaded, executable [`Program`] plus its source
/// map.
///
/// `variable_names` is the set of variables the host environment supplies
/// at run time (read and written through `Machine::get_variable` /
/// `Machine::set_variable`); `constants` are baked into the constant pool
/// at compile time and can never be assigned to. The two namespaces, plus
/// the program's own `let`-declared variables, must be pairwise disjoint
/// or compilation fails with `CompilationErrorKind::VariableConstantCollision`.
pub fn compile(
    source: &str,
    variable_names: &HashSet<String>,
    constants: &HashMap<String, Decimal>,
) -> Result<(Program, SourceMap), CompilationError> {
    if let Some(shared_name) = variable_names.iter().find(|name| constants.contains_key(*name)) {
        return Err(CompilationError::new(CompilationErrorKind::VariableConstantCollision(
            shared_name.clone(),
        )));
    }

    let tokens = lexer::tokenize(source)?;
    let scope = Scope {
        external_vars: variable_names,
        constants,
    };
    let ast = parser::parse(&tokens, &scope)?;
    semantic::validate(&ast)?;
    let optimized = optimizer::optimize(ast);
    let (dsmal, source_map) = codegen::compile_ast(&optimized, variable_names);

    let program =
        Program::load(&dsmal).expect("code generator must always emit a loadable program");

    Ok((program, source_map))
}
